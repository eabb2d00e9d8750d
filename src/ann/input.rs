//! Coercion of caller-supplied vectors into index input.
//!
//! Callers hand over whatever array type their pipeline produced: `ndarray`
//! views or owned arrays, dynamic-rank arrays coming out of a model runtime, or
//! plain row lists (`Vec<Vec<f32>>`). [`AsEmbeddings`] normalizes these into
//! [`Embeddings`], borrowing whenever the source is already an array.
//!
//! Anything that is not a single vector or a rectangular matrix is rejected
//! with [`Error::InvalidInput`].

use ndarray::{
    Array2, ArrayBase, ArrayView1, Axis, CowArray, Data, Ix1, Ix2, IxDyn,
};

use crate::{Error, Result};

/// A single vector or a batch of row vectors.
#[derive(Debug, Clone)]
pub enum Embeddings<'a> {
    /// One vector of length `dim`.
    Vector(CowArray<'a, f32, Ix1>),
    /// `(rows, dim)` matrix.
    Matrix(CowArray<'a, f32, Ix2>),
}

impl<'a> Embeddings<'a> {
    /// Short description used in error messages.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Vector(v) => format!("1-D vector of length {}", v.len()),
            Self::Matrix(m) => format!("2-D matrix of shape {:?}", m.shape()),
        }
    }

    /// Width of each vector.
    #[must_use]
    pub fn dim(&self) -> usize {
        match self {
            Self::Vector(v) => v.len(),
            Self::Matrix(m) => m.ncols(),
        }
    }

    /// View as a matrix, reshaping a single vector to `(1, dim)`.
    #[must_use]
    pub fn into_rows(self) -> CowArray<'a, f32, Ix2> {
        match self {
            Self::Vector(v) => v.insert_axis(Axis(0)),
            Self::Matrix(m) => m,
        }
    }

    /// Require a matrix.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInput`] for a single vector.
    pub fn into_matrix(self) -> Result<CowArray<'a, f32, Ix2>> {
        match self {
            Self::Matrix(m) => Ok(m),
            vector @ Self::Vector(_) => Err(Error::InvalidInput {
                expected: "2-D embedding matrix",
                found: vector.describe(),
            }),
        }
    }
}

/// Types that can be read as [`Embeddings`].
pub trait AsEmbeddings {
    /// Borrow (or, for row lists, collect) as embeddings.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInput`] if the value is not a vector or a rectangular matrix.
    fn as_embeddings(&self) -> Result<Embeddings<'_>>;
}

impl<S: Data<Elem = f32>> AsEmbeddings for ArrayBase<S, Ix1> {
    fn as_embeddings(&self) -> Result<Embeddings<'_>> {
        Ok(Embeddings::Vector(self.view().into()))
    }
}

impl<S: Data<Elem = f32>> AsEmbeddings for ArrayBase<S, Ix2> {
    fn as_embeddings(&self) -> Result<Embeddings<'_>> {
        Ok(Embeddings::Matrix(self.view().into()))
    }
}

impl<S: Data<Elem = f32>> AsEmbeddings for ArrayBase<S, IxDyn> {
    fn as_embeddings(&self) -> Result<Embeddings<'_>> {
        let invalid = || Error::InvalidInput {
            expected: "1-D vector or 2-D matrix",
            found: format!("{}-D array of shape {:?}", self.ndim(), self.shape()),
        };
        match self.ndim() {
            1 => self
                .view()
                .into_dimensionality::<Ix1>()
                .map(|v| Embeddings::Vector(v.into()))
                .map_err(|_| invalid()),
            2 => self
                .view()
                .into_dimensionality::<Ix2>()
                .map(|m| Embeddings::Matrix(m.into()))
                .map_err(|_| invalid()),
            _ => Err(invalid()),
        }
    }
}

impl AsEmbeddings for [f32] {
    fn as_embeddings(&self) -> Result<Embeddings<'_>> {
        Ok(Embeddings::Vector(ArrayView1::from(self).into()))
    }
}

impl AsEmbeddings for Vec<f32> {
    fn as_embeddings(&self) -> Result<Embeddings<'_>> {
        self.as_slice().as_embeddings()
    }
}

impl AsEmbeddings for [Vec<f32>] {
    fn as_embeddings(&self) -> Result<Embeddings<'_>> {
        let dim = self.first().map_or(0, Vec::len);
        if let Some((row, bad)) = self.iter().enumerate().find(|(_, r)| r.len() != dim) {
            return Err(Error::InvalidInput {
                expected: "rectangular row list",
                found: format!("row {row} has length {} but row 0 has {dim}", bad.len()),
            });
        }
        let flat: Vec<f32> = self.iter().flatten().copied().collect();
        Array2::from_shape_vec((self.len(), dim), flat)
            .map(|m| Embeddings::Matrix(m.into()))
            .map_err(|e| Error::InvalidInput {
                expected: "rectangular row list",
                found: e.to_string(),
            })
    }
}

impl AsEmbeddings for Vec<Vec<f32>> {
    fn as_embeddings(&self) -> Result<Embeddings<'_>> {
        self.as_slice().as_embeddings()
    }
}

impl<T: AsEmbeddings + ?Sized> AsEmbeddings for &T {
    fn as_embeddings(&self) -> Result<Embeddings<'_>> {
        (**self).as_embeddings()
    }
}
