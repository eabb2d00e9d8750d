//! Vector kernels with SIMD acceleration.
//!
//! Provides `dot` and `squared_l2` with automatic SIMD dispatch:
//! - AVX2+FMA on `x86_64` (runtime detection)
//! - NEON on `aarch64`
//! - Portable fallback otherwise
//!
//! These are the distance primitives behind [`crate::ann::FlatIndex`].
//!
//! # Correctness
//!
//! All SIMD implementations are tested against the portable fallback
//! to ensure identical results (within floating-point tolerance).

/// Dot product of two vectors.
///
/// If vectors have different lengths, uses the shorter length.
/// Returns 0.0 for empty vectors.
#[inline]
#[must_use]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma") {
            // SAFETY: AVX2 and FMA verified via runtime detection.
            // The function handles mismatched lengths by using min(a.len(), b.len()).
            return unsafe { dot_avx2(a, b) };
        }
    }
    #[cfg(target_arch = "aarch64")]
    {
        // SAFETY: NEON is always available on aarch64.
        return unsafe { dot_neon(a, b) };
    }
    #[allow(unreachable_code)]
    dot_portable(a, b)
}

/// Squared Euclidean distance `Σ (a_i - b_i)²`.
///
/// Uses the shorter length on mismatch, like [`dot`].
#[inline]
#[must_use]
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma") {
            // SAFETY: AVX2 and FMA verified via runtime detection.
            return unsafe { squared_l2_avx2(a, b) };
        }
    }
    #[cfg(target_arch = "aarch64")]
    {
        // SAFETY: NEON is always available on aarch64.
        return unsafe { squared_l2_neon(a, b) };
    }
    #[allow(unreachable_code)]
    squared_l2_portable(a, b)
}

// ─────────────────────────────────────────────────────────────────────────────
// Portable fallback
// ─────────────────────────────────────────────────────────────────────────────

#[inline]
#[must_use]
pub(crate) fn dot_portable(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[inline]
#[must_use]
pub(crate) fn squared_l2_portable(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

// ─────────────────────────────────────────────────────────────────────────────
// AVX2 + FMA (x86_64)
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2", enable = "fma")]
unsafe fn hsum_avx2(sum: std::arch::x86_64::__m256) -> f32 {
    use std::arch::x86_64::{
        _mm256_castps256_ps128, _mm256_extractf128_ps, _mm_add_ps, _mm_add_ss, _mm_cvtss_f32,
        _mm_movehl_ps, _mm_shuffle_ps,
    };

    let hi = _mm256_extractf128_ps(sum, 1);
    let lo = _mm256_castps256_ps128(sum);
    let sum128 = _mm_add_ps(lo, hi);
    let sum64 = _mm_add_ps(sum128, _mm_movehl_ps(sum128, sum128));
    let sum32 = _mm_add_ss(sum64, _mm_shuffle_ps(sum64, sum64, 1));
    _mm_cvtss_f32(sum32)
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2", enable = "fma")]
unsafe fn dot_avx2(a: &[f32], b: &[f32]) -> f32 {
    use std::arch::x86_64::{__m256, _mm256_fmadd_ps, _mm256_loadu_ps, _mm256_setzero_ps};

    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }

    let chunks = n / 8;
    let mut sum: __m256 = _mm256_setzero_ps();
    let a_ptr = a.as_ptr();
    let b_ptr = b.as_ptr();

    // SAFETY: chunks*8 <= n <= min(a.len(), b.len()).
    for i in 0..chunks {
        let offset = i * 8;
        let va = _mm256_loadu_ps(a_ptr.add(offset));
        let vb = _mm256_loadu_ps(b_ptr.add(offset));
        sum = _mm256_fmadd_ps(va, vb, sum);
    }

    let mut result = hsum_avx2(sum);
    for i in chunks * 8..n {
        // SAFETY: i < n
        result += *a.get_unchecked(i) * *b.get_unchecked(i);
    }
    result
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2", enable = "fma")]
unsafe fn squared_l2_avx2(a: &[f32], b: &[f32]) -> f32 {
    use std::arch::x86_64::{
        __m256, _mm256_fmadd_ps, _mm256_loadu_ps, _mm256_setzero_ps, _mm256_sub_ps,
    };

    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }

    let chunks = n / 8;
    let mut sum: __m256 = _mm256_setzero_ps();
    let a_ptr = a.as_ptr();
    let b_ptr = b.as_ptr();

    // SAFETY: chunks*8 <= n <= min(a.len(), b.len()).
    for i in 0..chunks {
        let offset = i * 8;
        let diff = _mm256_sub_ps(
            _mm256_loadu_ps(a_ptr.add(offset)),
            _mm256_loadu_ps(b_ptr.add(offset)),
        );
        sum = _mm256_fmadd_ps(diff, diff, sum);
    }

    let mut result = hsum_avx2(sum);
    for i in chunks * 8..n {
        // SAFETY: i < n
        let d = *a.get_unchecked(i) - *b.get_unchecked(i);
        result += d * d;
    }
    result
}

// ─────────────────────────────────────────────────────────────────────────────
// NEON (aarch64)
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(target_arch = "aarch64")]
#[target_feature(enable = "neon")]
unsafe fn dot_neon(a: &[f32], b: &[f32]) -> f32 {
    use std::arch::aarch64::{float32x4_t, vaddvq_f32, vdupq_n_f32, vfmaq_f32, vld1q_f32};

    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }

    let chunks = n / 4;
    let mut sum: float32x4_t = vdupq_n_f32(0.0);
    let a_ptr = a.as_ptr();
    let b_ptr = b.as_ptr();

    // SAFETY: chunks*4 <= n <= min(a.len(), b.len()).
    for i in 0..chunks {
        let offset = i * 4;
        sum = vfmaq_f32(sum, vld1q_f32(a_ptr.add(offset)), vld1q_f32(b_ptr.add(offset)));
    }

    let mut result = vaddvq_f32(sum);
    for i in chunks * 4..n {
        // SAFETY: i < n
        result += *a.get_unchecked(i) * *b.get_unchecked(i);
    }
    result
}

#[cfg(target_arch = "aarch64")]
#[target_feature(enable = "neon")]
unsafe fn squared_l2_neon(a: &[f32], b: &[f32]) -> f32 {
    use std::arch::aarch64::{
        float32x4_t, vaddvq_f32, vdupq_n_f32, vfmaq_f32, vld1q_f32, vsubq_f32,
    };

    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }

    let chunks = n / 4;
    let mut sum: float32x4_t = vdupq_n_f32(0.0);
    let a_ptr = a.as_ptr();
    let b_ptr = b.as_ptr();

    // SAFETY: chunks*4 <= n <= min(a.len(), b.len()).
    for i in 0..chunks {
        let offset = i * 4;
        let diff = vsubq_f32(vld1q_f32(a_ptr.add(offset)), vld1q_f32(b_ptr.add(offset)));
        sum = vfmaq_f32(sum, diff, diff);
    }

    let mut result = vaddvq_f32(sum);
    for i in chunks * 4..n {
        // SAFETY: i < n
        let d = *a.get_unchecked(i) - *b.get_unchecked(i);
        result += d * d;
    }
    result
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────


// ─────────────────────────────────────────────────────────────────────────────
// Property Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_vec(len: usize) -> impl Strategy<Value = Vec<f32>> {
        proptest::collection::vec(-10.0f32..10.0, len)
    }

    proptest! {
        /// SIMD dot matches portable implementation
        #[test]
        fn dot_simd_matches_portable(a in arb_vec(128), b in arb_vec(128)) {
            let simd_result = dot(&a, &b);
            let portable_result = dot_portable(&a, &b);
            prop_assert!((simd_result - portable_result).abs() < 1e-3);
        }

        /// SIMD squared L2 matches portable implementation
        #[test]
        fn squared_l2_simd_matches_portable(a in arb_vec(77), b in arb_vec(77)) {
            let simd_result = squared_l2(&a, &b);
            let portable_result = squared_l2_portable(&a, &b);
            let tolerance = (portable_result * 1e-5).max(1e-3);
            prop_assert!((simd_result - portable_result).abs() < tolerance);
        }

        /// ||a - b||² = ||a||² - 2a·b + ||b||²
        #[test]
        fn squared_l2_expands_to_dots(a in arb_vec(32), b in arb_vec(32)) {
            let expanded = dot(&a, &a) - 2.0 * dot(&a, &b) + dot(&b, &b);
            let direct = squared_l2(&a, &b);
            let tolerance = (direct.abs() * 1e-3).max(1e-2);
            prop_assert!((expanded - direct).abs() < tolerance, "{} vs {}", expanded, direct);
        }

        /// Squared L2 is symmetric and non-negative
        #[test]
        fn squared_l2_symmetric(a in arb_vec(16), b in arb_vec(16)) {
            let ab = squared_l2(&a, &b);
            let ba = squared_l2(&b, &a);
            prop_assert!(ab >= 0.0);
            prop_assert!((ab - ba).abs() < 1e-3);
        }

        /// Dot product is commutative
        #[test]
        fn dot_commutative(a in arb_vec(64), b in arb_vec(64)) {
            prop_assert!((dot(&a, &b) - dot(&b, &a)).abs() < 1e-5);
        }

        /// Cauchy-Schwarz: |dot(a, b)| <= ||a|| ||b||
        #[test]
        fn cauchy_schwarz(a in arb_vec(32), b in arb_vec(32)) {
            let d = dot(&a, &b).abs();
            let bound = dot(&a, &a).sqrt() * dot(&b, &b).sqrt();
            prop_assert!(d <= bound + 1e-2, "|dot| {} > bound {}", d, bound);
        }
    }
}
