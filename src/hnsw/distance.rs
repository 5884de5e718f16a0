//! Squared Euclidean (L2²) distance kernel.
//!
//! Provides NEON (aarch64) and AVX2+FMA (x86_64) implementations with a
//! scalar fallback on unsupported platforms or when AVX2 is unavailable at
//! runtime. Callers treat the result as a non-negative monotone comparator,
//! so lane reassociation relative to the scalar reference is permitted.

/// Squared L2 distance between two equal-length f32 slices.
///
/// Both slices must have the same length; the index guarantees this by
/// rejecting mismatched dimensions at the API boundary.
#[inline]
#[allow(unreachable_code)]
pub fn l2_sq(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    #[cfg(target_arch = "aarch64")]
    {
        return unsafe { neon_l2_sq(a, b) };
    }
    #[cfg(target_arch = "x86_64")]
    {
        if std::arch::is_x86_feature_detected!("avx2") && std::arch::is_x86_feature_detected!("fma")
        {
            return unsafe { avx2_l2_sq(a, b) };
        }
    }
    scalar_l2_sq(a, b)
}

/// Scalar reference implementation.
pub(crate) fn scalar_l2_sq(a: &[f32], b: &[f32]) -> f32 {
    let mut sum = 0.0f32;
    for i in 0..a.len() {
        let d = a[i] - b[i];
        sum += d * d;
    }
    sum
}

// ============================================================================
// NEON implementation (aarch64)
// ============================================================================

#[cfg(target_arch = "aarch64")]
unsafe fn neon_l2_sq(a: &[f32], b: &[f32]) -> f32 {
    use std::arch::aarch64::*;

    let len = a.len();
    let a_ptr = a.as_ptr();
    let b_ptr = b.as_ptr();

    let mut acc = vdupq_n_f32(0.0);

    let chunks = len / 4;
    for i in 0..chunks {
        let base = i * 4;
        let d = vsubq_f32(vld1q_f32(a_ptr.add(base)), vld1q_f32(b_ptr.add(base)));
        acc = vfmaq_f32(acc, d, d);
    }

    let mut sum = vaddvq_f32(acc);

    for i in (chunks * 4)..len {
        let d = *a_ptr.add(i) - *b_ptr.add(i);
        sum += d * d;
    }
    sum
}

// ============================================================================
// AVX2+FMA implementation (x86_64)
// ============================================================================

/// Horizontal sum of 8 f32 values in a __m256 register.
#[cfg(target_arch = "x86_64")]
#[inline]
#[target_feature(enable = "avx2")]
unsafe fn hsum_f32x8(v: std::arch::x86_64::__m256) -> f32 {
    use std::arch::x86_64::*;
    let hi128 = _mm256_extractf128_ps(v, 1);
    let lo128 = _mm256_castps256_ps128(v);
    let sum128 = _mm_add_ps(lo128, hi128);
    let hi64 = _mm_movehl_ps(sum128, sum128);
    let sum64 = _mm_add_ps(sum128, hi64);
    let hi32 = _mm_shuffle_ps(sum64, sum64, 0x55);
    _mm_cvtss_f32(_mm_add_ss(sum64, hi32))
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2,fma")]
unsafe fn avx2_l2_sq(a: &[f32], b: &[f32]) -> f32 {
    use std::arch::x86_64::*;

    let len = a.len();
    let a_ptr = a.as_ptr();
    let b_ptr = b.as_ptr();

    let mut acc = _mm256_setzero_ps();

    let chunks = len / 8;
    for i in 0..chunks {
        let base = i * 8;
        let d = _mm256_sub_ps(
            _mm256_loadu_ps(a_ptr.add(base)),
            _mm256_loadu_ps(b_ptr.add(base)),
        );
        acc = _mm256_fmadd_ps(d, d, acc);
    }

    let mut sum = hsum_f32x8(acc);

    for i in (chunks * 8)..len {
        let d = *a_ptr.add(i) - *b_ptr.add(i);
        sum += d * d;
    }
    sum
}
