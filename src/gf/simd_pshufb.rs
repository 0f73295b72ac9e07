//! AVX2/SSSE3 nibble-table shuffle multiply for GF(2^8).
//!
//! Grounded on the teacher's `reed_solomon/simd_pshufb.rs` (broadcast-to-256-bit
//! + `_mm256_shuffle_epi8` + xor-recombine structure) and
//! `original_source/rs_avx2.c`'s `mul1_avx2`/`mul_add1_avx2`, reduced from
//! four nibble tables (needed for the teacher's GF(2^16), where each element
//! spans two bytes) down to two: for a single-byte field element
//! `x = (x_hi << 4) ^ x_lo`, `MUL[c][x] = MUL[c][x_lo] ^ MUL[c][x_hi << 4]`
//! directly, by the GF(2)-linearity of multiplication over XOR. No
//! byte-of-word splitting is needed here.

use super::tables;
use std::arch::x86_64::*;

/// Split the 256-entry row `MUL[c][..]` into two 16-byte nibble tables:
/// `lo[n] = MUL[c][n]` and `hi[n] = MUL[c][n<<4]`.
fn build_nibble_tables(row: &[u8]) -> ([u8; 16], [u8; 16]) {
    let mut lo = [0u8; 16];
    let mut hi = [0u8; 16];
    for n in 0..16usize {
        lo[n] = row[n];
        hi[n] = row[n << 4];
    }
    (lo, hi)
}

/// Multiply `dst[i] = MUL[c][src[i]]` over as many bytes as divide evenly
/// into 64-byte chunks. Returns the number of bytes processed; callers
/// finish any remainder with the scalar table.
///
/// # Safety
/// Caller must have verified AVX2 + SSSE3 support (see [`super::simd::detect_simd_level`]).
#[target_feature(enable = "avx2", enable = "ssse3")]
pub unsafe fn bulk_mul_avx2(dst: &mut [u8], src: &[u8], c: u8) -> usize {
    let row = tables().mul_row(c);
    let (lo, hi) = build_nibble_tables(row);

    let t_lo = _mm256_broadcastsi128_si256(_mm_loadu_si128(lo.as_ptr() as *const __m128i));
    let t_hi = _mm256_broadcastsi128_si256(_mm_loadu_si128(hi.as_ptr() as *const __m128i));
    let mask = _mm256_set1_epi8(0x0F);

    let n = dst.len().min(src.len());
    let mut i = 0;
    while i + 64 <= n {
        for half in 0..2 {
            let off = i + half * 32;
            let s = _mm256_loadu_si256(src.as_ptr().add(off) as *const __m256i);
            let lo_nib = _mm256_and_si256(s, mask);
            let hi_nib = _mm256_and_si256(_mm256_srli_epi64(s, 4), mask);
            let r = _mm256_xor_si256(
                _mm256_shuffle_epi8(t_lo, lo_nib),
                _mm256_shuffle_epi8(t_hi, hi_nib),
            );
            _mm256_storeu_si256(dst.as_mut_ptr().add(off) as *mut __m256i, r);
        }
        i += 64;
    }
    i
}

/// `dst[i] ^= MUL[c][src[i]]` — same shape as [`bulk_mul_avx2`] but
/// XOR-accumulates into the existing output instead of overwriting it.
///
/// # Safety
/// Same as [`bulk_mul_avx2`].
#[target_feature(enable = "avx2", enable = "ssse3")]
pub unsafe fn bulk_mul_add_avx2(dst: &mut [u8], src: &[u8], c: u8) -> usize {
    let row = tables().mul_row(c);
    let (lo, hi) = build_nibble_tables(row);

    let t_lo = _mm256_broadcastsi128_si256(_mm_loadu_si128(lo.as_ptr() as *const __m128i));
    let t_hi = _mm256_broadcastsi128_si256(_mm_loadu_si128(hi.as_ptr() as *const __m128i));
    let mask = _mm256_set1_epi8(0x0F);

    let n = dst.len().min(src.len());
    let mut i = 0;
    while i + 64 <= n {
        for half in 0..2 {
            let off = i + half * 32;
            let s = _mm256_loadu_si256(src.as_ptr().add(off) as *const __m256i);
            let d = _mm256_loadu_si256(dst.as_ptr().add(off) as *const __m256i);
            let lo_nib = _mm256_and_si256(s, mask);
            let hi_nib = _mm256_and_si256(_mm256_srli_epi64(s, 4), mask);
            let prod = _mm256_xor_si256(
                _mm256_shuffle_epi8(t_lo, lo_nib),
                _mm256_shuffle_epi8(t_hi, hi_nib),
            );
            let r = _mm256_xor_si256(d, prod);
            _mm256_storeu_si256(dst.as_mut_ptr().add(off) as *mut __m256i, r);
        }
        i += 64;
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gf::scalar::gf_mul;

    fn avx2_available() -> bool {
        is_x86_feature_detected!("avx2") && is_x86_feature_detected!("ssse3")
    }

    #[test]
    fn pshufb_matches_scalar_mul() {
        if !avx2_available() {
            return;
        }
        let src: Vec<u8> = (0..256u32).map(|i| (i % 256) as u8).collect();
        for &c in &[2u8, 0x53, 0xCA, 0xFF] {
            let mut dst = vec![0xAAu8; src.len()];
            let processed = unsafe { bulk_mul_avx2(&mut dst, &src, c) };
            for i in 0..processed {
                assert_eq!(dst[i], gf_mul(c, src[i]));
            }
        }
    }

    #[test]
    fn pshufb_matches_scalar_mul_add() {
        if !avx2_available() {
            return;
        }
        let src: Vec<u8> = (0..256u32).map(|i| (i % 256) as u8).collect();
        for &c in &[2u8, 0x53, 0xCA, 0xFF] {
            let mut dst: Vec<u8> = (0..256u32).map(|i| ((i * 5) % 256) as u8).collect();
            let before = dst.clone();
            let processed = unsafe { bulk_mul_add_avx2(&mut dst, &src, c) };
            for i in 0..processed {
                assert_eq!(dst[i], before[i] ^ gf_mul(c, src[i]));
            }
        }
    }
}
