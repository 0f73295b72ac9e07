//! Bulk GF(2^8) byte-buffer primitives: `dst = src*c`, `dst ^= src*c`,
//! `dst ^= src`, dispatched to the fastest SIMD path available and falling
//! back to a scalar table lookup.
//!
//! Grounded on the teacher's `reed_solomon/scalar.rs` chunked-loop shape and
//! `original_source/rs_avx2.c`'s `add1_avx2` (64-byte double-register XOR
//! loop with scalar tail).

use super::simd::{detect_simd_level, SimdLevel};
use super::tables;

const CHUNK: usize = 64;

/// `dst[i] = MUL[c][src[i]]` for `i` in `[0, n)`, where `n = dst.len().min(src.len())`.
pub fn bulk_mul(dst: &mut [u8], src: &[u8], c: u8) {
    let n = dst.len().min(src.len());
    let dst = &mut dst[..n];
    let src = &src[..n];

    if c == 0 {
        dst.fill(0);
        return;
    }
    if c == 1 {
        dst.copy_from_slice(src);
        return;
    }

    let level = detect_simd_level();
    let mut i = 0;
    #[cfg(target_arch = "x86_64")]
    if level == SimdLevel::Avx2 {
        i = unsafe { super::simd_pshufb::bulk_mul_avx2(dst, src, c) };
    }
    #[cfg(target_arch = "aarch64")]
    if level == SimdLevel::Neon {
        i = unsafe { super::simd_neon::bulk_mul_neon(dst, src, c) };
    }
    let _ = level;

    let row = tables().mul_row(c);
    for k in i..n {
        dst[k] = row[src[k] as usize];
    }
}

/// `dst[i] ^= MUL[c][src[i]]` for `i` in `[0, n)`.
pub fn bulk_mul_add(dst: &mut [u8], src: &[u8], c: u8) {
    let n = dst.len().min(src.len());
    let dst = &mut dst[..n];
    let src = &src[..n];

    if c == 0 {
        return;
    }
    if c == 1 {
        bulk_add(dst, src);
        return;
    }

    let level = detect_simd_level();
    let mut i = 0;
    #[cfg(target_arch = "x86_64")]
    if level == SimdLevel::Avx2 {
        i = unsafe { super::simd_pshufb::bulk_mul_add_avx2(dst, src, c) };
    }
    #[cfg(target_arch = "aarch64")]
    if level == SimdLevel::Neon {
        i = unsafe { super::simd_neon::bulk_mul_add_neon(dst, src, c) };
    }
    let _ = level;

    let row = tables().mul_row(c);
    for k in i..n {
        dst[k] ^= row[src[k] as usize];
    }
}

/// `dst[i] ^= src[i]` for `i` in `[0, n)`.
pub fn bulk_add(dst: &mut [u8], src: &[u8]) {
    let n = dst.len().min(src.len());
    let dst = &mut dst[..n];
    let src = &src[..n];

    let mut i = 0;
    while i + CHUNK <= n {
        for k in 0..CHUNK {
            dst[i + k] ^= src[i + k];
        }
        i += CHUNK;
    }
    while i < n {
        dst[i] ^= src[i];
        i += 1;
    }
}
