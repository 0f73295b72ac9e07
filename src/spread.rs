//! Round-robin 16-byte interleave ("spread") and de-interleave ("unspread")
//! of a contiguous buffer across `k` shard buffers.
//!
//! Grounded on `original_source/blockaio.cpp`'s `spreadData`/`unspreadData`:
//! each round copies one 16-byte lane from the source into each of the `k`
//! destinations (or back) using unaligned SSE2 loads/stores, advancing a
//! per-destination offset. The original silently drops any input not a
//! multiple of `16*k` bytes (`while (input_size >= 16*k)`); this crate
//! treats that case as an error instead (see SPEC_FULL.md §9, resolved open
//! question 2) rather than truncating data the caller did not ask to drop.

use crate::error::SpreadError;

const LANE: usize = 16;

fn rounds_for(len: usize, k: usize) -> Result<usize, SpreadError> {
    let stride = LANE * k;
    if stride == 0 || len % stride != 0 {
        return Err(SpreadError::NotAligned { len, k });
    }
    Ok(len / stride)
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "sse2")]
unsafe fn copy_lane(dst: *mut u8, src: *const u8) {
    use std::arch::x86_64::{_mm_loadu_si128, _mm_storeu_si128};
    let v = _mm_loadu_si128(src as *const std::arch::x86_64::__m128i);
    _mm_storeu_si128(dst as *mut std::arch::x86_64::__m128i, v);
}

#[cfg(not(target_arch = "x86_64"))]
unsafe fn copy_lane(dst: *mut u8, src: *const u8) {
    std::ptr::copy_nonoverlapping(src, dst, LANE);
}

/// Split `input` round-robin into `k` equal-length shard buffers of 16-byte
/// lanes. `input.len()` must be a nonzero multiple of `16*k`.
pub fn spread(input: &[u8], k: usize) -> Result<Vec<Vec<u8>>, SpreadError> {
    let rounds = rounds_for(input.len(), k)?;
    let shard_len = rounds * LANE;
    let mut out: Vec<Vec<u8>> = (0..k).map(|_| vec![0u8; shard_len]).collect();

    for round in 0..rounds {
        let src_base = round * LANE * k;
        for i in 0..k {
            let src = &input[src_base + i * LANE..src_base + (i + 1) * LANE];
            let dst = &mut out[i][round * LANE..(round + 1) * LANE];
            #[cfg(target_arch = "x86_64")]
            unsafe {
                copy_lane(dst.as_mut_ptr(), src.as_ptr());
            }
            #[cfg(not(target_arch = "x86_64"))]
            unsafe {
                copy_lane(dst.as_mut_ptr(), src.as_ptr());
            }
        }
    }
    Ok(out)
}

/// Inverse of [`spread`]: reassemble `output_size` bytes from `k` shard
/// buffers. Every shard must have the same length, and that length must be
/// a nonzero multiple of 16; `output_size` must equal `k * shard_len`.
pub fn unspread(blocks: &[&[u8]], output_size: usize) -> Result<Vec<u8>, SpreadError> {
    let k = blocks.len();
    let rounds = rounds_for(output_size, k)?;
    let shard_len = rounds * LANE;
    for (i, b) in blocks.iter().enumerate() {
        if b.len() != shard_len {
            return Err(SpreadError::ShardLengthMismatch {
                index: i,
                expected: shard_len,
                actual: b.len(),
            });
        }
    }

    let mut out = vec![0u8; output_size];
    for round in 0..rounds {
        let dst_base = round * LANE * k;
        for i in 0..k {
            let src = &blocks[i][round * LANE..(round + 1) * LANE];
            let dst = &mut out[dst_base + i * LANE..dst_base + (i + 1) * LANE];
            #[cfg(target_arch = "x86_64")]
            unsafe {
                copy_lane(dst.as_mut_ptr(), src.as_ptr());
            }
            #[cfg(not(target_arch = "x86_64"))]
            unsafe {
                copy_lane(dst.as_mut_ptr(), src.as_ptr());
            }
        }
    }
    Ok(out)
}
