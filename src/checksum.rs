//! Centralized CRC32C utilities for block and header checksums.
//!
//! Grounded on the teacher's `checksum.rs` (thin `#[inline]` wrappers
//! returning the domain `Crc32Value` type, single-responsibility module).
//! The algorithm swaps the teacher's CRC-32 (Ethernet/PKZIP polynomial,
//! via `crc32fast`) for CRC32C (Castagnoli, via the `crc32c` crate),
//! matching `original_source/blockaio.cpp`'s SSE4.2 `crc32c()`. The MD5
//! file-identity machinery the teacher built for PAR2's cross-file
//! recovery sets has no counterpart here and is dropped.

use crate::domain::Crc32Value;

/// Compute CRC32C over `data` with an initial/previous value of zero.
#[inline]
pub fn compute_crc32c(data: &[u8]) -> Crc32Value {
    Crc32Value::new(crc32c::crc32c(data))
}

/// Compute CRC32C, chaining from a previously computed value — mirrors
/// `crc32c(data, length, previousCrc32)`'s running-checksum signature.
#[inline]
pub fn compute_crc32c_append(previous: Crc32Value, data: &[u8]) -> Crc32Value {
    Crc32Value::new(crc32c::crc32c_append(previous.as_u32(), data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crc32c_is_deterministic() {
        let data = b"hello world";
        assert_eq!(compute_crc32c(data), compute_crc32c(data));
    }

    #[test]
    fn crc32c_of_empty_is_zero() {
        assert_eq!(compute_crc32c(b""), Crc32Value::new(0));
    }

    #[test]
    fn crc32c_append_matches_one_shot() {
        let data = b"abcdefghijklmnop";
        let one_shot = compute_crc32c(data);
        let (a, b) = data.split_at(7);
        let chained = compute_crc32c_append(compute_crc32c(a), b);
        assert_eq!(one_shot, chained);
    }

    #[test]
    fn crc32c_detects_single_bit_flip() {
        let mut data = vec![0x42u8; 64];
        let original = compute_crc32c(&data);
        data[30] ^= 0x01;
        assert_ne!(original, compute_crc32c(&data));
    }
}
