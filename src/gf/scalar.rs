//! Scalar GF(2^8) operations: the public `gf_mul`/`gf_div`/`gf_pow` contract.
//!
//! Grounded on the teacher's `Galois16::checked_div`/`pow` (div-by-zero is a
//! contract violation, not a recoverable error) and on
//! `original_source/rs.c`'s `gf_div_direct`/`gf_pow`.

use super::tables;

/// `a * b` in GF(2^8).
pub fn gf_mul(a: u8, b: u8) -> u8 {
    tables().mul(a, b)
}

/// `a / b` in GF(2^8). Panics if `b == 0` — division by zero is a contract
/// violation, mirroring the source's `fprintf`+`exit(1)`.
pub fn gf_div(a: u8, b: u8) -> u8 {
    tables().div(a, b)
}

/// `a^n` in GF(2^8).
pub fn gf_pow(a: u8, n: u32) -> u8 {
    tables().pow(a, n)
}
