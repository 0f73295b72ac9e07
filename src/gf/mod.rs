//! GF(2^8) arithmetic kernel: scalar ops, SIMD-accelerated bulk primitives,
//! and the process-wide field tables that back both.
//!
//! The field is GF(2^8) under the primitive polynomial 0x11D
//! (x^8 + x^4 + x^3 + x^2 + 1); addition is bytewise XOR.

pub mod bulk;
pub mod scalar;
pub mod simd;
#[cfg(target_arch = "x86_64")]
pub mod simd_pshufb;
#[cfg(target_arch = "aarch64")]
pub mod simd_neon;
mod tables;

pub use bulk::{bulk_add, bulk_mul, bulk_mul_add};
pub use scalar::{gf_div, gf_mul, gf_pow};
pub use simd::{level_is_available, set_override, SimdLevel};
pub use tables::{init_gf, tables, GfTables};
