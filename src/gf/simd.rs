//! Runtime SIMD level detection, cached behind a [`OnceLock`] so the CPUID
//! probe happens once per process.
//!
//! Grounded on the teacher's `reed_solomon/simd/mod.rs`'s
//! `detect_simd_support()`/`SimdLevel` dispatch shape; `PortableSimd` is
//! dropped (nightly-only) per SPEC_FULL.md's ambient-stack decision.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimdLevel {
    None,
    Avx2,
    Neon,
}

static LEVEL: OnceLock<SimdLevel> = OnceLock::new();

const OVERRIDE_NONE: u8 = 0;
const OVERRIDE_SCALAR: u8 = 1;
const OVERRIDE_AVX2: u8 = 2;
const OVERRIDE_NEON: u8 = 3;

/// Process-wide override of [`detect_simd_level`], set by [`crate::config::RsConfig::apply`].
/// `OVERRIDE_NONE` means "use the cached auto-detect result".
static OVERRIDE: AtomicU8 = AtomicU8::new(OVERRIDE_NONE);

/// Force every subsequent `bulk_*` call in this process onto a specific
/// dispatch level, bypassing auto-detection. Pass `None` to restore it.
/// Does not check whether the target actually supports `level` — an
/// unsupported forced level faults at the first SIMD instruction rather
/// than being silently downgraded, matching [`crate::config::SimdOverride`]'s
/// documented contract.
pub fn set_override(level: Option<SimdLevel>) {
    let code = match level {
        None => OVERRIDE_NONE,
        Some(SimdLevel::None) => OVERRIDE_SCALAR,
        Some(SimdLevel::Avx2) => OVERRIDE_AVX2,
        Some(SimdLevel::Neon) => OVERRIDE_NEON,
    };
    OVERRIDE.store(code, Ordering::SeqCst);
}

pub fn detect_simd_level() -> SimdLevel {
    match OVERRIDE.load(Ordering::SeqCst) {
        OVERRIDE_SCALAR => return SimdLevel::None,
        OVERRIDE_AVX2 => return SimdLevel::Avx2,
        OVERRIDE_NEON => return SimdLevel::Neon,
        _ => {}
    }
    *LEVEL.get_or_init(detect)
}

#[cfg(target_arch = "x86_64")]
fn detect() -> SimdLevel {
    if is_x86_feature_detected!("avx2") && is_x86_feature_detected!("ssse3") {
        SimdLevel::Avx2
    } else {
        SimdLevel::None
    }
}

#[cfg(target_arch = "aarch64")]
fn detect() -> SimdLevel {
    // All AArch64 cores implement NEON; no runtime probe required.
    SimdLevel::Neon
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
fn detect() -> SimdLevel {
    SimdLevel::None
}

/// Force a specific SIMD level for testing / benchmarking, bypassing
/// detection. Not part of the public dispatch path; used by `RsConfig`.
pub fn level_is_available(level: SimdLevel) -> bool {
    match level {
        SimdLevel::None => true,
        SimdLevel::Avx2 => {
            #[cfg(target_arch = "x86_64")]
            {
                is_x86_feature_detected!("avx2") && is_x86_feature_detected!("ssse3")
            }
            #[cfg(not(target_arch = "x86_64"))]
            {
                false
            }
        }
        SimdLevel::Neon => cfg!(target_arch = "aarch64"),
    }
}
