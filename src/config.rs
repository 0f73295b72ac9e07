//! Runtime configuration surface: SIMD level override and I/O page-batch /
//! queue-depth sizing. I/O *backend* selection (uring vs. synchronous) is a
//! compile-time feature-flag choice, not a field here — see [`IoConfig`].
//!
//! Grounded on the pattern of the teacher's `reed_solomon/types.rs`'s
//! `ReconstructionConfig` (a plain `Default`-able struct with a `new()`
//! convenience constructor and small validation helpers) generalized to
//! the two config surfaces §4.I calls for.

use crate::gf::{self, SimdLevel};
use log::warn;

/// Overrides automatic SIMD dispatch in the GF kernel. Exists for testing
/// parity between code paths and for environments where auto-detection
/// picks a level the caller wants to avoid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SimdOverride {
    /// Use [`crate::gf::simd::detect_simd_level`]'s runtime probe.
    #[default]
    Auto,
    /// Force the portable scalar table path.
    ForceScalar,
    /// Force a specific ISA; the caller is responsible for confirming the
    /// target supports it (an unsupported choice will fault at the first
    /// SIMD op, not be silently downgraded).
    Force(SimdLevel),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RsConfig {
    pub simd: SimdOverride,
}

impl Default for RsConfig {
    fn default() -> Self {
        RsConfig {
            simd: SimdOverride::Auto,
        }
    }
}

impl RsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_simd_override(mut self, simd: SimdOverride) -> Self {
        self.simd = simd;
        self
    }

    /// Install this configuration's SIMD override as the process-wide
    /// dispatch choice for every subsequent `bulk_*` call. Logs a warning
    /// (but still applies the override) when `Force`-ing a level the
    /// current CPU does not actually support, since that will fault at the
    /// first SIMD instruction rather than fail here.
    pub fn apply(&self) {
        match self.simd {
            SimdOverride::Auto => gf::set_override(None),
            SimdOverride::ForceScalar => gf::set_override(Some(SimdLevel::None)),
            SimdOverride::Force(level) => {
                if !gf::level_is_available(level) {
                    warn!("RsConfig::apply: forcing unsupported SIMD level {level:?}");
                }
                gf::set_override(Some(level));
            }
        }
    }
}

/// Tunables for the async page I/O shim. Which concrete mechanism backs it
/// (`io_uring` vs. the synchronous `pread`/`pwrite` fallback) is selected at
/// compile time by the `uring` feature flag, not here — see `src/io/context.rs`'s
/// two `mod backend` blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IoConfig {
    /// Maximum number of completions a single `reap()` call drains.
    pub reap_batch_size: usize,
    /// Submission queue depth for the `uring` backend; ignored otherwise.
    pub queue_depth: u32,
}

impl Default for IoConfig {
    fn default() -> Self {
        IoConfig {
            reap_batch_size: 64,
            queue_depth: 128,
        }
    }
}

impl IoConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_feasible_queue_depth(&self, in_flight: usize) -> bool {
        in_flight <= self.queue_depth as usize
    }
}
