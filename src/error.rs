//! Error taxonomy for the erasure-coded block volume core.
//!
//! Contract violations (bad caller input, internal invariant breaks) panic —
//! they indicate a programmer bug, not a runtime condition a caller can act
//! on. Everything that can legitimately happen at runtime (a singular
//! submatrix, a CRC mismatch, an I/O rejection) is a typed, recoverable
//! [`CoreError`].

use thiserror::Error;

/// Errors from Reed-Solomon matrix construction, encode, decode, and
/// generalized shard-set transforms.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RsError {
    #[error("too many shards: data_shards + parity_shards must be <= 255")]
    TooManyShards,
    #[error("invalid shard counts: data_shards and parity_shards must both be >= 1")]
    InvalidShardCounts,
    #[error("not enough surviving shards to reconstruct: {erased} erased, {parity} parity available")]
    NotEnoughShards { erased: usize, parity: usize },
    #[error("singular matrix at column {0}; the supplied survivor/input set is linearly dependent")]
    SingularMatrix(usize),
    #[error("shard length mismatch: expected {expected}, got {actual}")]
    ShardLengthMismatch { expected: usize, actual: usize },
    #[error("input and output shard-id sets must be disjoint")]
    OverlappingShardSets,
}

/// Errors from spread/unspread.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpreadError {
    #[error("buffer length {len} is not a multiple of 16*k (k={k})")]
    NotAligned { len: usize, k: usize },
    #[error("expected {expected} shard buffers, got {actual}")]
    ShardCountMismatch { expected: usize, actual: usize },
    #[error("shard buffer {index} has length {actual}, expected {expected}")]
    ShardLengthMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },
}

/// Errors validating or addressing an on-disk [`crate::block::Block`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BlockError {
    #[error("block checksum mismatch: stored {stored:08x}, computed {computed:08x}")]
    ChecksumMismatch { stored: u32, computed: u32 },
}

/// Errors validating or addressing an on-disk [`crate::block::Header`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HeaderError {
    #[error("bad magic number")]
    BadMagic,
    #[error("unsupported version number {0}")]
    BadVersion(u32),
    #[error("volume_prefix_id {0:#x} is below the required 2^24 floor")]
    BadVolumePrefix(u32),
    #[error("header checksum mismatch: stored {stored:08x}, computed {computed:08x}")]
    ChecksumMismatch { stored: u32, computed: u32 },
}

/// Errors from the asynchronous page I/O shim.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("page-aligned allocation failed for {pages} pages")]
    Alloc { pages: usize },
    #[error("I/O submission failed: {0}")]
    Submit(#[source] std::io::Error),
    #[error("I/O reap failed: {0}")]
    Reap(#[source] std::io::Error),
}

/// Top-level error type composing every recoverable failure mode in the
/// core. Collaborators that hold onto a single error type across calls to
/// several components (encode, then stamp headers, then submit I/O) can use
/// this instead of matching on each component's error individually.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Rs(#[from] RsError),
    #[error(transparent)]
    Spread(#[from] SpreadError),
    #[error(transparent)]
    Block(#[from] BlockError),
    #[error(transparent)]
    Header(#[from] HeaderError),
    #[error(transparent)]
    Io(#[from] IoError),
}
