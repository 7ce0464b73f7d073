use thiserror::Error;

/// Alias for `core::result::Result<T, Error>`.
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for tree accumulation, proof validation and layer
/// caches.
///
/// A proof that is well formed but does not hash to the claimed root is not
/// an error: validation returns `Ok(false)` in that case.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Validation was called without any leaves to prove.
    #[error("no leaves to prove")]
    NoLeaves,
    /// The proof ran out before the reconstruction reached the root.
    #[error("proof is too short")]
    ShortProof,
    /// Tried to compute the root of a tree without leaves.
    #[error("root requested from an empty tree")]
    EmptyTree,
    /// Invalid input parameters.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Invalid data (deserialization, corruption).
    #[error("invalid data: {0}")]
    InvalidData(String),
    /// A layer cache read past the end of a level.
    #[error("layer {level} has {len} records, index {index} is out of range")]
    CacheIndexOutOfRange {
        /// Tree level that was read.
        level: u32,
        /// Requested record index.
        index: u64,
        /// Number of records stored for the level.
        len: u64,
    },
    /// A layer cache holds data inconsistent with its record layout.
    #[error("corrupt layer cache: {0}")]
    CorruptCache(String),
    /// An error propagated from the file system.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
