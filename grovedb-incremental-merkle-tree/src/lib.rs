//! Incremental binary Merkle tree with multi-leaf inclusion proofs.
//!
//! Leaves are streamed into a [`Tree`] that keeps a single node per level,
//! so arbitrarily large and unbalanced trees are built in logarithmic
//! memory. Inclusion proofs for a set of leaves fixed in advance are
//! collected on the fly and checked with [`validate_proof`].
//!
//! # Core types
//!
//! - [`Tree`]: the accumulator (add, root, root and proof, resume).
//! - [`validate_proof`]: rebuild a root from proven leaves and a proof.
//! - [`TreeProof`]: serializable root, leaves and proof bundle.
//! - [`TreeConfig`] / [`ValidatorConfig`]: hashing and proving parameters.
//!
//! # Hashing
//!
//! - [`Sha256Hasher`] (default) and [`Blake3Hasher`] combine nodes.
//! - [`ValueLeaves`] (default) uses raw values as leaves.
//! - [`SequentialWorkHasher`] chains every leaf to all its left siblings,
//!   forcing strictly sequential construction.
//!
//! # Layer caches
//!
//! - [`LayerCache`]: append-only per-level node storage.
//! - [`NoOpLayerCache`]: stores nothing.
//! - [`MemLayerCache`]: in-memory cache (requires `mem_store` feature).
//! - [`FileLayerCache`]: one file per level in a directory.

#![warn(missing_docs)]

mod config;
mod error;
mod file_cache;
/// Hashing strategies for nodes and leaves.
pub mod hasher;
/// Index arithmetic shared by the tree and the validator.
pub(crate) mod helper;
mod layer_cache;
/// In-memory layer cache (requires `mem_store` feature).
#[cfg(any(test, feature = "mem_store"))]
pub mod mem_cache;
mod proof;
#[cfg(test)]
mod tests;
mod tree;
mod validator;

pub use config::{TreeConfig, ValidatorConfig};
pub use error::{Error, Result};
pub use file_cache::FileLayerCache;
pub use hasher::{
    Blake3Hasher, ContextPool, LeafHasher, NodeHasher, SequentialWorkHasher, Sha256Hasher,
    ValueLeaves,
};
pub use helper::{hash_count_for_add, tree_height};
pub use layer_cache::{LayerCache, NoOpLayerCache};
#[cfg(any(test, feature = "mem_store"))]
pub use mem_cache::MemLayerCache;
pub use proof::TreeProof;
pub use tree::Tree;
pub use validator::validate_proof;
