//! Node and leaf hashing strategies.
//!
//! A [`NodeHasher`] combines two child digests into their parent. A
//! [`LeafHasher`] turns a raw leaf value into the digest stored at level 0,
//! optionally folding in the digests of every left sibling on the leaf's path
//! (see [`SequentialWorkHasher`]).
//!
//! Hashing contexts are recycled through a [`ContextPool`] owned by each
//! hasher instance, so concurrent trees sharing one `Arc`'d hasher only
//! contend on a short checkout.

use std::{fmt, sync::Mutex};

use sha2::{Digest, Sha256};

/// Domain tag prepended to internal merge inputs of [`Blake3Hasher`]:
/// `blake3(INTERNAL_TAG || left || right)`.
const INTERNAL_TAG: u8 = 0x01;

/// Length in bytes of SHA-256 and BLAKE3 digests.
pub const DIGEST_SIZE: usize = 32;

/// Combines two child digests into a parent digest.
pub trait NodeHasher: Send + Sync {
    /// Clear `out` and write the parent of `left` and `right` into it.
    fn hash_into(&self, out: &mut Vec<u8>, left: &[u8], right: &[u8]);

    /// Size in bytes of every digest produced by this hasher.
    fn size(&self) -> usize;

    /// Allocate and return the parent of `left` and `right`.
    fn hash(&self, left: &[u8], right: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.size());
        self.hash_into(&mut out, left, right);
        out
    }
}

/// Derives the level-0 digest of a leaf.
pub trait LeafHasher: Send + Sync {
    /// Clear `out` and write the leaf digest of `value` into it.
    ///
    /// `left_siblings` holds the digests of the leaf's left siblings, the
    /// immediate one first. It is empty unless [`is_sequential`] is `true`.
    ///
    /// [`is_sequential`]: LeafHasher::is_sequential
    fn hash_into(&self, out: &mut Vec<u8>, value: &[u8], left_siblings: &[&[u8]]);

    /// Expected size in bytes of a leaf digest.
    fn size(&self) -> usize;

    /// Whether leaf digests depend on the left sibling chain.
    fn is_sequential(&self) -> bool;

    /// Allocate and return the leaf digest of `value`.
    fn hash(&self, value: &[u8], left_siblings: &[&[u8]]) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.size());
        self.hash_into(&mut out, value, left_siblings);
        out
    }
}

/// A free list of reusable hashing contexts.
///
/// Contexts are checked out for the duration of one hash call and returned
/// afterwards. A poisoned lock is recovered, since a context is only ever
/// pushed back after it was reset.
pub struct ContextPool<T> {
    free: Mutex<Vec<T>>,
}

impl<T> Default for ContextPool<T> {
    fn default() -> Self {
        Self {
            free: Mutex::new(Vec::new()),
        }
    }
}

impl<T> fmt::Debug for ContextPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextPool")
            .field("idle", &self.idle())
            .finish()
    }
}

impl<T> ContextPool<T> {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of contexts currently waiting in the pool.
    pub fn idle(&self) -> usize {
        self.free.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl<T: Default> ContextPool<T> {
    /// Run `f` with a context from the pool, creating one if none is idle.
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut ctx = self
            .free
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop()
            .unwrap_or_default();
        let result = f(&mut ctx);
        self.free
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(ctx);
        result
    }
}

/// `sha256(left || right)`. The default node hasher.
#[derive(Debug, Default)]
pub struct Sha256Hasher {
    pool: ContextPool<Sha256>,
}

impl Sha256Hasher {
    /// Create a hasher with an empty context pool.
    pub fn new() -> Self {
        Self::default()
    }
}

impl NodeHasher for Sha256Hasher {
    fn hash_into(&self, out: &mut Vec<u8>, left: &[u8], right: &[u8]) {
        out.clear();
        self.pool.with(|ctx| {
            ctx.update(left);
            ctx.update(right);
            out.extend_from_slice(&ctx.finalize_reset());
        });
    }

    fn size(&self) -> usize {
        DIGEST_SIZE
    }
}

/// `blake3(0x01 || left || right)`, the domain-separated merge used by
/// GroveDB's append-only trees.
#[derive(Debug, Default)]
pub struct Blake3Hasher {
    pool: ContextPool<blake3::Hasher>,
}

impl Blake3Hasher {
    /// Create a hasher with an empty context pool.
    pub fn new() -> Self {
        Self::default()
    }
}

impl NodeHasher for Blake3Hasher {
    fn hash_into(&self, out: &mut Vec<u8>, left: &[u8], right: &[u8]) {
        out.clear();
        self.pool.with(|ctx| {
            ctx.update(&[INTERNAL_TAG]);
            ctx.update(left);
            ctx.update(right);
            out.extend_from_slice(ctx.finalize().as_bytes());
            ctx.reset();
        });
    }

    fn size(&self) -> usize {
        DIGEST_SIZE
    }
}

/// Uses the leaf value itself as the leaf digest.
///
/// `size` is only a capacity hint: values of any length pass through
/// unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueLeaves {
    size: usize,
}

impl ValueLeaves {
    /// Passthrough leaves of the given expected size.
    pub fn new(size: usize) -> Self {
        Self { size }
    }
}

impl Default for ValueLeaves {
    fn default() -> Self {
        Self::new(DIGEST_SIZE)
    }
}

impl LeafHasher for ValueLeaves {
    fn hash_into(&self, out: &mut Vec<u8>, value: &[u8], _left_siblings: &[&[u8]]) {
        out.clear();
        out.extend_from_slice(value);
    }

    fn size(&self) -> usize {
        self.size
    }

    fn is_sequential(&self) -> bool {
        false
    }
}

/// Proof-of-sequential-work leaves: `sha256(value || s_0 || s_1 || ...)`
/// where `s_0` is the immediate left sibling and each following digest is the
/// left sibling one level further up.
///
/// A leaf can only be hashed once every leaf before it is known, which forces
/// the tree to be built strictly in order.
#[derive(Debug, Default)]
pub struct SequentialWorkHasher {
    pool: ContextPool<Sha256>,
}

impl SequentialWorkHasher {
    /// Create a hasher with an empty context pool.
    pub fn new() -> Self {
        Self::default()
    }
}

impl LeafHasher for SequentialWorkHasher {
    fn hash_into(&self, out: &mut Vec<u8>, value: &[u8], left_siblings: &[&[u8]]) {
        out.clear();
        self.pool.with(|ctx| {
            ctx.update(value);
            for sibling in left_siblings {
                ctx.update(sibling);
            }
            out.extend_from_slice(&ctx.finalize_reset());
        });
    }

    fn size(&self) -> usize {
        DIGEST_SIZE
    }

    fn is_sequential(&self) -> bool {
        true
    }
}
