use std::{collections::BTreeSet, fmt, sync::Arc};

use crate::hasher::{LeafHasher, NodeHasher, Sha256Hasher, ValueLeaves};

/// Construction parameters for a [`Tree`](crate::Tree).
///
/// The default builds a plain SHA-256 tree over 32-byte leaf values without
/// tracking any proof.
#[derive(Clone)]
pub struct TreeConfig {
    /// Combines two child digests into their parent.
    pub hasher: Arc<dyn NodeHasher>,
    /// Derives the level-0 digest of each added value.
    pub leaf_hasher: Arc<dyn LeafHasher>,
    /// Minimum number of levels, leaf level included, of the finished tree.
    /// Shorter trees are padded upward with zero digests.
    pub min_height: u32,
    /// Leaf indices whose inclusion proof is collected while the tree is
    /// built. Empty disables proof bookkeeping.
    pub leaves_to_prove: BTreeSet<u64>,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            hasher: Arc::new(Sha256Hasher::new()),
            leaf_hasher: Arc::new(ValueLeaves::default()),
            min_height: 0,
            leaves_to_prove: BTreeSet::new(),
        }
    }
}

impl TreeConfig {
    /// Replace the node hasher.
    pub fn with_hasher(mut self, hasher: Arc<dyn NodeHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    /// Replace the leaf hasher.
    pub fn with_leaf_hasher(mut self, leaf_hasher: Arc<dyn LeafHasher>) -> Self {
        self.leaf_hasher = leaf_hasher;
        self
    }

    /// Set the minimum tree height.
    pub fn with_min_height(mut self, min_height: u32) -> Self {
        self.min_height = min_height;
        self
    }

    /// Also collect an inclusion proof for `index`.
    pub fn with_leaf_to_prove(mut self, index: u64) -> Self {
        self.leaves_to_prove.insert(index);
        self
    }

    /// Also collect an inclusion proof for the given leaf indices. Repeated
    /// calls add to the set.
    pub fn with_leaves_to_prove(mut self, leaves: impl IntoIterator<Item = u64>) -> Self {
        self.leaves_to_prove.extend(leaves);
        self
    }
}

impl fmt::Debug for TreeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeConfig")
            .field("node_size", &self.hasher.size())
            .field("leaf_size", &self.leaf_hasher.size())
            .field("sequential", &self.leaf_hasher.is_sequential())
            .field("min_height", &self.min_height)
            .field("leaves_to_prove", &self.leaves_to_prove)
            .finish()
    }
}

/// Hashing parameters for [`validate_proof`](crate::validate_proof). They
/// must match the ones the proof was built with.
#[derive(Clone)]
pub struct ValidatorConfig {
    /// Node hasher the tree was built with.
    pub hasher: Arc<dyn NodeHasher>,
    /// Leaf hasher the tree was built with.
    pub leaf_hasher: Arc<dyn LeafHasher>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            hasher: Arc::new(Sha256Hasher::new()),
            leaf_hasher: Arc::new(ValueLeaves::default()),
        }
    }
}

impl ValidatorConfig {
    /// Replace the node hasher.
    pub fn with_hasher(mut self, hasher: Arc<dyn NodeHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    /// Replace the leaf hasher.
    pub fn with_leaf_hasher(mut self, leaf_hasher: Arc<dyn LeafHasher>) -> Self {
        self.leaf_hasher = leaf_hasher;
        self
    }
}

impl From<&TreeConfig> for ValidatorConfig {
    fn from(config: &TreeConfig) -> Self {
        Self {
            hasher: Arc::clone(&config.hasher),
            leaf_hasher: Arc::clone(&config.leaf_hasher),
        }
    }
}

impl fmt::Debug for ValidatorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorConfig")
            .field("node_size", &self.hasher.size())
            .field("sequential", &self.leaf_hasher.is_sequential())
            .finish()
    }
}
