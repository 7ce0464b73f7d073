//! Incremental Merkle tree accumulator.
//!
//! Leaves are added one at a time. Only one node per level is kept: the root
//! of the last complete left subtree still waiting for its right sibling.
//! Adding a leaf carries upward through the occupied levels like incrementing
//! a binary counter, so memory stays logarithmic in the number of leaves.
//!
//! When leaves to prove are configured up front, every merge where exactly one
//! side lies on a proven leaf's path records the other side as a proof
//! element. The proof is therefore complete as soon as the last leaf arrives
//! and never needs the discarded parts of the tree.

use std::{
    collections::{BTreeMap, BTreeSet, VecDeque},
    fmt,
    sync::Arc,
};

use tracing::{debug, trace};

use crate::{
    Error, LayerCache, Result, TreeConfig, TreeProof,
    hasher::{LeafHasher, NodeHasher},
    helper::tree_height,
};

/// One level of the accumulator.
#[derive(Debug, Clone, Default)]
struct Layer {
    /// Left subtree root waiting for its right sibling.
    parking: Option<Vec<u8>>,
    /// Whether the parked node lies on the path of a leaf to prove.
    on_path: bool,
}

/// An append-only binary Merkle tree that keeps only O(log n) nodes.
///
/// ```
/// use grovedb_incremental_merkle_tree::{Tree, TreeConfig, validate_proof, ValidatorConfig};
/// use std::collections::BTreeMap;
///
/// let config = TreeConfig::default().with_leaves_to_prove([2]);
/// let mut tree = Tree::new(config.clone());
/// for i in 0u8..5 {
///     tree.add(&[i; 32]);
/// }
/// let (root, proof) = tree.root_and_proof()?;
///
/// let leaves = BTreeMap::from([(2, vec![2u8; 32])]);
/// assert!(validate_proof(&root, &leaves, &proof, &ValidatorConfig::from(&config))?);
/// # Ok::<(), grovedb_incremental_merkle_tree::Error>(())
/// ```
pub struct Tree {
    hasher: Arc<dyn NodeHasher>,
    leaf_hasher: Arc<dyn LeafHasher>,
    min_height: u32,
    layers: Vec<Layer>,
    /// Configured leaves to prove that have not been added yet, ascending.
    pending: VecDeque<u64>,
    /// Every configured leaf to prove.
    proving: BTreeSet<u64>,
    proof: Vec<Vec<u8>>,
    leaf_count: u64,
    padding: Vec<u8>,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new(TreeConfig::default())
    }
}

impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree")
            .field("leaf_count", &self.leaf_count)
            .field("min_height", &self.min_height)
            .field("levels", &self.layers.len())
            .field("proof_len", &self.proof.len())
            .finish_non_exhaustive()
    }
}

impl Tree {
    /// Create an empty tree.
    pub fn new(config: TreeConfig) -> Self {
        debug!(
            node_size = config.hasher.size(),
            sequential = config.leaf_hasher.is_sequential(),
            min_height = config.min_height,
            leaves_to_prove = config.leaves_to_prove.len(),
            "creating incremental merkle tree"
        );
        let padding = vec![0u8; config.hasher.size()];
        Self {
            hasher: config.hasher,
            leaf_hasher: config.leaf_hasher,
            min_height: config.min_height,
            layers: Vec::new(),
            pending: config.leaves_to_prove.iter().copied().collect(),
            proving: config.leaves_to_prove,
            proof: Vec::new(),
            leaf_count: 0,
            padding,
        }
    }

    /// Rebuild a tree whose nodes were persisted with [`Tree::add_cached`].
    ///
    /// The leaf count is the number of records on level 0. For every level
    /// where the count has a set bit, the last record of that level is the
    /// parked left subtree.
    ///
    /// Proof elements emitted before the nodes were cached are not
    /// persisted, so every leaf to prove must lie at or after the restored
    /// leaf count.
    pub fn resume(config: TreeConfig, mut cache: impl LayerCache) -> Result<Self> {
        let leaf_count = cache.len(0)?;
        if let Some(first) = config
            .leaves_to_prove
            .first()
            .filter(|first| **first < leaf_count)
        {
            return Err(Error::InvalidInput(format!(
                "cannot prove leaf {first}: the resumed tree already holds {leaf_count} leaves"
            )));
        }

        let mut tree = Self::new(config);
        let levels = u64::BITS - leaf_count.leading_zeros();
        for level in 0..levels {
            let expected = leaf_count >> level;
            let stored = cache.len(level)?;
            if stored != expected {
                return Err(Error::CorruptCache(format!(
                    "level {level} holds {stored} nodes, {leaf_count} leaves need {expected}"
                )));
            }
            let parking = if expected & 1 == 1 {
                Some(cache.read_at(level, expected - 1)?)
            } else {
                None
            };
            tree.layers.push(Layer {
                parking,
                on_path: false,
            });
        }
        tree.leaf_count = leaf_count;
        debug!(leaf_count, levels, "resumed incremental merkle tree");
        Ok(tree)
    }

    /// Add the next leaf.
    pub fn add(&mut self, value: &[u8]) {
        self.push(value, None);
    }

    /// Add the next leaf and append every node it creates to `cache`.
    ///
    /// The leaf digest goes to level 0 and each parent formed by the carry to
    /// its own level. The tree itself is updated before the cache is written,
    /// so a cache error never affects the tree.
    ///
    /// Nodes that do not match the cache's
    /// [`fixed_record_size`](LayerCache::fixed_record_size) are rejected with
    /// [`Error::InvalidInput`] before anything is written, which leaves the
    /// cache one leaf behind but still resumable. Any other error may come
    /// after some levels were already appended. Such a cache is no longer
    /// consistent and has to be rebuilt from the leaves before it can be
    /// passed to [`Tree::resume`].
    pub fn add_cached(&mut self, value: &[u8], mut cache: impl LayerCache) -> Result<()> {
        let mut created = Vec::new();
        self.push(value, Some(&mut created));
        if let Some(record_size) = cache.fixed_record_size() {
            if let Some((level, node)) = created.iter().find(|(_, node)| node.len() != record_size)
            {
                return Err(Error::InvalidInput(format!(
                    "node of {} bytes on level {level} does not fit records of {record_size} bytes",
                    node.len()
                )));
            }
        }
        for (level, node) in &created {
            cache.append(*level, node)?;
        }
        Ok(())
    }

    fn push(&mut self, value: &[u8], mut created: Option<&mut Vec<(u32, Vec<u8>)>>) {
        let index = self.leaf_count;
        let mut on_path = false;
        if self.pending.front() == Some(&index) {
            self.pending.pop_front();
            on_path = true;
        }

        let mut node = Vec::with_capacity(self.leaf_hasher.size());
        if self.leaf_hasher.is_sequential() {
            // occupied levels are exactly the left siblings of the new leaf
            let siblings: Vec<&[u8]> = self
                .layers
                .iter()
                .filter_map(|layer| layer.parking.as_deref())
                .collect();
            self.leaf_hasher.hash_into(&mut node, value, &siblings);
        } else {
            self.leaf_hasher.hash_into(&mut node, value, &[]);
        }

        let mut height = 0;
        loop {
            if let Some(created) = created.as_mut() {
                created.push((height as u32, node.clone()));
            }
            if height == self.layers.len() {
                self.layers.push(Layer::default());
            }
            let layer = &mut self.layers[height];
            let Some(parked) = layer.parking.take() else {
                layer.parking = Some(node);
                layer.on_path = on_path;
                break;
            };
            let parked_on_path = std::mem::take(&mut layer.on_path);
            if parked_on_path && !on_path {
                trace!(index, height, "proof element: right sibling");
                self.proof.push(node.clone());
            } else if on_path && !parked_on_path {
                trace!(index, height, "proof element: left sibling");
                self.proof.push(parked.clone());
            }
            node = self.hasher.hash(&parked, &node);
            on_path |= parked_on_path;
            height += 1;
        }
        self.leaf_count += 1;
    }

    /// Current root. Shorthand for [`Tree::root_and_proof`] without the
    /// proof.
    pub fn root(&self) -> Result<Vec<u8>> {
        self.root_and_proof().map(|(root, _)| root)
    }

    /// Current root and the inclusion proof for every configured leaf added
    /// so far.
    ///
    /// Missing right subtrees are replaced with all-zero digests and the root
    /// is padded up to the minimum height. The tree is not modified, so more
    /// leaves can be added afterwards.
    pub fn root_and_proof(&self) -> Result<(Vec<u8>, Vec<Vec<u8>>)> {
        let Some(top) = self.layers.len().checked_sub(1) else {
            return Err(Error::EmptyTree);
        };
        let mut proof = self.proof.clone();
        let mut running: Option<(Vec<u8>, bool)> = None;

        for (height, layer) in self.layers.iter().enumerate() {
            running = match (layer.parking.as_ref(), running) {
                (Some(parked), None) if height == top => Some((parked.clone(), layer.on_path)),
                (Some(parked), Some((node, on_path))) => {
                    if layer.on_path && !on_path {
                        proof.push(node.clone());
                    } else if on_path && !layer.on_path {
                        proof.push(parked.clone());
                    }
                    Some((self.hasher.hash(parked, &node), on_path || layer.on_path))
                }
                (Some(parked), None) => {
                    if layer.on_path {
                        proof.push(self.padding.clone());
                    }
                    Some((self.hasher.hash(parked, &self.padding), layer.on_path))
                }
                (None, Some((node, on_path))) => {
                    if on_path {
                        proof.push(self.padding.clone());
                    }
                    Some((self.hasher.hash(&node, &self.padding), on_path))
                }
                (None, None) => None,
            };
        }

        let (mut root, on_path) = running.ok_or(Error::EmptyTree)?;
        for _ in tree_height(self.leaf_count)..self.min_height {
            if on_path {
                proof.push(self.padding.clone());
            }
            root = self.hasher.hash(&root, &self.padding);
        }
        Ok((root, proof))
    }

    /// Bundle the current root and proof with the values of the proven
    /// leaves.
    ///
    /// Every index must have been configured as a leaf to prove and must
    /// already be part of the tree.
    pub fn tree_proof(&self, leaves: BTreeMap<u64, Vec<u8>>) -> Result<TreeProof> {
        if leaves.is_empty() {
            return Err(Error::NoLeaves);
        }
        for index in leaves.keys() {
            if *index >= self.leaf_count {
                return Err(Error::InvalidInput(format!(
                    "leaf index {index} out of range (leaf_count={})",
                    self.leaf_count
                )));
            }
            if !self.proving.contains(index) {
                return Err(Error::InvalidInput(format!(
                    "leaf {index} was not configured to be proven"
                )));
            }
        }
        let (root, proof) = self.root_and_proof()?;
        Ok(TreeProof::new(root, leaves.into_iter().collect(), proof))
    }

    /// Size in bytes of the node hasher's digests.
    pub fn node_size(&self) -> usize {
        self.hasher.size()
    }

    /// Number of leaves added so far.
    pub fn leaf_count(&self) -> u64 {
        self.leaf_count
    }

    /// Number of levels, leaf level included, the root would currently have.
    pub fn height(&self) -> u32 {
        if self.leaf_count == 0 {
            return 0;
        }
        tree_height(self.leaf_count).max(self.min_height)
    }

    /// Configured minimum height.
    pub fn min_height(&self) -> u32 {
        self.min_height
    }
}
