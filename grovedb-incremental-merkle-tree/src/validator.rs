//! Multi-leaf proof validation.
//!
//! The root is rebuilt by walking up from the smallest proven leaf. At every
//! height the sibling of the current node is either the root of a subtree
//! that contains the next proven leaf, computed recursively, or the next
//! element of the proof. This consumes the proof in exactly the order
//! [`Tree`](crate::Tree) emits it.
//!
//! Sequential-work leaves need the digests of all their left siblings before
//! they can be hashed, and some of those only appear later in the proof. In
//! that mode a first pass runs the same walk without hashing to learn the tree
//! position of every proof element.

use std::{
    collections::{BTreeMap, HashMap, btree_map},
    iter::Peekable,
};

use tracing::debug;

use crate::{
    Error, Result, ValidatorConfig,
    hasher::{LeafHasher, NodeHasher},
    helper::{ancestor_index, is_left_child, left_sibling_heights, sibling_index},
};

/// Tree position of a node: `(height, index at that height)`.
type Position = (u32, u64);

/// Check that `leaves` and `proof` rebuild `root`.
///
/// `leaves` maps leaf indices to their raw values. Returns `Ok(false)` if the
/// rebuilt root differs, [`Error::NoLeaves`] for an empty map and
/// [`Error::ShortProof`] if the proof ends before the walk reaches the root.
/// Proof elements left over once the root position is reached are hashed in as
/// further levels, so such a proof never matches.
///
/// A walk whose position is already 0 when the proof runs out is taken to be
/// at the root. Truncating the proof of leaf 0, or dropping levels above the
/// subtree holding all proven leaves, therefore returns `Ok(false)` rather
/// than [`Error::ShortProof`].
pub fn validate_proof(
    root: &[u8],
    leaves: &BTreeMap<u64, Vec<u8>>,
    proof: &[Vec<u8>],
    config: &ValidatorConfig,
) -> Result<bool> {
    if leaves.is_empty() {
        return Err(Error::NoLeaves);
    }

    let sequential = config.leaf_hasher.is_sequential();
    let proof_positions = if sequential {
        let mut layout = ProofLayout {
            indices: leaves.keys().copied().peekable(),
            cursor: 0,
            proof_len: proof.len(),
            left_siblings: HashMap::new(),
        };
        layout.subtree(None)?;
        layout.left_siblings
    } else {
        HashMap::new()
    };

    let mut walk = Walk {
        hasher: config.hasher.as_ref(),
        leaf_hasher: config.leaf_hasher.as_ref(),
        sequential,
        leaves: leaves.iter().peekable(),
        proof,
        cursor: 0,
        proof_positions,
        computed: HashMap::new(),
    };
    let computed_root = walk.subtree_root(None)?;
    let valid = computed_root == root;
    debug!(
        leaves = leaves.len(),
        proof_len = proof.len(),
        sequential,
        valid,
        "validated merkle proof"
    );
    Ok(valid)
}

/// Structural pass over the proof: same control flow as [`Walk`], no hashing.
struct ProofLayout<I: Iterator<Item = u64>> {
    indices: Peekable<I>,
    cursor: usize,
    proof_len: usize,
    /// Proof elements that are left siblings, by position.
    left_siblings: HashMap<Position, usize>,
}

impl<I: Iterator<Item = u64>> ProofLayout<I> {
    fn subtree(&mut self, stop_at: Option<u32>) -> Result<()> {
        let index = self.indices.next().ok_or(Error::NoLeaves)?;
        let mut height = 0u32;
        loop {
            if stop_at == Some(height) {
                return Ok(());
            }
            let pos = ancestor_index(index, height);
            let next = self.indices.peek().copied();
            if self.cursor == self.proof_len && next.is_none() {
                return if pos == 0 {
                    Ok(())
                } else {
                    Err(Error::ShortProof)
                };
            }
            if next.is_some_and(|next| ancestor_index(next, height) == sibling_index(pos)) {
                self.subtree(Some(height))?;
            } else {
                if self.cursor == self.proof_len {
                    return Err(Error::ShortProof);
                }
                if !is_left_child(pos) {
                    self.left_siblings
                        .insert((height, sibling_index(pos)), self.cursor);
                }
                self.cursor += 1;
            }
            height += 1;
        }
    }
}

struct Walk<'a> {
    hasher: &'a dyn NodeHasher,
    leaf_hasher: &'a dyn LeafHasher,
    sequential: bool,
    leaves: Peekable<btree_map::Iter<'a, u64, Vec<u8>>>,
    proof: &'a [Vec<u8>],
    cursor: usize,
    /// Sequential mode: proof elements that are left siblings, by position.
    proof_positions: HashMap<Position, usize>,
    /// Sequential mode: left subtree roots computed before descending into
    /// their right sibling.
    computed: HashMap<Position, Vec<u8>>,
}

impl Walk<'_> {
    /// Rebuild the root of the subtree holding the next leaf, up to height
    /// `stop_at` or, without a bound, until proof and leaves are used up.
    fn subtree_root(&mut self, stop_at: Option<u32>) -> Result<Vec<u8>> {
        let (&index, value) = self.leaves.next().ok_or(Error::NoLeaves)?;
        let mut node = self.leaf_hash(index, value)?;
        let mut height = 0u32;
        loop {
            if stop_at == Some(height) {
                return Ok(node);
            }
            let pos = ancestor_index(index, height);
            let next = self.leaves.peek().map(|(next, _)| **next);
            if self.cursor == self.proof.len() && next.is_none() {
                return if pos == 0 {
                    Ok(node)
                } else {
                    Err(Error::ShortProof)
                };
            }
            if next.is_some_and(|next| ancestor_index(next, height) == sibling_index(pos)) {
                if self.sequential {
                    self.computed.insert((height, pos), node.clone());
                }
                let right = self.subtree_root(Some(height))?;
                node = self.hasher.hash(&node, &right);
            } else {
                let proof = self.proof;
                let sibling = proof.get(self.cursor).ok_or(Error::ShortProof)?;
                self.cursor += 1;
                node = if is_left_child(pos) {
                    self.hasher.hash(&node, sibling)
                } else {
                    self.hasher.hash(sibling, &node)
                };
            }
            height += 1;
        }
    }

    fn leaf_hash(&self, index: u64, value: &[u8]) -> Result<Vec<u8>> {
        if !self.sequential {
            return Ok(self.leaf_hasher.hash(value, &[]));
        }
        let siblings = left_sibling_heights(index)
            .map(|height| {
                let pos = (height, sibling_index(ancestor_index(index, height)));
                self.left_sibling(pos).ok_or(Error::ShortProof)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(self.leaf_hasher.hash(value, &siblings))
    }

    fn left_sibling(&self, pos: Position) -> Option<&[u8]> {
        self.computed.get(&pos).map(Vec::as_slice).or_else(|| {
            self.proof_positions
                .get(&pos)
                .and_then(|i| self.proof.get(*i))
                .map(Vec::as_slice)
        })
    }
}
