//! Serializable inclusion proof bundle.

use std::collections::BTreeMap;

use bincode::{Decode, Encode};

use crate::{Error, Result, ValidatorConfig, validate_proof};

/// Upper bound on the encoded size accepted by [`TreeProof::decode_from_slice`].
const MAX_DECODE_BYTES: usize = 100 * 1024 * 1024;

/// A self-contained inclusion proof: the claimed root, the proven leaves and
/// the proof elements in emission order.
///
/// Produced by [`Tree::tree_proof`](crate::Tree::tree_proof). Hashing
/// parameters are not part of the bundle and have to be agreed on out of
/// band.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct TreeProof {
    root: Vec<u8>,
    leaves: Vec<(u64, Vec<u8>)>,
    proof_items: Vec<Vec<u8>>,
}

impl TreeProof {
    /// Create a proof from its constituent parts.
    pub fn new(root: Vec<u8>, leaves: Vec<(u64, Vec<u8>)>, proof_items: Vec<Vec<u8>>) -> Self {
        Self {
            root,
            leaves,
            proof_items,
        }
    }

    /// The root the proof claims to rebuild.
    pub fn root(&self) -> &[u8] {
        &self.root
    }

    /// The proved leaves as `(leaf_index, value_bytes)` pairs.
    pub fn leaves(&self) -> &[(u64, Vec<u8>)] {
        &self.leaves
    }

    /// The proof elements, in the order the tree emitted them.
    pub fn proof_items(&self) -> &[Vec<u8>] {
        &self.proof_items
    }

    /// Check that the leaves and proof items rebuild the contained root.
    ///
    /// Only shows internal consistency. Use [`TreeProof::verify_against`] to
    /// tie the proof to a trusted root.
    pub fn verify(&self, config: &ValidatorConfig) -> Result<bool> {
        let mut leaves = BTreeMap::new();
        for (index, value) in &self.leaves {
            if leaves.insert(*index, value.clone()).is_some() {
                return Err(Error::InvalidData(format!("duplicate leaf index {index}")));
            }
        }
        validate_proof(&self.root, &leaves, &self.proof_items, config)
    }

    /// Check the proof against a trusted root.
    pub fn verify_against(&self, expected_root: &[u8], config: &ValidatorConfig) -> Result<bool> {
        if self.root != expected_root {
            return Ok(false);
        }
        self.verify(config)
    }

    /// Serialize this proof to bytes.
    pub fn encode_to_vec(&self) -> Result<Vec<u8>> {
        let config = bincode::config::standard().with_big_endian();
        bincode::encode_to_vec(self, config)
            .map_err(|e| Error::InvalidData(format!("failed to encode TreeProof: {}", e)))
    }

    /// Deserialize a proof from bytes.
    ///
    /// The bincode size limit is capped at 100 MiB so crafted length headers
    /// cannot trigger huge allocations.
    pub fn decode_from_slice(bytes: &[u8]) -> Result<Self> {
        let config = bincode::config::standard()
            .with_big_endian()
            .with_limit::<MAX_DECODE_BYTES>();
        let (proof, _) = bincode::decode_from_slice(bytes, config)
            .map_err(|e| Error::InvalidData(format!("failed to decode TreeProof: {}", e)))?;
        Ok(proof)
    }
}
