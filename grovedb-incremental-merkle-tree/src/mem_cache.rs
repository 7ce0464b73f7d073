use std::collections::BTreeMap;

use crate::{Error, LayerCache, Result};

/// In-memory layer cache backed by a `BTreeMap` of levels.
///
/// Useful for tests and ephemeral computations.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MemLayerCache(BTreeMap<u32, Vec<Vec<u8>>>);

impl MemLayerCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// All records of `level`, oldest first.
    pub fn level(&self, level: u32) -> &[Vec<u8>] {
        self.0.get(&level).map(Vec::as_slice).unwrap_or_default()
    }

    /// Number of levels holding at least one record.
    pub fn levels(&self) -> usize {
        self.0.len()
    }
}

impl LayerCache for MemLayerCache {
    fn append(&mut self, level: u32, node: &[u8]) -> Result<()> {
        self.0.entry(level).or_default().push(node.to_vec());
        Ok(())
    }

    fn read_at(&mut self, level: u32, index: u64) -> Result<Vec<u8>> {
        let records = self.level(level);
        usize::try_from(index)
            .ok()
            .and_then(|i| records.get(i))
            .cloned()
            .ok_or(Error::CacheIndexOutOfRange {
                level,
                index,
                len: records.len() as u64,
            })
    }

    fn len(&mut self, level: u32) -> Result<u64> {
        Ok(self.level(level).len() as u64)
    }
}
