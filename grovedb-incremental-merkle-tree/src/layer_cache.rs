use crate::{Error, Result};

/// Append-only storage of tree nodes, one sequence of fixed-size records per
/// tree level.
///
/// Level 0 holds leaf digests, level `h` the roots of complete subtrees of
/// `2^h` leaves, both in left-to-right order. Records are only ever appended,
/// so record `i` of level `h` is the node at index `i` of that level.
pub trait LayerCache {
    /// Append `node` to the end of `level`.
    fn append(&mut self, level: u32, node: &[u8]) -> Result<()>;

    /// Read record `index` of `level`.
    ///
    /// Returns [`Error::CacheIndexOutOfRange`] if the level holds fewer
    /// records.
    fn read_at(&mut self, level: u32, index: u64) -> Result<Vec<u8>>;

    /// Number of records stored for `level`.
    fn len(&mut self, level: u32) -> Result<u64>;

    /// Whether `level` holds no records.
    fn is_empty(&mut self, level: u32) -> Result<bool> {
        Ok(self.len(level)? == 0)
    }

    /// Size every record must have, if the cache enforces one.
    fn fixed_record_size(&self) -> Option<usize> {
        None
    }
}

impl<C: LayerCache + ?Sized> LayerCache for &mut C {
    fn append(&mut self, level: u32, node: &[u8]) -> Result<()> {
        (**self).append(level, node)
    }

    fn read_at(&mut self, level: u32, index: u64) -> Result<Vec<u8>> {
        (**self).read_at(level, index)
    }

    fn len(&mut self, level: u32) -> Result<u64> {
        (**self).len(level)
    }

    fn fixed_record_size(&self) -> Option<usize> {
        (**self).fixed_record_size()
    }
}

/// A cache that stores nothing. Every level is always empty.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpLayerCache;

impl LayerCache for NoOpLayerCache {
    fn append(&mut self, _level: u32, _node: &[u8]) -> Result<()> {
        Ok(())
    }

    fn read_at(&mut self, level: u32, index: u64) -> Result<Vec<u8>> {
        Err(Error::CacheIndexOutOfRange { level, index, len: 0 })
    }

    fn len(&mut self, _level: u32) -> Result<u64> {
        Ok(0)
    }
}
