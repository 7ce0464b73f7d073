//! File-backed layer cache.
//!
//! Every level is stored in its own file `layer_<level>.bin` inside one
//! directory, as a plain concatenation of fixed-size records.

use std::{
    collections::BTreeMap,
    fs::{self, File, OpenOptions},
    io::{self, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::{Error, LayerCache, Result};

const FILE_PREFIX: &str = "layer_";
const FILE_SUFFIX: &str = ".bin";

/// Layer cache persisting each level to a file in an existing directory.
#[derive(Debug)]
pub struct FileLayerCache {
    dir: PathBuf,
    record_size: usize,
    files: BTreeMap<u32, File>,
}

/// Parse the level out of a `layer_<level>.bin` file name.
fn parse_level(name: &str) -> Option<u32> {
    let digits = name.strip_prefix(FILE_PREFIX)?.strip_suffix(FILE_SUFFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn level_file_name(level: u32) -> String {
    format!("{FILE_PREFIX}{level}{FILE_SUFFIX}")
}

impl FileLayerCache {
    /// Open the cache stored in `dir`, picking up every existing layer file.
    ///
    /// The directory must already exist. `record_size` is the size of every
    /// stored node, normally the node hasher's digest size.
    pub fn open(dir: impl AsRef<Path>, record_size: usize) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        if record_size == 0 {
            return Err(Error::InvalidInput("record size must not be zero".into()));
        }
        let metadata = fs::metadata(&dir)?;
        if !metadata.is_dir() {
            return Err(Error::InvalidInput(format!(
                "{} is not a directory",
                dir.display()
            )));
        }

        let mut files = BTreeMap::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let Some(level) = entry.file_name().to_str().and_then(parse_level) else {
                continue;
            };
            files.insert(level, Self::open_file(&entry.path())?);
        }
        debug!(dir = %dir.display(), levels = files.len(), record_size, "opened layer cache");

        Ok(Self {
            dir,
            record_size,
            files,
        })
    }

    /// Directory holding the layer files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Size in bytes of every record.
    pub fn record_size(&self) -> usize {
        self.record_size
    }

    /// Flush and sync every open layer file to disk.
    pub fn sync(&mut self) -> Result<()> {
        for file in self.files.values_mut() {
            file.flush()?;
            file.sync_all()?;
        }
        Ok(())
    }

    fn open_file(path: &Path) -> io::Result<File> {
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
    }

    fn file(&mut self, level: u32) -> Result<&mut File> {
        if !self.files.contains_key(&level) {
            let file = Self::open_file(&self.dir.join(level_file_name(level)))?;
            self.files.insert(level, file);
        }
        self.files
            .get_mut(&level)
            .ok_or_else(|| Error::CorruptCache(format!("layer {level} file is not open")))
    }
}

impl LayerCache for FileLayerCache {
    fn append(&mut self, level: u32, node: &[u8]) -> Result<()> {
        if node.len() != self.record_size {
            return Err(Error::InvalidInput(format!(
                "node of {} bytes does not fit records of {} bytes",
                node.len(),
                self.record_size
            )));
        }
        let file = self.file(level)?;
        file.seek(SeekFrom::End(0))?;
        file.write_all(node)?;
        Ok(())
    }

    fn read_at(&mut self, level: u32, index: u64) -> Result<Vec<u8>> {
        let len = self.len(level)?;
        if index >= len {
            return Err(Error::CacheIndexOutOfRange { level, index, len });
        }
        let record_size = self.record_size;
        let file = self.file(level)?;
        file.seek(SeekFrom::Start(index * record_size as u64))?;
        let mut node = vec![0u8; record_size];
        file.read_exact(&mut node)?;
        Ok(node)
    }

    fn len(&mut self, level: u32) -> Result<u64> {
        if !self.files.contains_key(&level) {
            return Ok(0);
        }
        let record_size = self.record_size as u64;
        let size = self.file(level)?.metadata()?.len();
        if size % record_size != 0 {
            return Err(Error::CorruptCache(format!(
                "layer {level} holds {size} bytes, not a multiple of the {record_size} byte \
                 record size"
            )));
        }
        Ok(size / record_size)
    }

    fn fixed_record_size(&self) -> Option<usize> {
        Some(self.record_size)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("layer_0.bin"), Some(0));
        assert_eq!(parse_level("layer_17.bin"), Some(17));
        assert_eq!(parse_level("layer_.bin"), None);
        assert_eq!(parse_level("layer_-1.bin"), None);
        assert_eq!(parse_level("layer_+1.bin"), None);
        assert_eq!(parse_level("layer_1.bin.tmp"), None);
        assert_eq!(parse_level("other_1.bin"), None);
    }

    #[test]
    fn test_append_read_len() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = FileLayerCache::open(dir.path(), 4).unwrap();
        assert_eq!(cache.len(0).unwrap(), 0);

        cache.append(0, &[1, 1, 1, 1]).unwrap();
        cache.append(0, &[2, 2, 2, 2]).unwrap();
        cache.append(2, &[9, 9, 9, 9]).unwrap();

        assert_eq!(cache.len(0).unwrap(), 2);
        assert_eq!(cache.len(1).unwrap(), 0);
        assert_eq!(cache.len(2).unwrap(), 1);
        assert_eq!(cache.read_at(0, 1).unwrap(), vec![2, 2, 2, 2]);
        assert_eq!(cache.read_at(0, 0).unwrap(), vec![1, 1, 1, 1]);
        // appends after a read still land at the end
        cache.append(0, &[3, 3, 3, 3]).unwrap();
        assert_eq!(cache.read_at(0, 2).unwrap(), vec![3, 3, 3, 3]);
        assert_matches!(
            cache.read_at(0, 3),
            Err(Error::CacheIndexOutOfRange {
                level: 0,
                index: 3,
                len: 3
            })
        );
        assert!(dir.path().join("layer_0.bin").is_file());
        assert!(dir.path().join("layer_2.bin").is_file());
    }

    #[test]
    fn test_reopen_picks_up_existing_layers() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut cache = FileLayerCache::open(dir.path(), 2).unwrap();
            cache.append(0, &[1, 2]).unwrap();
            cache.append(3, &[3, 4]).unwrap();
            cache.sync().unwrap();
        }
        fs::write(dir.path().join("unrelated.txt"), b"ignored").unwrap();

        let mut cache = FileLayerCache::open(dir.path(), 2).unwrap();
        assert_eq!(cache.len(0).unwrap(), 1);
        assert_eq!(cache.read_at(3, 0).unwrap(), vec![3, 4]);
    }

    #[test]
    fn test_rejects_bad_input() {
        let dir = tempfile::tempdir().unwrap();
        assert_matches!(
            FileLayerCache::open(dir.path().join("missing"), 32),
            Err(Error::Io(_))
        );
        let file = dir.path().join("plain");
        fs::write(&file, b"x").unwrap();
        assert_matches!(FileLayerCache::open(&file, 32), Err(Error::InvalidInput(_)));
        assert_matches!(FileLayerCache::open(dir.path(), 0), Err(Error::InvalidInput(_)));

        let mut cache = FileLayerCache::open(dir.path(), 32).unwrap();
        assert_matches!(cache.append(0, &[0; 31]), Err(Error::InvalidInput(_)));
    }

    #[test]
    fn test_truncated_layer_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("layer_1.bin"), [0u8; 33]).unwrap();
        let mut cache = FileLayerCache::open(dir.path(), 32).unwrap();
        assert_matches!(cache.len(1), Err(Error::CorruptCache(_)));
    }
}
