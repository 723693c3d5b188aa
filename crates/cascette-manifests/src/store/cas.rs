//! Reference CAS writers backed by BLTE containers

use super::{CasRecord, CasWriter, LOCAL_HEADER_SIZE};
use crate::blte;
use crate::encoding::Section;
use crate::error::Result;
use crate::hash::ContentHash;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

fn encode_record(sections: &[Section]) -> Result<(CasRecord, Vec<u8>)> {
    let encoded = blte::encode(sections)?;
    let record = CasRecord {
        stored_hash: encoded.header_hash,
        content_hash: ContentHash::from_parts(sections.iter().map(|s| s.data.as_slice())),
        compressed_size: encoded.data.len() as u64 + LOCAL_HEADER_SIZE,
        decompressed_size: sections.iter().map(|s| s.data.len() as u64).sum(),
        path: None,
        high_priority: false,
    };
    Ok((record, encoded.data))
}

/// CAS writer that keeps containers in memory, keyed by stored hash
#[derive(Debug, Default)]
pub struct MemoryCasWriter {
    containers: HashMap<ContentHash, Vec<u8>>,
}

impl MemoryCasWriter {
    /// Create an empty writer
    pub fn new() -> Self {
        Self::default()
    }

    /// Container bytes for a stored hash
    pub fn get(&self, stored_hash: &ContentHash) -> Option<&[u8]> {
        self.containers.get(stored_hash).map(Vec::as_slice)
    }

    /// Check if a container is stored
    pub fn contains(&self, stored_hash: &ContentHash) -> bool {
        self.containers.contains_key(stored_hash)
    }

    /// Number of stored containers
    pub fn len(&self) -> usize {
        self.containers.len()
    }

    /// Check if nothing is stored
    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }
}

impl CasWriter for MemoryCasWriter {
    fn write(&mut self, sections: &[Section]) -> Result<CasRecord> {
        let (record, data) = encode_record(sections)?;
        self.containers.insert(record.stored_hash, data);
        Ok(record)
    }

    fn remove_artifact(&mut self, stored_hash: &ContentHash) -> Result<bool> {
        Ok(self.containers.remove(stored_hash).is_some())
    }
}

/// CAS writer that stores containers as loose files under an output root
///
/// A container with stored hash `abcdef...` lands at
/// `<root>/data/ab/cd/abcdef...`.
#[derive(Debug, Clone)]
pub struct DirectoryCasWriter {
    root: PathBuf,
}

impl DirectoryCasWriter {
    /// Create a writer rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Output root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path a container with `stored_hash` is written to
    pub fn path_for(&self, stored_hash: &ContentHash) -> PathBuf {
        let hex = stored_hash.to_hex();
        self.root
            .join("data")
            .join(&hex[0..2])
            .join(&hex[2..4])
            .join(&hex)
    }

    /// Read a stored container back
    pub fn read(&self, stored_hash: &ContentHash) -> Result<Vec<u8>> {
        Ok(fs::read(self.path_for(stored_hash))?)
    }
}

impl CasWriter for DirectoryCasWriter {
    fn write(&mut self, sections: &[Section]) -> Result<CasRecord> {
        let (record, data) = encode_record(sections)?;
        let path = self.path_for(&record.stored_hash);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, &data)?;
        debug!("Wrote {} byte container to {}", data.len(), path.display());
        Ok(record)
    }

    fn artifact_path(&self, stored_hash: &ContentHash) -> Option<PathBuf> {
        Some(self.path_for(stored_hash))
    }
}
