//! Collaborators the manifest codecs are handed at construction or write time
//!
//! - [`CasWriter`] turns encoded sections into a stored container
//! - [`ContentIndex`] answers whether a content hash is already registered
//! - [`LocatorStore`] holds the build locator keys (`download`, `install-size`, ...)
//!
//! None of these are reached through globals, so each codec can be exercised
//! against in-memory fakes.

mod build_config;
mod cas;

pub use build_config::{BuildConfig, ManifestLocation};
pub use cas::{DirectoryCasWriter, MemoryCasWriter};

use crate::encoding::Section;
use crate::error::Result;
use crate::hash::ContentHash;
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::hash::BuildHasher;
use std::path::PathBuf;

/// Size of the local archive record header that precedes every stored
/// container (digest, size, flags and two checksums)
pub const LOCAL_HEADER_SIZE: u64 = 30;

/// Result of storing content through a [`CasWriter`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CasRecord {
    /// Stored key of the container
    pub stored_hash: ContentHash,
    /// Content key of the uncompressed bytes
    pub content_hash: ContentHash,
    /// Stored record size: the container plus [`LOCAL_HEADER_SIZE`]
    pub compressed_size: u64,
    /// Uncompressed size in bytes
    pub decompressed_size: u64,
    /// Logical path of the file, when known
    pub path: Option<String>,
    /// Whether the content should be fetched first
    pub high_priority: bool,
}

impl CasRecord {
    /// Size of the container alone, without the local archive header
    pub fn container_size(&self) -> u64 {
        self.compressed_size.saturating_sub(LOCAL_HEADER_SIZE)
    }

    /// Attach a logical path
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Mark the record as high priority
    #[must_use]
    pub fn with_high_priority(mut self, high_priority: bool) -> Self {
        self.high_priority = high_priority;
        self
    }
}

/// Content-addressed storage write path
pub trait CasWriter {
    /// Encode `sections` into one container and store it
    fn write(&mut self, sections: &[Section]) -> Result<CasRecord>;

    /// On-disk location of a stored container, if the writer uses files
    fn artifact_path(&self, _stored_hash: &ContentHash) -> Option<PathBuf> {
        None
    }

    /// Remove a previously stored container
    ///
    /// Returns true if something was removed.
    fn remove_artifact(&mut self, stored_hash: &ContentHash) -> Result<bool> {
        match self.artifact_path(stored_hash) {
            Some(path) if path.exists() => {
                std::fs::remove_file(path)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// Lookup of already registered content
pub trait ContentIndex {
    /// Check if `hash` is already registered
    fn contains(&self, hash: &ContentHash) -> bool;
}

impl<T: ContentIndex + ?Sized> ContentIndex for &T {
    fn contains(&self, hash: &ContentHash) -> bool {
        (**self).contains(hash)
    }
}

impl<T: ContentIndex + ?Sized> ContentIndex for RefCell<T> {
    fn contains(&self, hash: &ContentHash) -> bool {
        self.borrow().contains(hash)
    }
}

impl<S: BuildHasher> ContentIndex for HashSet<ContentHash, S> {
    fn contains(&self, hash: &ContentHash) -> bool {
        HashSet::contains(self, hash)
    }
}

impl<V, S: BuildHasher> ContentIndex for HashMap<ContentHash, V, S> {
    fn contains(&self, hash: &ContentHash) -> bool {
        self.contains_key(hash)
    }
}

impl ContentIndex for BTreeSet<ContentHash> {
    fn contains(&self, hash: &ContentHash) -> bool {
        BTreeSet::contains(self, hash)
    }
}

/// Build locator key/value store
///
/// Every key maps to an ordered list of values. Size and hash keys use slot 0
/// for the uncompressed form and slot 1 for the stored form.
pub trait LocatorStore {
    /// All values recorded for `key`
    fn get(&self, key: &str) -> Option<&[String]>;

    /// Replace all values of `key`
    fn replace(&mut self, key: &str, values: Vec<String>);

    /// Value at `slot` of `key`
    fn get_slot(&self, key: &str, slot: usize) -> Option<&str> {
        self.get(key)?.get(slot).map(String::as_str)
    }

    /// Set one slot, padding earlier slots with empty values
    fn set(&mut self, key: &str, value: String, slot: usize) {
        let mut values = self.get(key).map(<[String]>::to_vec).unwrap_or_default();
        if values.len() <= slot {
            values.resize(slot + 1, String::new());
        }
        values[slot] = value;
        self.replace(key, values);
    }

    /// Set slots 0 and 1 together in a single update
    fn set_pair(&mut self, key: &str, first: String, second: String) {
        let mut values = self.get(key).map(<[String]>::to_vec).unwrap_or_default();
        if values.len() < 2 {
            values.resize(2, String::new());
        }
        values[0] = first;
        values[1] = second;
        self.replace(key, values);
    }
}

impl<S: BuildHasher> LocatorStore for HashMap<String, Vec<String>, S> {
    fn get(&self, key: &str) -> Option<&[String]> {
        HashMap::get(self, key).map(Vec::as_slice)
    }

    fn replace(&mut self, key: &str, values: Vec<String>) {
        self.insert(key.to_string(), values);
    }
}
