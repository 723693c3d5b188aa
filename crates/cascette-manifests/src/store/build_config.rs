//! Build config text format
//!
//! Build configs are `key = value value ...` lines with `#` comments. The
//! manifest writers keep their locator keys here: `download`/`install` hold
//! the content hash and stored hash, `download-size`/`install-size` hold the
//! uncompressed and stored sizes.

use super::LocatorStore;
use crate::error::Result;
use crate::hash::ContentHash;
use std::collections::HashMap;
use std::fs;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;

/// Key order used when writing a config back out
const KEY_ORDER: &[&str] = &[
    "root",
    "install",
    "install-size",
    "download",
    "download-size",
    "size",
    "size-size",
    "encoding",
    "encoding-size",
    "patch",
    "patch-size",
    "patch-config",
    "build-name",
    "build-uid",
    "build-product",
];

/// Locator values recorded for one manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestLocation {
    /// Content hash (slot 0)
    pub content_hash: ContentHash,
    /// Stored hash (slot 1)
    pub stored_hash: Option<ContentHash>,
    /// Uncompressed size (slot 0 of the size key)
    pub size: Option<u64>,
    /// Stored size (slot 1 of the size key)
    pub stored_size: Option<u64>,
}

/// Build configuration key/value store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildConfig {
    entries: HashMap<String, Vec<String>>,
}

fn parse_line(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(" = ").or_else(|| {
        // "key =" with no values
        line.strip_suffix(" =").map(|key| (key, ""))
    })?;
    let key = key.trim();
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_');
    valid.then_some((key, value.trim()))
}

impl BuildConfig {
    /// Create an empty config
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config; malformed lines are skipped
    pub fn parse<R: Read>(reader: R) -> Result<Self> {
        let mut entries = HashMap::new();
        for line in BufReader::new(reader).lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = parse_line(line) {
                let values = value.split_whitespace().map(String::from).collect();
                entries.insert(key.to_string(), values);
            }
        }
        Ok(Self { entries })
    }

    /// Load a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::parse(fs::File::open(path)?)
    }

    /// Render the config, known keys first in canonical order
    pub fn build(&self) -> Vec<u8> {
        let mut output = Vec::new();
        let _ = writeln!(output, "# Build Configuration");
        let _ = writeln!(output);

        for key in KEY_ORDER {
            if let Some(values) = self.entries.get(*key) {
                let _ = writeln!(output, "{} = {}", key, values.join(" "));
            }
        }

        let mut remaining: Vec<_> = self
            .entries
            .keys()
            .filter(|key| !KEY_ORDER.contains(&key.as_str()))
            .collect();
        remaining.sort();
        for key in remaining {
            let _ = writeln!(output, "{} = {}", key, self.entries[key].join(" "));
        }

        output
    }

    /// Write the config to a file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.build())?;
        Ok(())
    }

    /// Locator values recorded for `manifest` ("download", "install")
    ///
    /// Returns `None` if the hash key is missing or slot 0 is not a valid hash.
    pub fn manifest(&self, manifest: &str) -> Option<ManifestLocation> {
        let hashes = self.entries.get(manifest)?;
        let content_hash = ContentHash::from_hex(hashes.first()?).ok()?;
        let stored_hash = hashes
            .get(1)
            .and_then(|hex| ContentHash::from_hex(hex).ok());

        let sizes = self.entries.get(&format!("{manifest}-size"));
        let size_at = |slot: usize| {
            sizes
                .and_then(|values| values.get(slot))
                .and_then(|value| value.parse().ok())
        };

        Some(ManifestLocation {
            content_hash,
            stored_hash,
            size: size_at(0),
            stored_size: size_at(1),
        })
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the config has no keys
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl LocatorStore for BuildConfig {
    fn get(&self, key: &str) -> Option<&[String]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    fn replace(&mut self, key: &str, values: Vec<String>) {
        self.entries.insert(key.to_string(), values);
    }
}
