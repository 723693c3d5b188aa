//! Install manifest entries

use crate::binary::{ManifestReader, ManifestWriter};
use crate::error::{ManifestError, Result};
use crate::hash::ContentHash;

/// One Install manifest row
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstallEntry {
    /// Install path
    pub name: String,
    /// Content hash of the file
    pub hash: ContentHash,
    /// Uncompressed size
    pub size: u32,
}

impl InstallEntry {
    /// Create an entry, rejecting sizes beyond the 32-bit field
    pub fn new(name: impl Into<String>, hash: ContentHash, size: u64) -> Result<Self> {
        let size = u32::try_from(size).map_err(|_| ManifestError::InstallSizeTooLarge(size))?;
        Ok(Self {
            name: name.into(),
            hash,
            size,
        })
    }

    /// Check if the name matches `name`, ignoring case
    pub fn matches(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }

    pub(crate) fn read(reader: &mut ManifestReader<'_>) -> Result<Self> {
        Ok(Self {
            name: reader.read_cstring()?,
            hash: reader.read_hash()?,
            size: reader.read_u32()?,
        })
    }

    pub(crate) fn write(&self, writer: &mut ManifestWriter) -> Result<()> {
        writer.write_cstring(&self.name)?;
        writer.write_hash(&self.hash)?;
        writer.write_u32(self.size)
    }
}
