//! Download manifest entries

use super::header::DownloadHeader;
use crate::binary::{FileSize40, ManifestReader, ManifestWriter};
use crate::error::Result;
use crate::hash::ContentHash;

/// Stage of high-priority entries, fetched first
pub const HIGH_PRIORITY_STAGE: u8 = 0;
/// Stage of normal entries
pub const NORMAL_STAGE: u8 = 1;

/// One Download manifest row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DownloadEntry {
    /// Stored hash of the content
    pub hash: ContentHash,
    /// Stored size
    pub size: FileSize40,
    /// Priority stage (0 high, 1 normal, higher reserved)
    pub stage: u8,
    /// Opaque trailing bytes, carried through unchanged
    pub unknown: [u8; 4],
    /// Leading flag byte, present from version 2
    pub version_flag: Option<u8>,
}

impl DownloadEntry {
    /// Create an entry with zeroed opaque fields
    pub fn new(hash: ContentHash, size: u64, stage: u8) -> Result<Self> {
        Ok(Self {
            hash,
            size: FileSize40::new(size)?,
            stage,
            unknown: [0; 4],
            version_flag: None,
        })
    }

    /// Check if the entry is in the high-priority stage
    pub fn is_high_priority(&self) -> bool {
        self.stage == HIGH_PRIORITY_STAGE
    }

    /// Serialized size for a header version
    pub fn wire_size(header: &DownloadHeader) -> usize {
        let flag = usize::from(header.has_entry_flags());
        flag + ContentHash::SIZE + 5 + 1 + 4
    }

    pub(crate) fn read(reader: &mut ManifestReader<'_>, header: &DownloadHeader) -> Result<Self> {
        let version_flag = if header.has_entry_flags() {
            Some(reader.read_u8()?)
        } else {
            None
        };
        Ok(Self {
            hash: reader.read_hash()?,
            size: reader.read_u40()?,
            stage: reader.read_u8()?,
            unknown: reader.read_array::<4>()?,
            version_flag,
        })
    }

    pub(crate) fn write(&self, writer: &mut ManifestWriter, header: &DownloadHeader) -> Result<()> {
        if header.has_entry_flags() {
            writer.write_u8(self.version_flag.unwrap_or_default())?;
        }
        writer.write_hash(&self.hash)?;
        writer.write_u40(self.size.as_u64())?;
        writer.write_u8(self.stage)?;
        writer.write_bytes(&self.unknown)
    }
}
