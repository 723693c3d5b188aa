//! Install manifest header

use crate::binary::{ManifestReader, ManifestWriter};
use crate::error::{ManifestError, Result};

/// Magic bytes "IN"
pub const INSTALL_MAGIC: [u8; 2] = *b"IN";

const DIGEST_SIZE: u8 = 16;

/// Install manifest header
///
/// Wire layout: magic, version, digest size, tag count (u16 BE), entry count
/// (u32 BE).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstallHeader {
    /// Format version
    pub version: u8,
    /// Digest size of each entry (always 16)
    pub hash_size: u8,
    /// Number of tags
    pub tag_count: u16,
    /// Number of entries
    pub entry_count: u32,
}

impl InstallHeader {
    /// Only supported version
    pub const VERSION: u8 = 1;
    /// Serialized size
    pub const SIZE: usize = 10;

    pub(crate) fn read(reader: &mut ManifestReader<'_>) -> Result<Self> {
        let magic = reader.read_array::<2>()?;
        if magic != INSTALL_MAGIC {
            return Err(ManifestError::InvalidMagic {
                manifest: super::INSTALL_MANIFEST,
                expected: INSTALL_MAGIC,
                actual: magic,
            });
        }

        let version = reader.read_u8()?;
        if version != Self::VERSION {
            return Err(ManifestError::UnsupportedVersion {
                manifest: super::INSTALL_MANIFEST,
                version,
            });
        }

        let hash_size = reader.read_u8()?;
        if hash_size != DIGEST_SIZE {
            return Err(ManifestError::InvalidDigestSize(hash_size));
        }

        Ok(Self {
            version,
            hash_size,
            tag_count: reader.read_u16()?,
            entry_count: reader.read_u32()?,
        })
    }

    pub(crate) fn write(&self, writer: &mut ManifestWriter) -> Result<()> {
        writer.write_bytes(&INSTALL_MAGIC)?;
        writer.write_u8(self.version)?;
        writer.write_u8(self.hash_size)?;
        writer.write_u16(self.tag_count)?;
        writer.write_u32(self.entry_count)
    }
}

impl Default for InstallHeader {
    fn default() -> Self {
        Self {
            version: Self::VERSION,
            hash_size: DIGEST_SIZE,
            tag_count: 0,
            entry_count: 0,
        }
    }
}
