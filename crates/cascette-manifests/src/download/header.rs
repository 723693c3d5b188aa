//! Download manifest header

use crate::binary::{ManifestReader, ManifestWriter};
use crate::error::{ManifestError, Result};

/// Magic bytes "DL"
pub const DOWNLOAD_MAGIC: [u8; 2] = *b"DL";

const DIGEST_SIZE: u8 = 16;

/// Download manifest header
///
/// Wire layout: magic, version, checksum size, flags byte, entry count
/// (u32 BE), tag count (u16 BE).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadHeader {
    /// Format version
    pub version: u8,
    /// Digest size of each entry (always 16)
    pub checksum_size: u8,
    /// Opaque flags byte, carried through unchanged
    pub flags: u8,
    /// Number of entries
    pub entry_count: u32,
    /// Number of tags
    pub tag_count: u16,
}

impl DownloadHeader {
    /// Oldest supported version
    pub const MIN_VERSION: u8 = 1;
    /// Newest supported version
    pub const MAX_VERSION: u8 = 2;
    /// Serialized size
    pub const SIZE: usize = 11;

    /// Create an empty header for `version`
    pub fn new(version: u8) -> Result<Self> {
        if !(Self::MIN_VERSION..=Self::MAX_VERSION).contains(&version) {
            return Err(ManifestError::UnsupportedVersion {
                manifest: super::DOWNLOAD_MANIFEST,
                version,
            });
        }
        Ok(Self {
            version,
            checksum_size: DIGEST_SIZE,
            flags: 1,
            entry_count: 0,
            tag_count: 0,
        })
    }

    /// Check if entries carry a leading flag byte
    pub fn has_entry_flags(&self) -> bool {
        self.version >= 2
    }

    pub(crate) fn read(reader: &mut ManifestReader<'_>) -> Result<Self> {
        let magic = reader.read_array::<2>()?;
        if magic != DOWNLOAD_MAGIC {
            return Err(ManifestError::InvalidMagic {
                manifest: super::DOWNLOAD_MANIFEST,
                expected: DOWNLOAD_MAGIC,
                actual: magic,
            });
        }

        let mut header = Self::new(reader.read_u8()?)?;
        header.checksum_size = reader.read_u8()?;
        if header.checksum_size != DIGEST_SIZE {
            return Err(ManifestError::InvalidDigestSize(header.checksum_size));
        }
        header.flags = reader.read_u8()?;
        header.entry_count = reader.read_u32()?;
        header.tag_count = reader.read_u16()?;
        Ok(header)
    }

    pub(crate) fn write(&self, writer: &mut ManifestWriter) -> Result<()> {
        writer.write_bytes(&DOWNLOAD_MAGIC)?;
        writer.write_u8(self.version)?;
        writer.write_u8(self.checksum_size)?;
        writer.write_u8(self.flags)?;
        writer.write_u32(self.entry_count)?;
        writer.write_u16(self.tag_count)
    }
}

impl Default for DownloadHeader {
    fn default() -> Self {
        Self {
            version: Self::MIN_VERSION,
            checksum_size: DIGEST_SIZE,
            flags: 1,
            entry_count: 0,
            tag_count: 0,
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        let header = DownloadHeader {
            entry_count: 0x0102_0304,
            tag_count: 0x0506,
            ..DownloadHeader::default()
        };
        let mut writer = ManifestWriter::new();
        header.write(&mut writer).expect("write header");
        let data = writer.into_inner();

        assert_eq!(
            data,
            vec![b'D', b'L', 1, 16, 1, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06]
        );
        assert_eq!(data.len(), DownloadHeader::SIZE);

        let parsed = DownloadHeader::read(&mut ManifestReader::new(&data)).expect("read header");
        assert_eq!(parsed, header);
    }

    #[test]
    fn test_unsupported_version() {
        let data = [b'D', b'L', 3, 16, 1, 0, 0, 0, 0, 0, 0];
        assert!(matches!(
            DownloadHeader::read(&mut ManifestReader::new(&data)),
            Err(ManifestError::UnsupportedVersion { version: 3, .. })
        ));
        assert!(DownloadHeader::new(0).is_err());
        assert!(DownloadHeader::new(2).expect("v2").has_entry_flags());
    }

    #[test]
    fn test_wrong_magic_and_digest_size() {
        let data = [b'I', b'N', 1, 16, 1, 0, 0, 0, 0, 0, 0];
        assert!(matches!(
            DownloadHeader::read(&mut ManifestReader::new(&data)),
            Err(ManifestError::InvalidMagic { .. })
        ));

        let data = [b'D', b'L', 1, 20, 1, 0, 0, 0, 0, 0, 0];
        assert!(matches!(
            DownloadHeader::read(&mut ManifestReader::new(&data)),
            Err(ManifestError::InvalidDigestSize(20))
        ));
    }

    #[test]
    fn test_truncated_header() {
        let data = [b'D', b'L', 1, 16, 1, 0, 0];
        assert!(matches!(
            DownloadHeader::read(&mut ManifestReader::new(&data)),
            Err(ManifestError::Truncated {
                section: "header",
                ..
            })
        ));
    }
}
