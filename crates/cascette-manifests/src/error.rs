//! Error types for manifest parsing and writing

use crate::blte::BlteError;
use thiserror::Error;

/// Result type alias for manifest operations
pub type Result<T> = std::result::Result<T, ManifestError>;

/// Errors that can occur when parsing, mutating or writing manifests
#[derive(Debug, Error)]
pub enum ManifestError {
    /// Decompressed container size differs from the size recorded in the
    /// build locator keys
    #[error("{manifest} manifest is corrupt: expected {expected} decompressed bytes, got {actual}")]
    CorruptContainer {
        /// Manifest name ("download", "install")
        manifest: &'static str,
        /// Size recorded in the build locator keys
        expected: u64,
        /// Size of the decoded container
        actual: u64,
    },

    /// Fewer bytes available than a field declares
    #[error("truncated {section} section at offset {offset}: {detail}")]
    Truncated {
        /// Section being read when the input ran out
        section: &'static str,
        /// Byte offset within the decompressed manifest
        offset: u64,
        /// What was being read
        detail: String,
    },

    /// Version byte outside the supported range
    #[error("unsupported {manifest} manifest version: {version}")]
    UnsupportedVersion {
        /// Manifest name
        manifest: &'static str,
        /// Version found in the header
        version: u8,
    },

    /// Magic bytes do not match the manifest kind
    #[error("invalid {manifest} magic: expected {expected:?}, got {actual:?}")]
    InvalidMagic {
        /// Manifest name
        manifest: &'static str,
        /// Expected magic
        expected: [u8; 2],
        /// Magic found in the header
        actual: [u8; 2],
    },

    /// Digest size byte is not 16
    #[error("invalid digest size: {0} (expected 16)")]
    InvalidDigestSize(u8),

    /// File size does not fit the 40-bit size field
    #[error("file size too large for 40-bit field: {0} (max: 1,099,511,627,775)")]
    FileSizeTooLarge(u64),

    /// File size does not fit the 32-bit install size field
    #[error("file size too large for 32-bit field: {0}")]
    InstallSizeTooLarge(u64),

    /// Install entries are keyed by name; the record carried no path
    #[error("install entry for {0} has no path")]
    MissingPath(String),

    /// Entry or tag count exceeds what the header can encode
    #[error("{what} count {count} exceeds header field capacity")]
    CountOverflow {
        /// "entry" or "tag"
        what: &'static str,
        /// Count that did not fit
        count: usize,
    },

    /// Container encoding or decoding failed
    #[error("container error: {0}")]
    Container(#[from] BlteError),

    /// IO error during writing or stale-file cleanup
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Binary parsing/writing error
    #[error("binary format error: {0}")]
    BinRw(#[from] binrw::Error),

    /// Invalid UTF-8 in a tag name or entry path
    #[error("invalid UTF-8 string: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl ManifestError {
    /// Create a truncation error for a section
    pub fn truncated(section: &'static str, offset: u64, detail: impl Into<String>) -> Self {
        Self::Truncated {
            section,
            offset,
            detail: detail.into(),
        }
    }

    /// Check if this error comes from malformed input bytes
    ///
    /// These conditions are deterministic for a given input and are never
    /// worth retrying.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::CorruptContainer { .. }
                | Self::Truncated { .. }
                | Self::UnsupportedVersion { .. }
                | Self::InvalidMagic { .. }
                | Self::InvalidDigestSize(_)
                | Self::Container(_)
                | Self::Utf8(_)
        )
    }

    /// Check if this error was raised while building a manifest in memory
    pub fn is_builder_error(&self) -> bool {
        matches!(
            self,
            Self::FileSizeTooLarge(_)
                | Self::InstallSizeTooLarge(_)
                | Self::MissingPath(_)
                | Self::CountOverflow { .. }
        )
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categorization() {
        let corrupt = ManifestError::CorruptContainer {
            manifest: "download",
            expected: 10,
            actual: 12,
        };
        assert!(corrupt.is_input_error());
        assert!(!corrupt.is_builder_error());

        let too_large = ManifestError::FileSizeTooLarge(1 << 40);
        assert!(too_large.is_builder_error());
        assert!(!too_large.is_input_error());

        let truncated = ManifestError::truncated("entries", 42, "16-byte digest");
        assert!(truncated.is_input_error());

        let container = ManifestError::from(BlteError::InvalidChunkCount(0));
        assert!(container.is_input_error());
        assert!(!container.is_builder_error());
    }

    #[test]
    fn test_error_messages_carry_context() {
        let error = ManifestError::CorruptContainer {
            manifest: "install",
            expected: 100,
            actual: 90,
        };
        let message = error.to_string();
        assert!(message.contains("install"));
        assert!(message.contains("100"));
        assert!(message.contains("90"));

        let error = ManifestError::truncated("tags", 7, "tag mask");
        assert_eq!(
            error.to_string(),
            "truncated tags section at offset 7: tag mask"
        );

        let error = ManifestError::UnsupportedVersion {
            manifest: "download",
            version: 9,
        };
        assert_eq!(error.to_string(), "unsupported download manifest version: 9");
    }
}
