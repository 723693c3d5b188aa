//! MD5 content hashes

use binrw::{BinRead, BinWrite};
use md5::{Digest, Md5};
use std::fmt;

/// Fixed 16-byte content digest
///
/// Used both for the content key of a file (hash of the raw bytes) and for
/// the stored key of its container (hash of the container header).
#[derive(BinRead, BinWrite, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ContentHash([u8; 16]);

impl ContentHash {
    /// Digest length in bytes
    pub const SIZE: usize = 16;

    /// Create a hash from raw bytes
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Compute the MD5 hash of `data`
    pub fn from_data(data: &[u8]) -> Self {
        Self::from_parts([data])
    }

    /// Compute the MD5 hash over several slices as if they were concatenated
    pub fn from_parts<'a>(parts: impl IntoIterator<Item = &'a [u8]>) -> Self {
        let mut hasher = Md5::new();
        for part in parts {
            hasher.update(part);
        }
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&hasher.finalize());
        Self(bytes)
    }

    /// Parse a hash from a 32-character hex string
    pub fn from_hex(hex: &str) -> Result<Self, hex::FromHexError> {
        let mut bytes = [0u8; 16];
        hex::decode_to_slice(hex, &mut bytes)?;
        Ok(Self(bytes))
    }

    /// Get raw bytes
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Convert to lowercase hex
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<[u8; 16]> for ContentHash {
    fn from(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_data() {
        let hash = ContentHash::from_data(b"Hello, World!");
        assert_eq!(hash.to_hex(), "65a8e27d8879283831b664bd8b7f0ad4");
    }

    #[test]
    fn test_from_parts_matches_concatenation() {
        let whole = ContentHash::from_data(b"Hello, World!");
        let parts = ContentHash::from_parts([
            b"Hello".as_slice(),
            b", ".as_slice(),
            b"World!".as_slice(),
        ]);
        assert_eq!(whole, parts);
    }

    #[test]
    fn test_hex_round_trip() {
        let hex = "0123456789abcdef0123456789abcdef";
        let hash = ContentHash::from_hex(hex).expect("valid hex");
        assert_eq!(hash.to_hex(), hex);
        assert_eq!(format!("{hash}"), hex);
    }

    #[test]
    fn test_invalid_hex() {
        assert!(ContentHash::from_hex("not hex").is_err());
        assert!(ContentHash::from_hex("0123").is_err());
    }
}
