//! Big-endian binary cursor used by the manifest codecs
//!
//! Manifests are fully decompressed into memory before interpretation, so the
//! reader works over a byte slice and reports every short read as
//! [`ManifestError::Truncated`] tagged with the section being decoded.

use crate::error::{ManifestError, Result};
use crate::hash::ContentHash;
use binrw::io::Cursor;
use binrw::{BinReaderExt, BinWriterExt};
use std::io::{ErrorKind, Read};

/// 40-bit file size stored as 5 big-endian bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FileSize40(u64);

impl FileSize40 {
    /// Maximum value for a 40-bit integer (2^40 - 1)
    pub const MAX: u64 = 0xFF_FFFF_FFFF;

    /// Create a new 40-bit size, rejecting values that do not fit
    pub fn new(size: u64) -> Result<Self> {
        if size > Self::MAX {
            return Err(ManifestError::FileSizeTooLarge(size));
        }
        Ok(Self(size))
    }

    /// Get the size as u64
    pub fn as_u64(self) -> u64 {
        self.0
    }

    /// Decode from 5 big-endian bytes
    pub fn from_bytes(bytes: [u8; 5]) -> Self {
        let size = bytes
            .iter()
            .fold(0u64, |acc, &byte| (acc << 8) | u64::from(byte));
        Self(size)
    }

    /// Encode as 5 big-endian bytes
    pub fn to_bytes(self) -> [u8; 5] {
        let be = self.0.to_be_bytes();
        [be[3], be[4], be[5], be[6], be[7]]
    }
}

impl std::fmt::Display for FileSize40 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u64> for FileSize40 {
    type Error = ManifestError;

    fn try_from(size: u64) -> Result<Self> {
        Self::new(size)
    }
}

/// Reads big-endian fields from an in-memory manifest
pub struct ManifestReader<'a> {
    cursor: Cursor<&'a [u8]>,
    section: &'static str,
}

impl<'a> ManifestReader<'a> {
    /// Create a reader positioned at the start of `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(data),
            section: "header",
        }
    }

    /// Name the section subsequent reads belong to (for error context)
    pub fn enter(&mut self, section: &'static str) {
        self.section = section;
    }

    /// Current byte offset
    pub fn position(&self) -> u64 {
        self.cursor.position()
    }

    /// Bytes left to read
    pub fn remaining(&self) -> usize {
        let len = self.cursor.get_ref().len() as u64;
        len.saturating_sub(self.cursor.position()) as usize
    }

    fn truncated(&self, detail: impl Into<String>) -> ManifestError {
        ManifestError::truncated(self.section, self.cursor.position(), detail)
    }

    fn map_err(&self, error: binrw::Error, what: &str) -> ManifestError {
        match error {
            binrw::Error::Io(ref e) if e.kind() == ErrorKind::UnexpectedEof => {
                self.truncated(what)
            }
            other => ManifestError::BinRw(other),
        }
    }

    /// Read a single byte
    pub fn read_u8(&mut self) -> Result<u8> {
        self.cursor.read_be::<u8>().map_err(|e| self.map_err(e, "u8"))
    }

    /// Read a big-endian u16
    pub fn read_u16(&mut self) -> Result<u16> {
        self.cursor.read_be::<u16>().map_err(|e| self.map_err(e, "u16"))
    }

    /// Read a big-endian u32
    pub fn read_u32(&mut self) -> Result<u32> {
        self.cursor.read_be::<u32>().map_err(|e| self.map_err(e, "u32"))
    }

    /// Read a 40-bit big-endian size
    pub fn read_u40(&mut self) -> Result<FileSize40> {
        let mut bytes = [0u8; 5];
        self.read_exact(&mut bytes, "40-bit size")?;
        Ok(FileSize40::from_bytes(bytes))
    }

    /// Read a 16-byte digest
    pub fn read_hash(&mut self) -> Result<ContentHash> {
        let mut bytes = [0u8; ContentHash::SIZE];
        self.read_exact(&mut bytes, "16-byte digest")?;
        Ok(ContentHash::from_bytes(bytes))
    }

    /// Read a fixed-size byte array
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut bytes = [0u8; N];
        self.read_exact(&mut bytes, "fixed bytes")?;
        Ok(bytes)
    }

    /// Read exactly `len` raw bytes
    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        if self.remaining() < len {
            return Err(self.truncated(format!(
                "{len} bytes requested, {} available",
                self.remaining()
            )));
        }
        let mut bytes = vec![0u8; len];
        self.read_exact(&mut bytes, "raw bytes")?;
        Ok(bytes)
    }

    /// Read a NUL-terminated UTF-8 string
    pub fn read_cstring(&mut self) -> Result<String> {
        let start = self.cursor.position() as usize;
        let data = *self.cursor.get_ref();
        let rest = data.get(start..).unwrap_or_default();
        let Some(nul) = rest.iter().position(|&b| b == 0) else {
            return Err(self.truncated("unterminated string"));
        };
        let text = String::from_utf8(rest[..nul].to_vec())?;
        self.cursor.set_position((start + nul + 1) as u64);
        Ok(text)
    }

    fn read_exact(&mut self, buf: &mut [u8], what: &str) -> Result<()> {
        self.cursor.read_exact(buf).map_err(|e| {
            if e.kind() == ErrorKind::UnexpectedEof {
                self.truncated(what)
            } else {
                ManifestError::Io(e)
            }
        })
    }
}

/// Writes big-endian fields into an in-memory section buffer
#[derive(Default)]
pub struct ManifestWriter {
    cursor: Cursor<Vec<u8>>,
}

impl ManifestWriter {
    /// Create an empty writer
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a single byte
    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.cursor.write_be(&value)?;
        Ok(())
    }

    /// Write a big-endian u16
    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        self.cursor.write_be(&value)?;
        Ok(())
    }

    /// Write a big-endian u32
    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.cursor.write_be(&value)?;
        Ok(())
    }

    /// Write a 40-bit big-endian size
    pub fn write_u40(&mut self, value: u64) -> Result<()> {
        let size = FileSize40::new(value)?;
        self.write_bytes(&size.to_bytes())
    }

    /// Write a 16-byte digest
    pub fn write_hash(&mut self, hash: &ContentHash) -> Result<()> {
        self.write_bytes(hash.as_bytes())
    }

    /// Write raw bytes
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        std::io::Write::write_all(&mut self.cursor, bytes)?;
        Ok(())
    }

    /// Write a UTF-8 string followed by a NUL byte
    pub fn write_cstring(&mut self, text: &str) -> Result<()> {
        self.write_bytes(text.as_bytes())?;
        self.write_u8(0)
    }

    /// Bytes written so far
    pub fn len(&self) -> usize {
        self.cursor.get_ref().len()
    }

    /// Check if nothing has been written
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Consume the writer and return the buffer
    pub fn into_inner(self) -> Vec<u8> {
        self.cursor.into_inner()
    }
}
