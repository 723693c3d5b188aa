//! BLTE header and chunk table

use super::error::{BlteError, BlteResult};
use crate::hash::ContentHash;
use binrw::io::Cursor;
use binrw::{BinRead, BinReaderExt, BinWrite, BinWriterExt};

/// BLTE magic bytes
pub const BLTE_MAGIC: [u8; 4] = *b"BLTE";

/// Chunk table flags for the standard 24-byte chunk info layout
pub const STANDARD_FLAGS: u8 = 0x0F;

/// Largest chunk count the 24-bit field can hold
pub const MAX_CHUNKS: usize = 0xFF_FFFF;

/// Magic and header size field
const PREAMBLE_SIZE: usize = 8;

/// Preamble plus flags and chunk count
const TABLE_PREFIX_SIZE: usize = 12;

/// Chunk table entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[brw(big)]
pub struct ChunkInfo {
    /// Stored size including the mode byte
    pub compressed_size: u32,
    /// Size after decompression
    pub decompressed_size: u32,
    /// MD5 of the stored chunk bytes (mode byte + payload)
    pub checksum: ContentHash,
}

impl ChunkInfo {
    /// Serialized size of one chunk info
    pub const SIZE: usize = 24;
}

/// BLTE header
///
/// An empty chunk table means the single-chunk form: the header is only the
/// preamble and the rest of the file is one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlteHeader {
    /// Chunk table in container order
    pub chunk_infos: Vec<ChunkInfo>,
}

impl BlteHeader {
    /// Check if this is a single-chunk container
    pub fn is_single_chunk(&self) -> bool {
        self.chunk_infos.is_empty()
    }

    /// Header size as stored on disk; includes the 8-byte preamble
    pub fn header_size(&self) -> usize {
        if self.is_single_chunk() {
            0
        } else {
            TABLE_PREFIX_SIZE + self.chunk_infos.len() * ChunkInfo::SIZE
        }
    }

    /// Offset of the first chunk
    pub fn data_offset(&self) -> usize {
        if self.is_single_chunk() {
            PREAMBLE_SIZE
        } else {
            self.header_size()
        }
    }

    /// Parse a header from the start of a container
    pub fn read(cursor: &mut Cursor<&[u8]>) -> BlteResult<Self> {
        let magic: [u8; 4] = cursor.read_be()?;
        if magic != BLTE_MAGIC {
            return Err(BlteError::InvalidMagic(magic));
        }

        let header_size: u32 = cursor.read_be()?;
        if header_size == 0 {
            return Ok(Self {
                chunk_infos: Vec::new(),
            });
        }

        let flags: u8 = cursor.read_be()?;
        if flags != STANDARD_FLAGS {
            return Err(BlteError::UnsupportedHeaderFlags(flags));
        }

        let count: [u8; 3] = cursor.read_be()?;
        let chunk_count =
            (usize::from(count[0]) << 16) | (usize::from(count[1]) << 8) | usize::from(count[2]);
        if chunk_count == 0 {
            return Err(BlteError::InvalidChunkCount(0));
        }
        if header_size as usize != TABLE_PREFIX_SIZE + chunk_count * ChunkInfo::SIZE {
            return Err(BlteError::InvalidHeaderSize(header_size));
        }

        let chunk_infos = (0..chunk_count)
            .map(|_| cursor.read_be::<ChunkInfo>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { chunk_infos })
    }

    /// Serialize the header
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_bytes(&self) -> BlteResult<Vec<u8>> {
        let count = self.chunk_infos.len();
        if count > MAX_CHUNKS {
            return Err(BlteError::InvalidChunkCount(count));
        }

        let mut cursor = Cursor::new(Vec::with_capacity(self.data_offset()));
        cursor.write_be(&BLTE_MAGIC)?;
        // Bounded by MAX_CHUNKS * 24 + 12
        cursor.write_be(&(self.header_size() as u32))?;
        if !self.is_single_chunk() {
            cursor.write_be(&STANDARD_FLAGS)?;
            let count = (count as u32).to_be_bytes();
            cursor.write_be(&[count[1], count[2], count[3]])?;
            for info in &self.chunk_infos {
                cursor.write_be(info)?;
            }
        }
        Ok(cursor.into_inner())
    }
}
