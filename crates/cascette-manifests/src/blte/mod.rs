//! BLTE container encoding for manifest sections
//!
//! Each manifest section becomes one chunk in a multi-chunk BLTE container.
//! A chunk is a mode byte (`N`, `Z` or `4`) followed by the payload, and the
//! chunk table records its stored size, decompressed size and MD5. The stored
//! key of a container is the MD5 of its header.
//!
//! Decoding verifies every chunk checksum and reports the compression mode of
//! each chunk so callers can re-encode with the same profile.

mod chunk;
mod error;
mod header;

pub use chunk::{CompressionMode, MAX_DECOMPRESSION_SIZE, compress_chunk, decompress_chunk};
pub use error::{BlteError, BlteResult};
pub use header::{BLTE_MAGIC, BlteHeader, ChunkInfo, MAX_CHUNKS, STANDARD_FLAGS};

use crate::encoding::Section;
use crate::hash::ContentHash;
use binrw::io::Cursor;

/// Result of encoding sections into a container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedContainer {
    /// Complete container bytes
    pub data: Vec<u8>,
    /// MD5 of the container header (the stored key)
    pub header_hash: ContentHash,
}

/// Result of decoding a container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedContainer {
    /// Concatenated decompressed chunks
    pub data: Vec<u8>,
    /// Compression mode of each chunk, in order
    pub modes: Vec<CompressionMode>,
}

/// Encode sections into a multi-chunk container, one chunk per section
pub fn encode(sections: &[Section]) -> BlteResult<EncodedContainer> {
    if sections.is_empty() || sections.len() > MAX_CHUNKS {
        return Err(BlteError::InvalidChunkCount(sections.len()));
    }

    let mut chunk_infos = Vec::with_capacity(sections.len());
    let mut chunks = Vec::with_capacity(sections.len());

    for (index, section) in sections.iter().enumerate() {
        let payload = compress_chunk(&section.data, section.profile.mode, section.profile.level)?;

        let mut chunk = Vec::with_capacity(payload.len() + 1);
        chunk.push(section.profile.mode.as_byte());
        chunk.extend_from_slice(&payload);

        let compressed_size =
            u32::try_from(chunk.len()).map_err(|_| BlteError::ChunkTooLarge(index))?;
        let decompressed_size =
            u32::try_from(section.data.len()).map_err(|_| BlteError::ChunkTooLarge(index))?;

        chunk_infos.push(ChunkInfo {
            compressed_size,
            decompressed_size,
            checksum: ContentHash::from_data(&chunk),
        });
        chunks.push(chunk);
    }

    let header = BlteHeader { chunk_infos };
    let mut data = header.to_bytes()?;
    let header_hash = ContentHash::from_data(&data);
    for chunk in &chunks {
        data.extend_from_slice(chunk);
    }

    Ok(EncodedContainer { data, header_hash })
}

/// Decode a container, verifying chunk checksums and sizes
pub fn decode(container: &[u8]) -> BlteResult<DecodedContainer> {
    let mut cursor = Cursor::new(container);
    let header = BlteHeader::read(&mut cursor)?;
    let offset = header.data_offset();

    if header.is_single_chunk() {
        let chunk = container.get(offset..).unwrap_or_default();
        let (mode, data) = decode_chunk(0, chunk)?;
        return Ok(DecodedContainer {
            data,
            modes: vec![mode],
        });
    }

    let mut data = Vec::new();
    let mut modes = Vec::with_capacity(header.chunk_infos.len());
    let mut offset = offset;

    for (index, info) in header.chunk_infos.iter().enumerate() {
        let end = offset + info.compressed_size as usize;
        let Some(chunk) = container.get(offset..end) else {
            return Err(BlteError::Truncated {
                needed: end,
                available: container.len(),
            });
        };

        let actual = ContentHash::from_data(chunk);
        if actual != info.checksum {
            return Err(BlteError::ChecksumMismatch {
                chunk: index,
                expected: info.checksum.to_hex(),
                actual: actual.to_hex(),
            });
        }

        let (mode, decompressed) = decode_chunk(index, chunk)?;
        if decompressed.len() != info.decompressed_size as usize {
            return Err(BlteError::SizeMismatch {
                chunk: index,
                expected: u64::from(info.decompressed_size),
                actual: decompressed.len() as u64,
            });
        }
        if data.len() + decompressed.len() > MAX_DECOMPRESSION_SIZE {
            return Err(BlteError::CompressionError(format!(
                "container exceeds limit of {MAX_DECOMPRESSION_SIZE} bytes"
            )));
        }

        data.extend_from_slice(&decompressed);
        modes.push(mode);
        offset = end;
    }

    Ok(DecodedContainer { data, modes })
}

fn decode_chunk(index: usize, chunk: &[u8]) -> BlteResult<(CompressionMode, Vec<u8>)> {
    let Some((&mode_byte, payload)) = chunk.split_first() else {
        return Err(BlteError::EmptyChunk(index));
    };
    let mode =
        CompressionMode::from_byte(mode_byte).ok_or(BlteError::UnknownCompressionMode(mode_byte))?;
    Ok((mode, decompress_chunk(payload, mode)?))
}
