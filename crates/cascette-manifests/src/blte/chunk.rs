//! BLTE chunk compression modes

use super::error::{BlteError, BlteResult};
use flate2::Compression;
use flate2::read::{ZlibDecoder, ZlibEncoder};
use std::io::Read;

/// Maximum allowed decompressed chunk size (1 GB)
pub const MAX_DECOMPRESSION_SIZE: usize = 1024 * 1024 * 1024;

/// BLTE compression modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CompressionMode {
    /// No compression (mode 'N')
    None = b'N',
    /// ZLib compression (mode 'Z')
    ZLib = b'Z',
    /// LZ4 compression (mode '4')
    Lz4 = b'4',
}

impl CompressionMode {
    /// Parse compression mode from its mode byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'N' => Some(Self::None),
            b'Z' => Some(Self::ZLib),
            b'4' => Some(Self::Lz4),
            _ => None,
        }
    }

    /// Get the mode byte
    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

/// Compress `data` with `mode` at effort `level`
pub fn compress_chunk(data: &[u8], mode: CompressionMode, level: u32) -> BlteResult<Vec<u8>> {
    match mode {
        CompressionMode::None => Ok(data.to_vec()),
        CompressionMode::ZLib => {
            let mut encoder = ZlibEncoder::new(data, Compression::new(level.min(9)));
            let mut compressed = Vec::new();
            encoder.read_to_end(&mut compressed).map_err(|e| {
                BlteError::CompressionError(format!("ZLib compression failed: {e}"))
            })?;
            Ok(compressed)
        }
        CompressionMode::Lz4 => {
            // 8-byte little-endian decompressed size, then one LZ4 block
            let mut result = Vec::with_capacity(8 + data.len());
            result.extend_from_slice(&(data.len() as u64).to_le_bytes());
            result.extend_from_slice(&lz4_flex::block::compress(data));
            Ok(result)
        }
    }
}

/// Decompress chunk payload stored with `mode`
pub fn decompress_chunk(data: &[u8], mode: CompressionMode) -> BlteResult<Vec<u8>> {
    match mode {
        CompressionMode::None => Ok(data.to_vec()),
        CompressionMode::ZLib => {
            let mut decoder = ZlibDecoder::new(data);
            let mut decompressed = Vec::new();
            let mut buffer = [0u8; 8192];
            loop {
                let bytes_read = decoder.read(&mut buffer).map_err(|e| {
                    BlteError::CompressionError(format!("ZLib decompression failed: {e}"))
                })?;
                if bytes_read == 0 {
                    break;
                }
                if decompressed.len() + bytes_read > MAX_DECOMPRESSION_SIZE {
                    return Err(BlteError::CompressionError(format!(
                        "decompressed size exceeds limit of {MAX_DECOMPRESSION_SIZE} bytes"
                    )));
                }
                decompressed.extend_from_slice(&buffer[..bytes_read]);
            }
            Ok(decompressed)
        }
        CompressionMode::Lz4 => {
            let Some((size_bytes, block)) = data.split_first_chunk::<8>() else {
                return Err(BlteError::CompressionError(
                    "LZ4 data too short - missing size header".to_string(),
                ));
            };
            let size = usize::try_from(u64::from_le_bytes(*size_bytes)).map_err(|_| {
                BlteError::CompressionError("decompressed size too large".to_string())
            })?;
            if size > MAX_DECOMPRESSION_SIZE {
                return Err(BlteError::CompressionError(format!(
                    "LZ4 decompressed size {size} exceeds limit of {MAX_DECOMPRESSION_SIZE} bytes"
                )));
            }
            lz4_flex::block::decompress(block, size)
                .map_err(|e| BlteError::CompressionError(format!("LZ4 decompression failed: {e}")))
        }
    }
}
