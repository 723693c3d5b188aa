//! BLTE error types

use thiserror::Error;

/// BLTE container error type
#[derive(Debug, Error)]
pub enum BlteError {
    /// Invalid BLTE magic bytes
    #[error("invalid BLTE magic: expected [42 4C 54 45], got {0:02X?}")]
    InvalidMagic([u8; 4]),

    /// Header size does not match the chunk table
    #[error("invalid header size: {0}")]
    InvalidHeaderSize(u32),

    /// Unsupported chunk table flags
    #[error("unsupported chunk table flags: 0x{0:02X}")]
    UnsupportedHeaderFlags(u8),

    /// Invalid chunk count
    #[error("invalid chunk count: {0}")]
    InvalidChunkCount(usize),

    /// Chunk with zero stored bytes
    #[error("empty chunk {0} (zero size)")]
    EmptyChunk(usize),

    /// Unknown compression mode byte
    #[error("unknown compression mode: 0x{0:02X}")]
    UnknownCompressionMode(u8),

    /// Chunk checksum mismatch
    #[error("chunk {chunk} checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Chunk index
        chunk: usize,
        /// Checksum recorded in the chunk table
        expected: String,
        /// Checksum of the stored bytes
        actual: String,
    },

    /// Decompressed chunk size differs from the chunk table
    #[error("chunk {chunk} decompressed to {actual} bytes, chunk table says {expected}")]
    SizeMismatch {
        /// Chunk index
        chunk: usize,
        /// Size recorded in the chunk table
        expected: u64,
        /// Size after decompression
        actual: u64,
    },

    /// Container ends before the chunk table says it should
    #[error("container truncated: need {needed} bytes, have {available}")]
    Truncated {
        /// Bytes required
        needed: usize,
        /// Bytes available
        available: usize,
    },

    /// Chunk too large for the 32-bit chunk table fields
    #[error("chunk {0} too large for the chunk table")]
    ChunkTooLarge(usize),

    /// Compression/decompression error
    #[error("compression error: {0}")]
    CompressionError(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Binary parsing error
    #[error("binary parsing error: {0}")]
    BinRw(#[from] binrw::Error),
}

/// Result type for BLTE operations
pub type BlteResult<T> = Result<T, BlteError>;
