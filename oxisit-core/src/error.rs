//! Error types for OxiSit operations.
//!
//! A single error enum covers the decompression engine (format, truncation and
//! unsupported-method conditions) and the container layer that feeds it.

use std::io;
use thiserror::Error;

/// The main error type for OxiSit operations.
#[derive(Debug, Error)]
pub enum OxiSitError {
    /// I/O error from underlying reader/writer.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid magic number in a stream or header.
    #[error("Invalid magic number: expected {expected:02x?}, found {found:02x?}")]
    InvalidMagic {
        /// Expected magic bytes.
        expected: Vec<u8>,
        /// Actual magic bytes found.
        found: Vec<u8>,
    },

    /// Unsupported compression method.
    #[error("Unsupported compression method: {method}")]
    UnsupportedMethod {
        /// The compression method identifier.
        method: String,
    },

    /// CRC checksum mismatch.
    #[error("CRC mismatch: expected {expected:#x}, computed {computed:#x}")]
    CrcMismatch {
        /// Expected CRC value from the archive.
        expected: u32,
        /// Computed CRC value from data.
        computed: u32,
    },

    /// Invalid Huffman code encountered during decompression.
    #[error("Invalid Huffman code at bit position {bit_position}")]
    InvalidHuffmanCode {
        /// Bit position where the invalid code was found.
        bit_position: u64,
    },

    /// Corrupted data in a compressed stream.
    #[error("Corrupted data at offset {offset}: {message}")]
    CorruptedData {
        /// Bit or byte offset where corruption was detected.
        offset: u64,
        /// Description of the corruption.
        message: String,
    },

    /// A block-sorting block received more bytes than its capacity.
    #[error("Block overflow: more than {capacity} bytes decoded into block")]
    BlockOverflow {
        /// Block capacity in bytes.
        capacity: usize,
    },

    /// Block-sorting transform index outside the decoded block.
    #[error("Invalid transform index {index} for block of {length} bytes")]
    InvalidTransformIndex {
        /// The transform index read from the stream.
        index: usize,
        /// Number of bytes in the block.
        length: usize,
    },

    /// Invalid header format.
    #[error("Invalid header: {message}")]
    InvalidHeader {
        /// Description of the header error.
        message: String,
    },

    /// Unexpected end of input while reading bits or bytes.
    #[error("Unexpected end of file: expected {expected} more bytes")]
    UnexpectedEof {
        /// Number of bytes that were expected but not available.
        expected: usize,
    },

    /// A codec signalled end-of-data before the declared length was produced.
    #[error("Truncated output: produced {produced} of {expected} bytes")]
    Truncated {
        /// Bytes produced before the codec stopped.
        produced: u64,
        /// Declared uncompressed length.
        expected: u64,
    },

    /// Invalid distance in an LZSS back-reference.
    #[error("Invalid back-reference distance: {distance} exceeds history size {history_size}")]
    InvalidDistance {
        /// The invalid distance value.
        distance: usize,
        /// Current history buffer size.
        history_size: usize,
    },

    /// Declared size exceeds the configured output limit.
    #[error("Declared size {size} exceeds limit {limit}")]
    SizeLimit {
        /// Declared uncompressed size.
        size: u64,
        /// Configured maximum.
        limit: u64,
    },

    /// Entry is encrypted and cannot be decoded.
    #[error("Entry is encrypted: {name}")]
    Encrypted {
        /// Name of the encrypted entry.
        name: String,
    },

    /// Path traversal attack detected (e.g., "../" in a name).
    #[error("Path traversal detected in entry: {path}")]
    PathTraversal {
        /// The suspicious path.
        path: String,
    },

    /// Entry not found in archive.
    #[error("Entry not found: {name}")]
    EntryNotFound {
        /// Name of the missing entry.
        name: String,
    },
}

/// Result type alias for OxiSit operations.
pub type Result<T> = std::result::Result<T, OxiSitError>;

impl OxiSitError {
    /// Create an invalid magic error.
    pub fn invalid_magic(expected: impl Into<Vec<u8>>, found: impl Into<Vec<u8>>) -> Self {
        Self::InvalidMagic {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create an unsupported method error.
    pub fn unsupported_method(method: impl Into<String>) -> Self {
        Self::UnsupportedMethod {
            method: method.into(),
        }
    }

    /// Create a CRC mismatch error.
    pub fn crc_mismatch(expected: u32, computed: u32) -> Self {
        Self::CrcMismatch { expected, computed }
    }

    /// Create an invalid Huffman code error.
    pub fn invalid_huffman(bit_position: u64) -> Self {
        Self::InvalidHuffmanCode { bit_position }
    }

    /// Create a corrupted data error.
    pub fn corrupted(offset: u64, message: impl Into<String>) -> Self {
        Self::CorruptedData {
            offset,
            message: message.into(),
        }
    }

    /// Create a block overflow error.
    pub fn block_overflow(capacity: usize) -> Self {
        Self::BlockOverflow { capacity }
    }

    /// Create an invalid transform index error.
    pub fn invalid_transform_index(index: usize, length: usize) -> Self {
        Self::InvalidTransformIndex { index, length }
    }

    /// Create an invalid header error.
    pub fn invalid_header(message: impl Into<String>) -> Self {
        Self::InvalidHeader {
            message: message.into(),
        }
    }

    /// Create an unexpected EOF error.
    pub fn unexpected_eof(expected: usize) -> Self {
        Self::UnexpectedEof { expected }
    }

    /// Create a truncated output error.
    pub fn truncated(produced: u64, expected: u64) -> Self {
        Self::Truncated { produced, expected }
    }

    /// Create an invalid distance error.
    pub fn invalid_distance(distance: usize, history_size: usize) -> Self {
        Self::InvalidDistance {
            distance,
            history_size,
        }
    }

    /// Create a size limit error.
    pub fn size_limit(size: u64, limit: u64) -> Self {
        Self::SizeLimit { size, limit }
    }

    /// Create an encrypted entry error.
    pub fn encrypted(name: impl Into<String>) -> Self {
        Self::Encrypted { name: name.into() }
    }

    /// Create a path traversal error.
    pub fn path_traversal(path: impl Into<String>) -> Self {
        Self::PathTraversal { path: path.into() }
    }

    /// Create an entry not found error.
    pub fn entry_not_found(name: impl Into<String>) -> Self {
        Self::EntryNotFound { name: name.into() }
    }

    /// Whether this error means the input ran out before decoding finished.
    pub fn is_truncation(&self) -> bool {
        matches!(self, Self::UnexpectedEof { .. } | Self::Truncated { .. })
            || matches!(self, Self::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof)
    }
}

impl From<OxiSitError> for io::Error {
    fn from(err: OxiSitError) -> Self {
        match err {
            OxiSitError::Io(e) => e,
            other if other.is_truncation() => io::Error::new(io::ErrorKind::UnexpectedEof, other),
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = OxiSitError::invalid_magic(b"As".to_vec(), b"Ax".to_vec());
        assert!(err.to_string().contains("Invalid magic"));

        let err = OxiSitError::crc_mismatch(0x12345678, 0xDEADBEEF);
        assert!(err.to_string().contains("CRC mismatch"));

        let err = OxiSitError::unsupported_method("Deflate (14)");
        assert!(err.to_string().contains("Deflate (14)"));

        let err = OxiSitError::invalid_transform_index(600, 512);
        assert!(err.to_string().contains("600"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: OxiSitError = io_err.into();
        assert!(matches!(err, OxiSitError::Io(_)));
    }

    #[test]
    fn test_truncation_classification() {
        assert!(OxiSitError::unexpected_eof(1).is_truncation());
        assert!(OxiSitError::truncated(3, 10).is_truncation());
        assert!(!OxiSitError::block_overflow(512).is_truncation());

        let io_err: io::Error = OxiSitError::truncated(3, 10).into();
        assert_eq!(io_err.kind(), io::ErrorKind::UnexpectedEof);

        let io_err: io::Error = OxiSitError::invalid_huffman(7).into();
        assert_eq!(io_err.kind(), io::ErrorKind::InvalidData);
    }
}
