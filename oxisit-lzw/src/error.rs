//! LZW-specific error types.

use oxisit_core::OxiSitError;
use thiserror::Error;

/// LZW decompression errors.
#[derive(Debug, Error)]
pub enum LzwError {
    /// A code referenced an entry the table does not hold yet.
    #[error("Invalid LZW code {code} (table holds {table_size} entries) at bit {position}")]
    InvalidCode {
        /// The code read from the stream.
        code: u16,
        /// Table size when the code was read.
        table_size: u16,
        /// Bit position after the code.
        position: u64,
    },

    /// Invalid bit width configuration.
    #[error("Invalid bit width: {min_bits}..={max_bits} (must be within 9..=15)")]
    InvalidBitWidth {
        /// Configured starting width.
        min_bits: u8,
        /// Configured maximum width.
        max_bits: u8,
    },

    /// Input ended in the middle of a code.
    #[error("Unexpected end of data at bit position {position}")]
    UnexpectedEof {
        /// Bit position where EOF occurred.
        position: u64,
    },

    /// Error from the underlying bit reader.
    #[error(transparent)]
    Core(#[from] OxiSitError),
}

/// Result type for LZW operations.
pub type Result<T> = std::result::Result<T, LzwError>;

impl From<LzwError> for OxiSitError {
    fn from(err: LzwError) -> Self {
        match err {
            LzwError::InvalidCode { position, .. } => {
                OxiSitError::corrupted(position, err.to_string())
            }
            LzwError::InvalidBitWidth { .. } => OxiSitError::invalid_header(err.to_string()),
            LzwError::UnexpectedEof { .. } => OxiSitError::unexpected_eof(1),
            LzwError::Core(e) => e,
        }
    }
}
