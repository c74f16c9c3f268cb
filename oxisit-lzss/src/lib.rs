//! # OxiSit LZSS
//!
//! Pure Rust decoder for StuffIt compression method 13: an LZSS sliding
//! window whose literals, match lengths and offsets are Huffman coded.
//!
//! - **Window**: 64 KB
//! - **Tables**: five built-in sets, or code lengths sent in the stream
//!   through a 37-symbol meta code
//! - **Two literal/length tables**: the second is used right after a match
//! - **Bit order**: LSB-first bytes, codes matched most significant bit first
//!
//! ## Example
//!
//! ```rust
//! use oxisit_core::Decompressor;
//! use oxisit_lzss::Sit13Decoder;
//!
//! // Built-in set 1 header byte followed by nothing: asking for zero bytes
//! // reads nothing.
//! let mut decoder = Sit13Decoder::new(&[0x10u8][..]);
//! assert_eq!(decoder.decompress(&mut []).unwrap(), 0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod decoder;
#[cfg(any(test, feature = "fixture"))]
pub mod fixture;
pub mod prefix;
pub mod tables;

// Re-exports
pub use decoder::{CodeTables, Sit13Decoder, TableMode};
pub use prefix::PrefixCode;

use oxisit_core::error::Result;
use oxisit_core::traits::Decompressor;

/// Decompress up to `uncompressed_size` bytes of method 13 data.
pub fn decode_sit13(data: &[u8], uncompressed_size: usize) -> Result<Vec<u8>> {
    let mut decoder = Sit13Decoder::new(data);
    decoder.decompress_all(uncompressed_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{Sit13Writer, tokenize};

    #[test]
    fn test_decode_sit13_text() {
        let original = b"how much wood would a woodchuck chuck if a woodchuck could chuck wood";
        let mut writer = Sit13Writer::built_in(3);
        for token in tokenize(original) {
            writer.token(token);
        }
        let decoded = decode_sit13(&writer.finish(), original.len()).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_decode_stops_at_size() {
        let mut writer = Sit13Writer::built_in(1);
        writer.literals(b"0123456789");
        writer.token(fixture::Token::End);
        let decoded = decode_sit13(&writer.finish(), 4).unwrap();
        assert_eq!(decoded, b"0123");
    }
}
