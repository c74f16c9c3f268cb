//! # OxiSit-LZW: StuffIt method 2
//!
//! LZW decompression as used by StuffIt archives.
//!
//! ## Format
//!
//! - **LSB-first bit order**: the first bit read lands in bit 0 of the code
//! - **9-12 bit codes**: width grows when the table size reaches 512, 1024
//!   and 2048 entries
//! - **No clear codes**: the table freezes at 4096 entries
//! - **No end code**: the caller's declared length bounds the output
//! - **No KwKwK case**: a code must name an entry the table already holds
//!
//! ## Example
//!
//! ```rust
//! use oxisit_lzw::decompress;
//!
//! // Codes 'H' and 'i', 9 bits each, LSB-first.
//! let data = [0x48, 0xD2, 0x00];
//! assert_eq!(decompress(&data, 2).unwrap(), b"Hi");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

mod config;
mod decoder;
mod dictionary;
mod error;
#[cfg(any(test, feature = "fixture"))]
pub mod fixture;

pub use config::LzwConfig;
pub use decoder::LzwDecoder;
pub use dictionary::LzwDictionary;
pub use error::{LzwError, Result};

/// Decompress exactly `expected_size` bytes of StuffIt LZW data.
///
/// Input that runs out before `expected_size` bytes is
/// [`LzwError::UnexpectedEof`].
pub fn decompress(data: &[u8], expected_size: usize) -> Result<Vec<u8>> {
    let mut decoder = LzwDecoder::stuffit(data)?;
    let mut output = vec![0u8; expected_size];
    let mut filled = 0;

    while filled < expected_size {
        let n = decoder.decode_into(&mut output[filled..])?;
        if n == 0 {
            return Err(LzwError::UnexpectedEof {
                position: data.len() as u64 * 8,
            });
        }
        filled += n;
    }

    Ok(output)
}
