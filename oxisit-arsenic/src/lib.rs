//! # OxiSit Arsenic
//!
//! Pure Rust decoder for StuffIt compression method 15 ("Arsenic"), a
//! block-sorting compressor:
//!
//! 1. **Adaptive arithmetic coding** (26-bit) over small frequency models
//! 2. **Move-to-front ranks**, with zero runs sent as bijective base-2 digits
//! 3. **Burrows-Wheeler transform** per block (512 B to 16 MB)
//! 4. **Optional randomization**: the low bit of scheduled bytes is flipped
//! 5. **Run-length coding**: four equal bytes are followed by a repeat count
//!
//! The stream ends with a CRC-32 of the decoded output.
//!
//! ## Example
//!
//! ```rust
//! use oxisit_arsenic::decompress;
//!
//! // "As", 512-byte blocks, one block holding the single byte 0x01.
//! let data = [0x42, 0xc1, 0xc3, 0x63, 0x7c, 0xfb, 0x83, 0xad, 0xca, 0x11, 0xe3, 0xcc, 0x00];
//! assert_eq!(decompress(&data, 1).unwrap(), vec![0x01]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod bwt;
pub mod coder;
mod decoder;
#[cfg(any(test, feature = "fixture"))]
pub mod fixture;
pub mod model;
pub mod mtf;
pub mod tables;

pub use coder::ArithmeticDecoder;
pub use decoder::ArsenicDecoder;
pub use model::FrequencyModel;
pub use mtf::MtfTable;

use oxisit_core::error::Result;
use oxisit_core::traits::Decompressor;

/// Decompress up to `uncompressed_size` bytes and check the stream CRC.
///
/// A CRC mismatch is logged, not returned; use [`ArsenicDecoder::with_checksum`]
/// to enforce it.
pub fn decompress(data: &[u8], uncompressed_size: usize) -> Result<Vec<u8>> {
    let mut decoder = ArsenicDecoder::new(data)?;
    let output = decoder.decompress_all(uncompressed_size)?;
    decoder.finish()?;
    Ok(output)
}
