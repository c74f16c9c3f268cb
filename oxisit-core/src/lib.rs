//! # OxiSit Core
//!
//! Core components for the OxiSit StuffIt decompression engine.
//!
//! This crate provides the building blocks shared by every codec:
//!
//! - [`bitstream`]: MSB-first and LSB-first bit readers
//! - [`ringbuffer`]: Sliding window for LZSS back-references
//! - [`crc`]: CRC-32 and CRC-16/ARC checksums
//! - [`traits`]: The pull-based [`Decompressor`] trait
//! - [`config`]: Checksum policy and output limits
//! - [`entry`]: Archive entry metadata and method tags
//! - [`error`]: Error types
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ L4: CLI                                                 │
//! │     list, extract, test, info                           │
//! ├─────────────────────────────────────────────────────────┤
//! │ L3: Container + dispatch                                │
//! │     SIT V1 / V5 headers, fork routing by method tag     │
//! ├─────────────────────────────────────────────────────────┤
//! │ L2: Codec                                               │
//! │     Stored, LZW, LZSS (method 13), Arsenic (method 15)  │
//! ├─────────────────────────────────────────────────────────┤
//! │ L1: BitStream (this crate)                              │
//! │     Bit readers, RingBuffer, CRC                        │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use oxisit_core::bitstream::LsbBitReader;
//! use oxisit_core::crc::Crc32;
//! use std::io::Cursor;
//!
//! let mut reader = LsbBitReader::new(Cursor::new(vec![0xAB, 0xCD]));
//! let bits = reader.read_bits(12).unwrap();
//! assert_eq!(bits, 0xDAB);
//!
//! let crc = Crc32::compute(b"Hello, World!");
//! assert_eq!(crc, 0xEC4AC3D0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod bitstream;
pub mod config;
pub mod crc;
pub mod entry;
pub mod error;
pub mod ringbuffer;
pub mod traits;

// Re-exports for convenience
pub use bitstream::{LsbBitReader, MsbBitReader};
pub use config::{ChecksumPolicy, ChecksumStatus, DecodeConfig};
pub use crc::{Crc16, Crc32};
pub use entry::{CompressionMethod, Entry, EntryType, ForkInfo, ForkKind};
pub use error::{OxiSitError, Result};
pub use ringbuffer::RingBuffer;
pub use traits::Decompressor;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::bitstream::{LsbBitReader, MsbBitReader};
    pub use crate::config::{ChecksumPolicy, ChecksumStatus, DecodeConfig};
    pub use crate::crc::{Crc16, Crc32};
    pub use crate::entry::{CompressionMethod, Entry, EntryType, ForkInfo, ForkKind};
    pub use crate::error::{OxiSitError, Result};
    pub use crate::ringbuffer::RingBuffer;
    pub use crate::traits::Decompressor;
}
