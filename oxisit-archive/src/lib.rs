//! # OxiSit Archive
//!
//! StuffIt container support for OxiSit.
//!
//! - **Detection**: classic (`SIT!`, `ST46`, ... with `rLau`) and StuffIt 5
//!   (`StuffIt (c)1997-...` banner) signatures
//! - **Classic archives**: flat entry headers with folder start/end markers
//! - **StuffIt 5 archives**: linked entry headers with nested folders
//! - **Codec dispatch**: stored, LZW (method 2), LZSS (method 13) and
//!   Arsenic (method 15)
//!
//! ## Example
//!
//! ```rust,no_run
//! use oxisit_archive::SitArchive;
//! use oxisit_core::ForkKind;
//! use std::fs::File;
//! use std::io::BufReader;
//!
//! let file = BufReader::new(File::open("archive.sit").unwrap());
//! let mut archive = SitArchive::open(file).unwrap();
//! let entries = archive.entries().to_vec();
//! for entry in entries.iter().filter(|e| !e.is_dir()) {
//!     let data = archive.extract_to_vec(entry, ForkKind::Data).unwrap();
//!     println!("{}: {} bytes", entry.name, data.len());
//! }
//! ```
//!
//! ## Format Detection
//!
//! Use [`detect::ArchiveFormat`] to tell the two container generations apart
//! from their leading bytes.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod codec;
pub mod detect;
pub mod sit;

// Re-exports
pub use codec::{DecodeReport, ForkReader, StoredDecoder, decompress, decompress_to_vec, open_decoder};
pub use detect::ArchiveFormat;
pub use sit::{ArchiveHeader, SitArchive, V1Header, V5Header, read_fork};
