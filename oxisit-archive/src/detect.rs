//! StuffIt format detection.
//!
//! Classic (V1) archives start with one of several four-byte signatures and
//! carry `rLau` at offset 10. StuffIt 5 archives start with an 80-byte text
//! banner.

use oxisit_core::error::Result;
use std::io::Read;

/// Classic archive signatures, one per StuffIt generation.
pub const V1_SIGNATURES: [&[u8; 4]; 9] = [
    b"SIT!", b"ST46", b"ST50", b"ST60", b"ST65", b"STin", b"STi2", b"STi3", b"STi4",
];

/// Second classic signature, at offset 10.
pub const V1_SECOND_SIGNATURE: &[u8; 4] = b"rLau";

/// Fixed start of the StuffIt 5 banner.
pub const V5_SIGNATURE_PREFIX: &[u8] = b"StuffIt (c)1997-";

/// Known StuffIt container formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// Classic StuffIt archive (.sit, StuffIt 1.5 to 4.5).
    SitV1,
    /// StuffIt 5 archive (.sit, StuffIt 5 and later).
    SitV5,
    /// Not a StuffIt archive.
    Unknown,
}

impl ArchiveFormat {
    /// Detect format from the leading bytes of a file.
    pub fn from_magic(magic: &[u8]) -> Self {
        if magic.len() >= 14
            && V1_SIGNATURES.iter().any(|sig| magic.starts_with(*sig))
            && &magic[10..14] == V1_SECOND_SIGNATURE
        {
            return Self::SitV1;
        }

        if magic.starts_with(V5_SIGNATURE_PREFIX) {
            return Self::SitV5;
        }

        Self::Unknown
    }

    /// Detect format from a reader.
    ///
    /// Returns the bytes consumed while probing.
    pub fn detect<R: Read>(reader: &mut R) -> Result<(Self, Vec<u8>)> {
        let mut magic = Vec::with_capacity(80);
        reader.take(80).read_to_end(&mut magic)?;

        let format = Self::from_magic(&magic);
        Ok((format, magic))
    }

    /// Get the typical file extension.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::SitV1 | Self::SitV5 => "sit",
            Self::Unknown => "",
        }
    }

    /// Get the MIME type.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::SitV1 | Self::SitV5 => "application/x-stuffit",
            Self::Unknown => "application/octet-stream",
        }
    }

    /// Container version number (1 or 5).
    pub fn version(&self) -> Option<u8> {
        match self {
            Self::SitV1 => Some(1),
            Self::SitV5 => Some(5),
            Self::Unknown => None,
        }
    }
}

impl std::fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SitV1 => write!(f, "StuffIt (classic)"),
            Self::SitV5 => write!(f, "StuffIt 5"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}
