//! Archive entry metadata.
//!
//! A StuffIt entry is a file or folder. Files carry up to two independently
//! compressed forks (data and resource), each with its own method tag,
//! compressed range and declared uncompressed length.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Seconds between the Mac OS epoch (1904-01-01) and the Unix epoch.
pub const MAC_EPOCH_OFFSET: u64 = 2_082_844_800;

/// Compression method tag of a fork.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum CompressionMethod {
    /// No compression (stored).
    #[default]
    None,
    /// RLE90 run-length encoding (method 1).
    Rle90,
    /// LZW with 9-12 bit codes (method 2).
    Lzw,
    /// Static Huffman (method 3).
    Huffman,
    /// LZ with adaptive Huffman (method 5).
    Lzah,
    /// Fixed Huffman (method 6).
    FixedHuffman,
    /// Miller-Wegman (method 8).
    Mw,
    /// LZSS with Huffman-coded tokens (method 13).
    Lzss,
    /// Deflate (method 14).
    Deflate,
    /// Arsenic block-sorting arithmetic coder (method 15).
    Arsenic,
    /// Unknown method tag.
    Unknown(u8),
}

impl CompressionMethod {
    /// Map a raw method byte to a method.
    pub fn from_tag(tag: u8) -> Self {
        match tag {
            0 => Self::None,
            1 => Self::Rle90,
            2 => Self::Lzw,
            3 => Self::Huffman,
            5 => Self::Lzah,
            6 => Self::FixedHuffman,
            8 => Self::Mw,
            13 => Self::Lzss,
            14 => Self::Deflate,
            15 => Self::Arsenic,
            other => Self::Unknown(other),
        }
    }

    /// The raw method byte.
    pub fn tag(&self) -> u8 {
        match self {
            Self::None => 0,
            Self::Rle90 => 1,
            Self::Lzw => 2,
            Self::Huffman => 3,
            Self::Lzah => 5,
            Self::FixedHuffman => 6,
            Self::Mw => 8,
            Self::Lzss => 13,
            Self::Deflate => 14,
            Self::Arsenic => 15,
            Self::Unknown(tag) => *tag,
        }
    }

    /// Whether the decompression engine has a codec for this method.
    pub fn is_supported(&self) -> bool {
        matches!(self, Self::None | Self::Lzw | Self::Lzss | Self::Arsenic)
    }

    /// Check if this method is "stored" (no compression).
    pub fn is_stored(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Get the method name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "Stored",
            Self::Rle90 => "RLE90",
            Self::Lzw => "LZW",
            Self::Huffman => "Huffman",
            Self::Lzah => "LZAH",
            Self::FixedHuffman => "FixHuff",
            Self::Mw => "MW",
            Self::Lzss => "LZSS",
            Self::Deflate => "Deflate",
            Self::Arsenic => "Arsenic",
            Self::Unknown(_) => "Unknown",
        }
    }
}

impl std::fmt::Display for CompressionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown(id) => write!(f, "Unknown({})", id),
            _ => write!(f, "{} ({})", self.name(), self.tag()),
        }
    }
}

/// Entry type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryType {
    /// Regular file.
    #[default]
    File,
    /// Folder.
    Directory,
}

/// Which fork of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForkKind {
    /// Data fork (file contents).
    Data,
    /// Resource fork.
    Resource,
}

impl std::fmt::Display for ForkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Data => f.write_str("data"),
            Self::Resource => f.write_str("resource"),
        }
    }
}

/// Location and shape of one compressed fork inside an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ForkInfo {
    /// Compression method.
    pub method: CompressionMethod,
    /// Absolute offset of the compressed bytes.
    pub offset: u64,
    /// Compressed length.
    pub compressed_size: u64,
    /// Declared uncompressed length.
    pub size: u64,
    /// CRC-16/ARC of the uncompressed bytes (zero for Arsenic forks).
    pub crc16: u16,
}

/// An entry in a StuffIt archive.
#[derive(Debug, Clone, Default)]
pub struct Entry {
    /// Path of the entry, folders joined with `/`.
    pub name: String,
    /// The type of entry.
    pub entry_type: EntryType,
    /// Data fork, if the file has one.
    pub data: Option<ForkInfo>,
    /// Resource fork, if the file has one.
    pub resource: Option<ForkInfo>,
    /// Mac OS file type code.
    pub file_type: [u8; 4],
    /// Mac OS creator code.
    pub creator: [u8; 4],
    /// Finder flags.
    pub finder_flags: u16,
    /// Creation time.
    pub created: Option<SystemTime>,
    /// Last modification time.
    pub modified: Option<SystemTime>,
    /// Comment (V5 archives only).
    pub comment: Option<String>,
    /// Whether the entry is password protected.
    pub encrypted: bool,
}

impl Entry {
    /// Create a new file entry with no forks.
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Create a new folder entry.
    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entry_type: EntryType::Directory,
            ..Default::default()
        }
    }

    /// Check if this is a folder.
    pub fn is_dir(&self) -> bool {
        self.entry_type == EntryType::Directory
    }

    /// Get one of the forks.
    pub fn fork(&self, kind: ForkKind) -> Option<&ForkInfo> {
        match kind {
            ForkKind::Data => self.data.as_ref(),
            ForkKind::Resource => self.resource.as_ref(),
        }
    }

    /// Uncompressed size of the data fork.
    pub fn size(&self) -> u64 {
        self.data.map_or(0, |f| f.size)
    }

    /// Uncompressed size of both forks.
    pub fn total_size(&self) -> u64 {
        self.size() + self.resource.map_or(0, |f| f.size)
    }

    /// Compressed size of both forks.
    pub fn compressed_size(&self) -> u64 {
        self.data.map_or(0, |f| f.compressed_size) + self.resource.map_or(0, |f| f.compressed_size)
    }

    /// Compression ratio as a percentage saved (0.0 when empty).
    pub fn compression_ratio(&self) -> f64 {
        let total = self.total_size();
        if total == 0 {
            return 0.0;
        }
        (1.0 - self.compressed_size() as f64 / total as f64) * 100.0
    }

    /// Four-character type and creator codes, lossily decoded.
    pub fn type_creator(&self) -> (String, String) {
        (
            String::from_utf8_lossy(&self.file_type).into_owned(),
            String::from_utf8_lossy(&self.creator).into_owned(),
        )
    }

    /// Reject names that would escape the extraction directory.
    ///
    /// A folder literally named `..` or a name with a NUL byte is refused.
    pub fn validate_path(&self) -> crate::error::Result<()> {
        use crate::error::OxiSitError;
        use std::path::{Component, Path};

        let path = Path::new(&self.name);
        if path.is_absolute() {
            return Err(OxiSitError::path_traversal(&self.name));
        }
        for component in path.components() {
            match component {
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(OxiSitError::path_traversal(&self.name));
                }
                Component::Normal(s) if s.to_string_lossy().contains('\0') => {
                    return Err(OxiSitError::path_traversal(&self.name));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// Convert a Mac OS timestamp (seconds since 1904) to `SystemTime`.
///
/// Zero and dates before 1970 map to `None`.
pub fn mac_time(seconds: u32) -> Option<SystemTime> {
    let seconds = seconds as u64;
    if seconds <= MAC_EPOCH_OFFSET {
        return None;
    }
    Some(UNIX_EPOCH + Duration::from_secs(seconds - MAC_EPOCH_OFFSET))
}
