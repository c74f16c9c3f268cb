//! StuffIt archive reading.
//!
//! Both container generations are parsed up front into a flat list of
//! [`Entry`] values whose names carry the full folder path. Extraction then
//! seeks to a fork, bounds the read to its compressed length and hands it to
//! the [codec dispatcher](crate::codec).
//!
//! ## Layout
//!
//! Every integer is big-endian. Names are Mac OS Roman.
//!
//! ```text
//! V1:  [archive header 22] ([entry header 112] [rsrc fork] [data fork])*
//! V5:  [archive header 100] ... entries linked by offsets, each
//!      [entry header] [second header] [rsrc fork] [data fork]
//! ```

mod v1;
mod v5;

pub use v1::V1Header;
pub use v5::V5Header;

use crate::codec::{self, DecodeReport};
use crate::detect::ArchiveFormat;
use encoding_rs::MACINTOSH;
use oxisit_core::config::{ChecksumPolicy, ChecksumStatus, DecodeConfig};
use oxisit_core::crc::Crc16;
use oxisit_core::entry::{CompressionMethod, Entry, ForkKind};
use oxisit_core::error::{OxiSitError, Result};
use std::io::{self, Read, Seek, SeekFrom, Write};

/// Parsed archive header, resolved once when the archive is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveHeader {
    /// Classic archive header.
    V1(V1Header),
    /// StuffIt 5 archive header.
    V5(V5Header),
}

impl ArchiveHeader {
    /// Container format.
    pub fn format(&self) -> ArchiveFormat {
        match self {
            Self::V1(_) => ArchiveFormat::SitV1,
            Self::V5(_) => ArchiveFormat::SitV5,
        }
    }

    /// Version byte stored in the header.
    pub fn version(&self) -> u8 {
        match self {
            Self::V1(h) => h.version,
            Self::V5(h) => h.version,
        }
    }

    /// Number of entries in the root folder.
    pub fn entry_count(&self) -> u16 {
        match self {
            Self::V1(h) => h.entry_count,
            Self::V5(h) => h.root_count,
        }
    }

    /// Archive size recorded in the header.
    pub fn total_size(&self) -> u32 {
        match self {
            Self::V1(h) => h.total_size,
            Self::V5(h) => h.total_size,
        }
    }

    /// Raw header flags (always 0 for V1).
    pub fn flags(&self) -> u8 {
        match self {
            Self::V1(_) => 0,
            Self::V5(h) => h.flags,
        }
    }

    /// Whether the archive as a whole is password protected.
    pub fn is_encrypted(&self) -> bool {
        matches!(self, Self::V5(h) if h.is_encrypted())
    }

    /// Whether entries may carry comments.
    pub fn has_comments(&self) -> bool {
        matches!(self, Self::V5(h) if h.has_comments())
    }
}

/// A StuffIt archive opened for listing and extraction.
pub struct SitArchive<R: Read + Seek> {
    reader: R,
    header: ArchiveHeader,
    entries: Vec<Entry>,
    config: DecodeConfig,
}

impl<R: Read + Seek> SitArchive<R> {
    /// Open an archive with the default decoding configuration.
    pub fn open(reader: R) -> Result<Self> {
        Self::with_config(reader, DecodeConfig::default())
    }

    /// Open an archive, detecting its version and reading every entry header.
    pub fn with_config(mut reader: R, config: DecodeConfig) -> Result<Self> {
        let stream_len = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;

        let (format, magic) = ArchiveFormat::detect(&mut reader)?;
        reader.seek(SeekFrom::Start(0))?;

        let (header, entries) = match format {
            ArchiveFormat::SitV1 => {
                let header = V1Header::read(&mut reader)?;
                let entries = v1::read_entries(&mut reader, &header, stream_len)?;
                (ArchiveHeader::V1(header), entries)
            }
            ArchiveFormat::SitV5 => {
                let header = V5Header::read(&mut reader)?;
                let entries = v5::read_entries(&mut reader, &header, stream_len)?;
                (ArchiveHeader::V5(header), entries)
            }
            ArchiveFormat::Unknown => {
                let found = &magic[..magic.len().min(4)];
                return Err(OxiSitError::invalid_magic(*b"SIT!", found));
            }
        };

        log::debug!(
            "opened {} archive: {} entries, {} bytes",
            format,
            entries.len(),
            stream_len
        );

        Ok(Self {
            reader,
            header,
            entries,
            config,
        })
    }

    /// Archive header.
    pub fn header(&self) -> &ArchiveHeader {
        &self.header
    }

    /// Container format.
    pub fn format(&self) -> ArchiveFormat {
        self.header.format()
    }

    /// All entries, folders included, in archive order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Find an entry by its full path.
    pub fn entry(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Decoding configuration used for extraction.
    pub fn config(&self) -> &DecodeConfig {
        &self.config
    }

    /// Replace the decoding configuration.
    pub fn set_config(&mut self, config: DecodeConfig) {
        self.config = config;
    }

    /// Give back the underlying reader.
    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Decode one fork of `entry` into `writer`.
    ///
    /// See [`read_fork`].
    pub fn extract_fork<W: Write + ?Sized>(
        &mut self,
        entry: &Entry,
        kind: ForkKind,
        writer: &mut W,
    ) -> Result<DecodeReport> {
        read_fork(&mut self.reader, entry, kind, writer, &self.config)
    }

    /// Decode one fork of `entry` into memory.
    pub fn extract_to_vec(&mut self, entry: &Entry, kind: ForkKind) -> Result<Vec<u8>> {
        let size = entry.fork(kind).map_or(0, |f| f.size);
        let mut data = Vec::with_capacity(usize::try_from(size).unwrap_or(0).min(1 << 24));
        self.extract_fork(entry, kind, &mut data)?;
        Ok(data)
    }

    /// Decode the data fork of the entry named `name`.
    pub fn extract_by_name(&mut self, name: &str) -> Result<Vec<u8>> {
        let entry = self
            .entry(name)
            .cloned()
            .ok_or_else(|| OxiSitError::entry_not_found(name))?;
        self.extract_to_vec(&entry, ForkKind::Data)
    }
}

/// Decode one fork of `entry` from `reader` into `writer`.
///
/// `entry` must come from an archive read over the same bytes; this is what
/// lets several workers decode forks through their own handles. A missing
/// fork produces nothing. The fork's CRC-16 is compared under the configured
/// policy, except for Arsenic forks which carry their own CRC-32.
pub fn read_fork<R: Read + Seek, W: Write + ?Sized>(
    reader: &mut R,
    entry: &Entry,
    kind: ForkKind,
    writer: &mut W,
    config: &DecodeConfig,
) -> Result<DecodeReport> {
    if entry.encrypted {
        return Err(OxiSitError::encrypted(entry.name.clone()));
    }
    let Some(fork) = entry.fork(kind).copied() else {
        return Ok(DecodeReport::empty(CompressionMethod::None));
    };

    log::debug!(
        "extracting {} fork of {}: {} at offset {}, {} -> {} bytes",
        kind,
        entry.name,
        fork.method,
        fork.offset,
        fork.compressed_size,
        fork.size
    );

    reader.seek(SeekFrom::Start(fork.offset))?;
    let source = reader.by_ref().take(fork.compressed_size);
    let mut output = Crc16Writer::new(writer);
    let mut report = codec::decompress(source, fork.method, fork.size, &mut output, config)?;

    if fork.method != CompressionMethod::Arsenic && config.checksum.is_checked() {
        let computed = output.crc.value();
        report.checksum = ChecksumStatus::compare(fork.crc16 as u32, computed as u32);
        if !report.checksum.is_ok() {
            if config.checksum == ChecksumPolicy::Enforce {
                return Err(OxiSitError::crc_mismatch(fork.crc16 as u32, computed as u32));
            }
            log::warn!(
                "{} fork of {}: CRC-16 {:#06x}, expected {:#06x}",
                kind,
                entry.name,
                computed,
                fork.crc16
            );
        }
    }

    Ok(report)
}

/// Forwards writes while accumulating a CRC-16 of everything written.
struct Crc16Writer<'w, W: Write + ?Sized> {
    inner: &'w mut W,
    crc: Crc16,
}

impl<'w, W: Write + ?Sized> Crc16Writer<'w, W> {
    fn new(inner: &'w mut W) -> Self {
        Self {
            inner,
            crc: Crc16::new(),
        }
    }
}

impl<W: Write + ?Sized> Write for Crc16Writer<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.crc.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Decode a Mac OS Roman name. `/` would split a path, so it becomes `_`.
pub(crate) fn decode_name(bytes: &[u8]) -> String {
    let (name, _) = MACINTOSH.decode_without_bom_handling(bytes);
    name.replace('/', "_")
}

/// Path of `name` inside the folder at `parent` (empty for the root).
pub(crate) fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}

pub(crate) fn be_u16(buf: &[u8], at: usize) -> u16 {
    u16::from_be_bytes([buf[at], buf[at + 1]])
}

pub(crate) fn be_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

pub(crate) fn four_cc(buf: &[u8], at: usize) -> [u8; 4] {
    [buf[at], buf[at + 1], buf[at + 2], buf[at + 3]]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_mac_roman() {
        // 0x8E is e-acute, 0xA5 a bullet.
        assert_eq!(decode_name(b"Caf\x8E"), "Café");
        assert_eq!(decode_name(b"\xA5 Notes"), "• Notes");
        assert_eq!(decode_name(b"A/B"), "A_B");
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("", "file"), "file");
        assert_eq!(join_path("a/b", "file"), "a/b/file");
    }

    #[test]
    fn test_crc16_writer() {
        let mut out = Vec::new();
        let mut writer = Crc16Writer::new(&mut out);
        writer.write_all(b"1234").unwrap();
        writer.write_all(b"56789").unwrap();
        assert_eq!(writer.crc.value(), 0xBB3D);
        assert_eq!(out, b"123456789");
    }

    #[test]
    fn test_big_endian_helpers() {
        let buf = [0x12, 0x34, 0x56, 0x78, b'T', b'E', b'X', b'T'];
        assert_eq!(be_u16(&buf, 1), 0x3456);
        assert_eq!(be_u32(&buf, 0), 0x1234_5678);
        assert_eq!(&four_cc(&buf, 4), b"TEXT");
    }

    #[test]
    fn test_unknown_format_rejected() {
        let data = b"PK\x03\x04 definitely not stuffit".to_vec();
        let err = SitArchive::open(io::Cursor::new(data)).err().unwrap();
        assert!(matches!(err, OxiSitError::InvalidMagic { .. }));
    }
}
