//! StuffIt 5 archives.
//!
//! Entries form linked lists: each header records the offset of its next
//! sibling, and a folder header records where its first child lives and how
//! many children it has. File entries carry a second header with the Finder
//! info and the resource fork description.

use super::{be_u16, be_u32, decode_name, four_cc, join_path};
use crate::detect::V5_SIGNATURE_PREFIX;
use oxisit_core::crc::Crc16;
use oxisit_core::entry::{CompressionMethod, Entry, ForkInfo, mac_time};
use oxisit_core::error::{OxiSitError, Result};
use std::collections::HashSet;
use std::io::{Read, Seek, SeekFrom};

/// Archive header size.
pub const HEADER_SIZE: usize = 100;
/// Length of the text banner that opens the archive.
pub const SIGNATURE_SIZE: usize = 80;
/// Fixed part of every entry header.
pub const ENTRY_HEADER_SIZE: usize = 34;

/// Archive flag: entries may carry comments.
pub const FLAG_COMMENTS: u8 = 0x20;
/// Archive flag: the archive is password protected.
pub const FLAG_ENCRYPTED: u8 = 0x80;

const ENTRY_MAGIC: u32 = 0xA5A5_A5A5;
const ENTRY_ENCRYPTED: u8 = 0x20;
const ENTRY_DIRECTORY: u8 = 0x40;
const HAS_RESOURCE_FORK: u16 = 0x0001;
const END_MARKER: u32 = 0xFFFF_FFFF;
const FILE_FIELDS: usize = 14;
const DIRECTORY_FIELDS: usize = 14;
const FORK_FIELDS: usize = 14;
const FINDER_FIELDS: usize = 14;
const MAX_DEPTH: usize = 64;

/// StuffIt 5 archive header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct V5Header {
    /// Text banner, e.g. `StuffIt (c)1997-2002 Aladdin Systems, ...`.
    pub signature: String,
    /// Format version (5).
    pub version: u8,
    /// Archive flags.
    pub flags: u8,
    /// Size of the whole archive.
    pub total_size: u32,
    /// Entries in the root folder.
    pub root_count: u16,
    /// Offset of the first root entry.
    pub root_offset: u32,
    /// Stored header CRC-16.
    pub crc: u16,
}

impl V5Header {
    /// Parse a header.
    pub fn parse(buf: &[u8; HEADER_SIZE]) -> Result<Self> {
        if !buf.starts_with(V5_SIGNATURE_PREFIX) {
            return Err(OxiSitError::invalid_magic(
                V5_SIGNATURE_PREFIX,
                &buf[..V5_SIGNATURE_PREFIX.len()],
            ));
        }

        let version = buf[82];
        if version != 5 {
            return Err(OxiSitError::invalid_header(format!(
                "unsupported StuffIt 5 version {}",
                version
            )));
        }

        let signature = String::from_utf8_lossy(&buf[..SIGNATURE_SIZE])
            .trim_end()
            .to_string();

        Ok(Self {
            signature,
            version,
            flags: buf[83],
            total_size: be_u32(buf, 84),
            root_count: be_u16(buf, 92),
            root_offset: be_u32(buf, 94),
            crc: be_u16(buf, 98),
        })
    }

    /// Read and parse a header.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let mut buf = [0u8; HEADER_SIZE];
        reader.read_exact(&mut buf)?;
        Self::parse(&buf)
    }

    /// Whether entries may carry comments.
    pub fn has_comments(&self) -> bool {
        self.flags & FLAG_COMMENTS != 0
    }

    /// Whether the archive is password protected.
    pub fn is_encrypted(&self) -> bool {
        self.flags & FLAG_ENCRYPTED != 0
    }
}

/// Entry header fields shared by files and folders.
struct EntryHeader {
    version: u8,
    flags: u8,
    created: u32,
    modified: u32,
    next: u32,
    name_len: usize,
    /// Bytes following the fixed part, up to the header size.
    body: Vec<u8>,
}

/// Walks the sibling lists, refusing to visit an offset twice.
struct Walker<'a, R> {
    reader: &'a mut R,
    header: &'a V5Header,
    stream_len: u64,
    visited: HashSet<u64>,
    entries: Vec<Entry>,
}

impl<R: Read + Seek> Walker<'_, R> {
    fn read_header(&mut self, offset: u64) -> Result<EntryHeader> {
        if offset + ENTRY_HEADER_SIZE as u64 > self.stream_len {
            return Err(OxiSitError::invalid_header(format!(
                "entry offset {} is past the end of the archive",
                offset
            )));
        }

        self.reader.seek(SeekFrom::Start(offset))?;
        let mut raw = vec![0u8; ENTRY_HEADER_SIZE];
        self.reader.read_exact(&mut raw)?;

        if be_u32(&raw, 0) != ENTRY_MAGIC {
            return Err(OxiSitError::invalid_header(format!(
                "no entry magic at offset {}",
                offset
            )));
        }
        let header_size = be_u16(&raw, 6) as usize;
        if header_size < ENTRY_HEADER_SIZE {
            return Err(OxiSitError::invalid_header(format!(
                "entry header at offset {} is {} bytes",
                offset, header_size
            )));
        }
        raw.resize(header_size, 0);
        self.reader.read_exact(&mut raw[ENTRY_HEADER_SIZE..])?;

        let stored = be_u16(&raw, 32);
        raw[32] = 0;
        raw[33] = 0;
        let computed = Crc16::compute(&raw);
        if stored != computed {
            log::warn!(
                "entry header at offset {}: CRC-16 {:#06x}, expected {:#06x}",
                offset,
                computed,
                stored
            );
        }

        Ok(EntryHeader {
            version: raw[4],
            flags: raw[9],
            created: be_u32(&raw, 10),
            modified: be_u32(&raw, 14),
            next: be_u32(&raw, 22),
            name_len: be_u16(&raw, 30) as usize,
            body: raw.split_off(ENTRY_HEADER_SIZE),
        })
    }

    fn walk(&mut self, first: u64, count: u16, parent: &str, depth: usize) -> Result<()> {
        if depth > MAX_DEPTH {
            return Err(OxiSitError::invalid_header(format!(
                "folders nested deeper than {}",
                MAX_DEPTH
            )));
        }

        let mut offset = first;
        let mut remaining = count;
        while remaining > 0 {
            if !self.visited.insert(offset) {
                log::warn!("entry offset {} reached twice, stopping", offset);
                break;
            }

            let entry = self.read_header(offset)?;
            if entry.flags & ENTRY_DIRECTORY != 0 {
                if self.read_directory(&entry, offset, parent, depth)? {
                    remaining -= 1;
                }
            } else {
                self.read_file(&entry, offset, parent)?;
                remaining -= 1;
            }
            offset = entry.next as u64;
        }
        Ok(())
    }

    /// Returns false for an end-of-folder marker.
    fn read_directory(
        &mut self,
        entry: &EntryHeader,
        offset: u64,
        parent: &str,
        depth: usize,
    ) -> Result<bool> {
        let body = &entry.body;
        if body.len() < DIRECTORY_FIELDS + entry.name_len {
            return Err(OxiSitError::invalid_header(format!(
                "folder header at offset {} is too short",
                offset
            )));
        }

        let first_child = be_u32(body, 0);
        let child_count = be_u16(body, 12);
        let name = decode_name(&body[DIRECTORY_FIELDS..DIRECTORY_FIELDS + entry.name_len]);
        if name.is_empty() || first_child == END_MARKER {
            log::debug!("end-of-folder marker at offset {}", offset);
            return Ok(false);
        }

        let path = join_path(parent, &name);
        log::debug!(
            "V5 folder {:?} at offset {}: {} children at {}",
            path,
            offset,
            child_count,
            first_child
        );

        let mut folder = Entry::directory(path.clone());
        folder.created = mac_time(entry.created);
        folder.modified = mac_time(entry.modified);
        folder.encrypted = entry.flags & ENTRY_ENCRYPTED != 0;
        self.entries.push(folder);

        self.walk(first_child as u64, child_count, &path, depth + 1)?;
        Ok(true)
    }

    fn read_file(&mut self, entry: &EntryHeader, offset: u64, parent: &str) -> Result<()> {
        let body = &entry.body;
        let too_short = || {
            OxiSitError::invalid_header(format!("file header at offset {} is too short", offset))
        };
        if body.len() < FILE_FIELDS {
            return Err(too_short());
        }

        let data_size = be_u32(body, 0);
        let data_compressed = be_u32(body, 4);
        let data_crc = be_u16(body, 8);
        let data_method = body[12];
        let password_len = body[13] as usize;

        let name_start = FILE_FIELDS + password_len;
        let name_end = name_start + entry.name_len;
        if body.len() < name_end {
            return Err(too_short());
        }
        let name = decode_name(&body[name_start..name_end]);

        let comment = if self.header.has_comments() && name_end < body.len() {
            let len = body[name_end] as usize;
            let text = &body[name_end + 1..(name_end + 1 + len).min(body.len())];
            Some(decode_name(text)).filter(|c| !c.is_empty())
        } else {
            None
        };

        let encrypted =
            entry.flags & ENTRY_ENCRYPTED != 0 || self.header.is_encrypted() || password_len > 0;

        // Second header, directly after the first.
        let mut finder = [0u8; FINDER_FIELDS];
        self.reader.read_exact(&mut finder)?;
        let fork_flags = be_u16(&finder, 0);
        let skip = if entry.version == 1 { 22 } else { 18 };
        self.reader.seek(SeekFrom::Current(skip))?;

        let mut resource = None;
        if fork_flags & HAS_RESOURCE_FORK != 0 {
            let mut fields = [0u8; FORK_FIELDS];
            self.reader.read_exact(&mut fields)?;
            if encrypted {
                self.reader.seek(SeekFrom::Current(fields[13] as i64))?;
            }
            resource = Some(fields);
        }
        let data_start = self.reader.stream_position()?;

        let mut file = Entry::file(join_path(parent, &name));
        let mut rsrc_compressed = 0u64;
        if let Some(fields) = resource {
            rsrc_compressed = be_u32(&fields, 4) as u64;
            file.resource = Some(ForkInfo {
                method: CompressionMethod::from_tag(fields[12]),
                offset: data_start,
                compressed_size: rsrc_compressed,
                size: be_u32(&fields, 0) as u64,
                crc16: be_u16(&fields, 8),
            });
        }
        file.data = Some(ForkInfo {
            method: CompressionMethod::from_tag(data_method),
            offset: data_start + rsrc_compressed,
            compressed_size: data_compressed as u64,
            size: data_size as u64,
            crc16: data_crc,
        });
        file.file_type = four_cc(&finder, 4);
        file.creator = four_cc(&finder, 8);
        file.finder_flags = be_u16(&finder, 12);
        file.created = mac_time(entry.created);
        file.modified = mac_time(entry.modified);
        file.comment = comment;
        file.encrypted = encrypted;

        log::debug!(
            "V5 file {:?} at offset {}, forks at {}",
            file.name,
            offset,
            data_start
        );
        self.entries.push(file);
        Ok(())
    }
}

/// Read every entry reachable from the root folder.
pub(crate) fn read_entries<R: Read + Seek>(
    reader: &mut R,
    header: &V5Header,
    stream_len: u64,
) -> Result<Vec<Entry>> {
    if header.total_size as u64 > stream_len {
        log::warn!(
            "archive records {} bytes but only {} are present",
            header.total_size,
            stream_len
        );
    }

    let mut walker = Walker {
        reader,
        header,
        stream_len,
        visited: HashSet::new(),
        entries: Vec::with_capacity(header.root_count as usize),
    };
    walker.walk(header.root_offset as u64, header.root_count, "", 0)?;
    Ok(walker.entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BANNER: &[u8; 80] =
        b"StuffIt (c)1997-2002 Aladdin Systems, Inc., http://www.aladdinsys.com/StuffIt/\r\n";

    fn header_bytes(flags: u8, root_count: u16, root_offset: u32) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[..80].copy_from_slice(BANNER);
        buf[82] = 5;
        buf[83] = flags;
        buf[84..88].copy_from_slice(&1000u32.to_be_bytes());
        buf[92..94].copy_from_slice(&root_count.to_be_bytes());
        buf[94..98].copy_from_slice(&root_offset.to_be_bytes());
        buf
    }

    #[test]
    fn test_parse_header() {
        let header = V5Header::parse(&header_bytes(FLAG_COMMENTS, 2, 100)).unwrap();
        assert_eq!(header.version, 5);
        assert_eq!(header.root_count, 2);
        assert_eq!(header.root_offset, 100);
        assert_eq!(header.total_size, 1000);
        assert!(header.has_comments());
        assert!(!header.is_encrypted());
        assert!(header.signature.starts_with("StuffIt (c)1997-2002"));
        assert!(header.signature.ends_with("StuffIt/"));
    }

    #[test]
    fn test_wrong_version() {
        let mut buf = header_bytes(0, 0, 100);
        buf[82] = 4;
        assert!(matches!(
            V5Header::parse(&buf),
            Err(OxiSitError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn test_bad_banner() {
        let mut buf = header_bytes(0, 0, 100);
        buf[0] = b's';
        assert!(matches!(
            V5Header::parse(&buf),
            Err(OxiSitError::InvalidMagic { .. })
        ));
    }

    #[test]
    fn test_missing_entry_magic() {
        let mut bytes = header_bytes(0, 1, 100).to_vec();
        bytes.extend_from_slice(&[0u8; 64]);
        let header = V5Header::parse(&header_bytes(0, 1, 100)).unwrap();
        let len = bytes.len() as u64;
        let mut cursor = std::io::Cursor::new(bytes);
        let err = read_entries(&mut cursor, &header, len).unwrap_err();
        assert!(matches!(err, OxiSitError::InvalidHeader { .. }));
    }

    #[test]
    fn test_root_offset_past_end() {
        let header = V5Header::parse(&header_bytes(0, 1, 5000)).unwrap();
        let bytes = header_bytes(0, 1, 5000).to_vec();
        let mut cursor = std::io::Cursor::new(bytes);
        assert!(read_entries(&mut cursor, &header, HEADER_SIZE as u64).is_err());
    }

    #[test]
    fn test_empty_root() {
        let header = V5Header::parse(&header_bytes(0, 0, 100)).unwrap();
        let mut cursor = std::io::Cursor::new(header_bytes(0, 0, 100).to_vec());
        let entries = read_entries(&mut cursor, &header, HEADER_SIZE as u64).unwrap();
        assert!(entries.is_empty());
    }
}
