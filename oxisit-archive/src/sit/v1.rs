//! Classic StuffIt (V1) archives.
//!
//! Entry headers follow each other directly. Folders are bracketed by a
//! start header and an end header whose method bytes are 32 and 33.

use super::{be_u16, be_u32, decode_name, four_cc, join_path};
use crate::detect::{V1_SECOND_SIGNATURE, V1_SIGNATURES};
use oxisit_core::crc::Crc16;
use oxisit_core::entry::{CompressionMethod, Entry, ForkInfo, mac_time};
use oxisit_core::error::{OxiSitError, Result};
use std::io::{Read, Seek, SeekFrom};

/// Archive header size.
pub const HEADER_SIZE: usize = 22;
/// Entry header size.
pub const ENTRY_HEADER_SIZE: usize = 112;

const FOLDER_START: u8 = 32;
const FOLDER_END: u8 = 33;
const METHOD_MASK: u8 = 0x0F;
const ENCRYPTED: u8 = 0x10;
const MAX_NAME_LEN: usize = 63;

/// Classic archive header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct V1Header {
    /// First signature (`SIT!`, `ST46`, ...).
    pub signature: [u8; 4],
    /// Entries in the root folder.
    pub entry_count: u16,
    /// Size of the whole archive.
    pub total_size: u32,
    /// Format version.
    pub version: u8,
    /// Header size, meaningful for versions other than 1.
    pub header_size: u32,
    /// Stored header CRC-16.
    pub crc: u16,
}

impl V1Header {
    /// Parse a header.
    pub fn parse(buf: &[u8; HEADER_SIZE]) -> Result<Self> {
        let signature = four_cc(buf, 0);
        if !V1_SIGNATURES.contains(&&signature) {
            return Err(OxiSitError::invalid_magic(*b"SIT!", signature));
        }
        if &buf[10..14] != V1_SECOND_SIGNATURE {
            return Err(OxiSitError::invalid_magic(*V1_SECOND_SIGNATURE, &buf[10..14]));
        }

        Ok(Self {
            signature,
            entry_count: be_u16(buf, 4),
            total_size: be_u32(buf, 6),
            version: buf[14],
            header_size: be_u32(buf, 16),
            crc: be_u16(buf, 20),
        })
    }

    /// Read and parse a header.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let mut buf = [0u8; HEADER_SIZE];
        reader.read_exact(&mut buf)?;
        Self::parse(&buf)
    }
}

/// One 112-byte entry header.
#[derive(Debug, Clone)]
struct EntryHeader {
    rsrc_method: u8,
    data_method: u8,
    name: String,
    file_type: [u8; 4],
    creator: [u8; 4],
    finder_flags: u16,
    created: u32,
    modified: u32,
    rsrc_size: u32,
    data_size: u32,
    rsrc_compressed: u32,
    data_compressed: u32,
    rsrc_crc: u16,
    data_crc: u16,
}

impl EntryHeader {
    fn parse(buf: &[u8; ENTRY_HEADER_SIZE], offset: u64) -> Result<Self> {
        let stored = be_u16(buf, 110);
        let computed = Crc16::compute(&buf[..110]);
        if stored != computed {
            return Err(OxiSitError::invalid_header(format!(
                "entry header at offset {}: CRC-16 {:#06x}, expected {:#06x}",
                offset, computed, stored
            )));
        }

        let name_len = (buf[2] as usize).min(MAX_NAME_LEN);
        Ok(Self {
            rsrc_method: buf[0],
            data_method: buf[1],
            name: decode_name(&buf[3..3 + name_len]),
            file_type: four_cc(buf, 66),
            creator: four_cc(buf, 70),
            finder_flags: be_u16(buf, 74),
            created: be_u32(buf, 76),
            modified: be_u32(buf, 80),
            rsrc_size: be_u32(buf, 84),
            data_size: be_u32(buf, 88),
            rsrc_compressed: be_u32(buf, 92),
            data_compressed: be_u32(buf, 96),
            rsrc_crc: be_u16(buf, 100),
            data_crc: be_u16(buf, 102),
        })
    }

    fn is_folder_start(&self) -> bool {
        self.rsrc_method == FOLDER_START || self.data_method == FOLDER_START
    }

    fn is_folder_end(&self) -> bool {
        self.rsrc_method == FOLDER_END || self.data_method == FOLDER_END
    }

    fn forks_len(&self) -> u64 {
        self.rsrc_compressed as u64 + self.data_compressed as u64
    }

    fn to_entry(&self, path: String, data_start: u64) -> Entry {
        let mut entry = if self.is_folder_start() {
            Entry::directory(path)
        } else {
            let mut entry = Entry::file(path);
            if self.rsrc_size > 0 || self.rsrc_compressed > 0 {
                entry.resource = Some(ForkInfo {
                    method: CompressionMethod::from_tag(self.rsrc_method & METHOD_MASK),
                    offset: data_start,
                    compressed_size: self.rsrc_compressed as u64,
                    size: self.rsrc_size as u64,
                    crc16: self.rsrc_crc,
                });
            }
            entry.data = Some(ForkInfo {
                method: CompressionMethod::from_tag(self.data_method & METHOD_MASK),
                offset: data_start + self.rsrc_compressed as u64,
                compressed_size: self.data_compressed as u64,
                size: self.data_size as u64,
                crc16: self.data_crc,
            });
            entry.encrypted = (self.rsrc_method | self.data_method) & ENCRYPTED != 0;
            entry
        };
        entry.file_type = self.file_type;
        entry.creator = self.creator;
        entry.finder_flags = self.finder_flags;
        entry.created = mac_time(self.created);
        entry.modified = mac_time(self.modified);
        entry
    }
}

/// Read every entry header up to the archive's recorded size.
pub(crate) fn read_entries<R: Read + Seek>(
    reader: &mut R,
    header: &V1Header,
    stream_len: u64,
) -> Result<Vec<Entry>> {
    let recorded = header.total_size as u64;
    let end = if recorded < HEADER_SIZE as u64 {
        stream_len
    } else if recorded > stream_len {
        log::warn!(
            "archive records {} bytes but only {} are present",
            recorded,
            stream_len
        );
        stream_len
    } else {
        recorded
    };

    let mut entries = Vec::with_capacity(header.entry_count as usize);
    let mut folders: Vec<String> = Vec::new();
    let mut offset = HEADER_SIZE as u64;
    let mut buf = [0u8; ENTRY_HEADER_SIZE];

    while offset + ENTRY_HEADER_SIZE as u64 <= end {
        reader.seek(SeekFrom::Start(offset))?;
        reader.read_exact(&mut buf)?;
        let entry_header = EntryHeader::parse(&buf, offset)?;
        offset += ENTRY_HEADER_SIZE as u64;

        let parent = folders.last().map_or("", String::as_str);
        if entry_header.is_folder_end() {
            if folders.pop().is_none() {
                log::warn!(
                    "folder end at offset {} without a folder start",
                    offset - ENTRY_HEADER_SIZE as u64
                );
            }
            continue;
        }

        let path = join_path(parent, &entry_header.name);
        let entry = entry_header.to_entry(path.clone(), offset);
        log::debug!("V1 entry {:?} at offset {}", entry.name, offset);
        entries.push(entry);

        if entry_header.is_folder_start() {
            folders.push(path);
        } else {
            offset += entry_header.forks_len();
        }
    }

    if !folders.is_empty() {
        log::warn!("{} folders left open at end of archive", folders.len());
    }

    Ok(entries)
}
