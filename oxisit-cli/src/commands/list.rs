//! List command implementation.

use crate::utils::{filter_entries, open_archive, print_entries, unix_seconds};
use oxisit_core::config::DecodeConfig;
use oxisit_core::entry::{Entry, ForkInfo};
use serde::Serialize;
use std::path::Path;

/// JSON view of one fork.
#[derive(Debug, Serialize)]
struct ForkJson {
    method: String,
    size: u64,
    compressed_size: u64,
}

impl ForkJson {
    fn from_fork(fork: Option<ForkInfo>) -> Option<Self> {
        fork.filter(|f| f.size > 0 || f.compressed_size > 0)
            .map(|f| Self {
                method: f.method.to_string(),
                size: f.size,
                compressed_size: f.compressed_size,
            })
    }
}

/// JSON serializable entry data for archive listings.
#[derive(Debug, Serialize)]
struct EntryJson {
    name: String,
    is_dir: bool,
    size: u64,
    compressed_size: u64,
    ratio: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<ForkJson>,
    #[serde(skip_serializing_if = "Option::is_none")]
    resource: Option<ForkJson>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    creator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mtime: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
    encrypted: bool,
}

impl EntryJson {
    fn from_entry(entry: &Entry) -> Self {
        let (file_type, creator) = entry.type_creator();
        let code = |s: String| Some(s).filter(|_| !entry.is_dir());

        Self {
            name: entry.name.clone(),
            is_dir: entry.is_dir(),
            size: entry.total_size(),
            compressed_size: entry.compressed_size(),
            ratio: entry.compression_ratio(),
            data: ForkJson::from_fork(entry.data),
            resource: ForkJson::from_fork(entry.resource),
            file_type: code(file_type),
            creator: code(creator),
            mtime: unix_seconds(entry.modified),
            comment: entry.comment.clone(),
            encrypted: entry.encrypted,
        }
    }
}

/// JSON output for archive listing.
#[derive(Debug, Serialize)]
struct ArchiveListJson {
    archive: String,
    format: String,
    version: u8,
    entries: Vec<EntryJson>,
}

/// Options for listing archive contents.
pub struct ListOptions<'a> {
    pub verbose: bool,
    pub json: bool,
    pub include: &'a [String],
    pub exclude: &'a [String],
}

pub fn cmd_list(
    archive: &Path,
    options: &ListOptions,
    config: DecodeConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let sit = open_archive(archive, config)?;
    let filtered = filter_entries(sit.entries(), options.include, options.exclude);

    if options.json {
        let listing = ArchiveListJson {
            archive: archive.display().to_string(),
            format: sit.format().to_string(),
            version: sit.header().version(),
            entries: filtered.iter().map(EntryJson::from_entry).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    println!("Archive: {} ({})", archive.display(), sit.format());
    println!();
    print_entries(&filtered, options.verbose);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxisit_core::entry::CompressionMethod;

    #[test]
    fn test_entry_json() {
        let mut entry = Entry::file("Folder/Read Me");
        entry.file_type = *b"TEXT";
        entry.creator = *b"ttxt";
        entry.data = Some(ForkInfo {
            method: CompressionMethod::Lzss,
            offset: 200,
            compressed_size: 40,
            size: 100,
            crc16: 0,
        });
        entry.resource = Some(ForkInfo::default());

        let json = serde_json::to_value(EntryJson::from_entry(&entry)).unwrap();
        assert_eq!(json["name"], "Folder/Read Me");
        assert_eq!(json["data"]["method"], "LZSS (13)");
        assert_eq!(json["data"]["size"], 100);
        assert!(json.get("resource").is_none());
        assert_eq!(json["file_type"], "TEXT");
        assert_eq!(json["is_dir"], false);
    }

    #[test]
    fn test_directory_json_has_no_codes() {
        let json = serde_json::to_value(EntryJson::from_entry(&Entry::directory("Docs"))).unwrap();
        assert_eq!(json["is_dir"], true);
        assert!(json.get("file_type").is_none());
        assert!(json.get("data").is_none());
    }
}
