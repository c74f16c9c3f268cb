//! Info command implementation.

use crate::utils::open_archive;
use oxisit_archive::ArchiveHeader;
use oxisit_core::config::DecodeConfig;
use oxisit_core::entry::CompressionMethod;
use std::collections::BTreeMap;
use std::path::Path;

pub fn cmd_info(archive: &Path, config: DecodeConfig) -> Result<(), Box<dyn std::error::Error>> {
    let metadata = std::fs::metadata(archive)?;
    let sit = open_archive(archive, config)?;
    let header = sit.header();

    println!("Archive Information");
    println!("===================");
    println!("File: {}", archive.display());
    println!("Format: {}", sit.format());
    println!("Size: {} bytes", metadata.len());
    println!("MIME type: {}", sit.format().mime_type());

    println!();
    println!("Header:");
    match header {
        ArchiveHeader::V1(h) => {
            println!("  Signature: {}", String::from_utf8_lossy(&h.signature));
            println!("  Version: {}", h.version);
        }
        ArchiveHeader::V5(h) => {
            println!("  Banner: {}", h.signature);
            println!("  Version: {}", h.version);
            println!("  Flags: {:#04x}", h.flags);
            println!("  Root offset: {}", h.root_offset);
        }
    }
    println!("  Root entries: {}", header.entry_count());
    println!("  Recorded size: {} bytes", header.total_size());
    if header.is_encrypted() {
        println!("  Password protected: yes");
    }
    if header.has_comments() {
        println!("  Comments: yes");
    }

    let entries = sit.entries();
    let total_size: u64 = entries.iter().map(|e| e.total_size()).sum();
    let total_compressed: u64 = entries.iter().map(|e| e.compressed_size()).sum();

    let mut methods: BTreeMap<u8, (CompressionMethod, usize)> = BTreeMap::new();
    for fork in entries
        .iter()
        .flat_map(|e| [e.data, e.resource])
        .flatten()
        .filter(|f| f.size > 0)
    {
        methods.entry(fork.method.tag()).or_insert((fork.method, 0)).1 += 1;
    }

    println!();
    println!("Contents:");
    println!("  Files: {}", entries.iter().filter(|e| !e.is_dir()).count());
    println!("  Folders: {}", entries.iter().filter(|e| e.is_dir()).count());
    println!(
        "  Resource forks: {}",
        entries
            .iter()
            .filter(|e| e.resource.is_some_and(|f| f.size > 0))
            .count()
    );
    println!(
        "  Encrypted entries: {}",
        entries.iter().filter(|e| e.encrypted).count()
    );
    println!("  Total size: {} bytes", total_size);
    println!("  Compressed size: {} bytes", total_compressed);
    if total_size > 0 {
        println!(
            "  Compression ratio: {:.1}%",
            (1.0 - total_compressed as f64 / total_size as f64) * 100.0
        );
    }

    if !methods.is_empty() {
        println!();
        println!("Methods:");
        for (method, count) in methods.values() {
            let note = if method.is_supported() { "" } else { " (unsupported)" };
            println!("  {}: {} forks{}", method, count, note);
        }
    }

    Ok(())
}
