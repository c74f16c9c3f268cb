//! Detect command implementation.

use oxisit_archive::ArchiveFormat;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub fn cmd_detect(file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let f = File::open(file)?;
    let mut reader = BufReader::new(f);

    let (format, magic) = ArchiveFormat::detect(&mut reader)?;

    println!("File: {}", file.display());
    println!("Format: {}", format);
    println!("Magic bytes: {:02X?}", &magic[..magic.len().min(16)]);
    if let Some(version) = format.version() {
        println!("Extension: .{}", format.extension());
        println!("MIME type: {}", format.mime_type());
        println!("Container version: {}", version);
    }

    Ok(())
}
