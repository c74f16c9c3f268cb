//! Extract command implementation.

use crate::utils::{FileArchive, create_progress_bar, matches_filters, open_archive};
use filetime::FileTime;
use oxisit_archive::DecodeReport;
use oxisit_core::config::DecodeConfig;
use oxisit_core::entry::{Entry, ForkKind};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Options for extracting archive contents.
pub struct ExtractOptions<'a> {
    pub output: &'a Path,
    pub files: &'a [String],
    pub include: &'a [String],
    pub exclude: &'a [String],
    pub resource_forks: bool,
    pub verbose: bool,
    pub progress: bool,
}

impl ExtractOptions<'_> {
    /// Whether `name` was selected on the command line.
    fn should_extract(&self, name: &str) -> bool {
        // Naming a folder selects everything inside it.
        if !self.files.is_empty()
            && !self
                .files
                .iter()
                .any(|f| name == f || name.starts_with(&format!("{}/", f)))
        {
            return false;
        }
        matches_filters(name, self.include, self.exclude)
    }
}

/// Where the resource fork of `path` is written.
fn resource_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".rsrc");
    PathBuf::from(name)
}

/// Decode one fork into a new file, removing the file if decoding fails.
fn write_fork(
    sit: &mut FileArchive,
    entry: &Entry,
    kind: ForkKind,
    path: &Path,
) -> Result<DecodeReport, Box<dyn std::error::Error>> {
    let result = decode_to_file(sit, entry, kind, path);
    if result.is_err() && path.exists() {
        log::debug!("removing partial output {}", path.display());
        let _ = std::fs::remove_file(path);
    }
    result
}

fn decode_to_file(
    sit: &mut FileArchive,
    entry: &Entry,
    kind: ForkKind,
    path: &Path,
) -> Result<DecodeReport, Box<dyn std::error::Error>> {
    let mut writer = BufWriter::new(File::create(path)?);
    let report = sit.extract_fork(entry, kind, &mut writer)?;
    writer.flush()?;
    Ok(report)
}

fn set_mtime(path: &Path, entry: &Entry) {
    if let Some(modified) = entry.modified {
        let mtime = FileTime::from_system_time(modified);
        if let Err(e) = filetime::set_file_mtime(path, mtime) {
            log::warn!(
                "Failed to set modification time on '{}': {}",
                path.display(),
                e
            );
        }
    }
}

pub fn cmd_extract(
    archive: &Path,
    options: &ExtractOptions,
    config: DecodeConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut sit = open_archive(archive, config)?;

    println!(
        "Extracting {} to {}",
        archive.display(),
        options.output.display()
    );

    let to_extract: Vec<Entry> = sit
        .entries()
        .iter()
        .filter(|e| options.should_extract(&e.name))
        .cloned()
        .collect();

    let pb = create_progress_bar(to_extract.len() as u64, options.progress);
    pb.set_message("files");

    let mut extracted = 0usize;
    let mut skipped = 0usize;
    let mut mismatches = 0usize;

    for entry in &to_extract {
        entry.validate_path()?;
        let path = options.output.join(&entry.name);

        if entry.is_dir() {
            std::fs::create_dir_all(&path)?;
            if options.verbose {
                pb.println(format!("  Created: {}", entry.name));
            }
            pb.inc(1);
            continue;
        }

        if entry.encrypted {
            log::warn!("skipping encrypted entry {}", entry.name);
            pb.println(format!("  Skipped (encrypted): {}", entry.name));
            skipped += 1;
            pb.inc(1);
            continue;
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut forks = vec![(ForkKind::Data, path.clone())];
        if options.resource_forks && entry.resource.is_some_and(|f| f.size > 0) {
            forks.push((ForkKind::Resource, resource_path(&path)));
        }

        for (kind, fork_path) in forks {
            let report = write_fork(&mut sit, entry, kind, &fork_path).map_err(|e| {
                pb.abandon();
                format!("{} ({} fork): {}", entry.name, kind, e)
            })?;
            if !report.checksum.is_ok() {
                mismatches += 1;
                pb.println(format!(
                    "  Warning: {} ({} fork): checksum {}",
                    entry.name, kind, report.checksum
                ));
            }
            set_mtime(&fork_path, entry);
            if options.verbose {
                pb.println(format!(
                    "  Extracted: {} ({} fork, {} bytes, {})",
                    entry.name, kind, report.written, report.method
                ));
            }
        }

        extracted += 1;
        pb.inc(1);
    }
    pb.finish_with_message("Done");

    println!("Extracted {} files", extracted);
    if skipped > 0 {
        println!("Skipped {} encrypted entries", skipped);
    }
    if mismatches > 0 {
        println!("{} forks failed their checksum", mismatches);
    }

    Ok(())
}
