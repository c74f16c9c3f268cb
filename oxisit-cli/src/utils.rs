//! Utility functions for the CLI.

use glob::Pattern;
use indicatif::{ProgressBar, ProgressStyle};
use oxisit_archive::SitArchive;
use oxisit_core::config::DecodeConfig;
use oxisit_core::entry::{Entry, ForkInfo};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// An archive opened from disk.
pub type FileArchive = SitArchive<BufReader<File>>;

/// Open `path` as a StuffIt archive.
pub fn open_archive(path: &Path, config: DecodeConfig) -> oxisit_core::Result<FileArchive> {
    let file = File::open(path)?;
    SitArchive::with_config(BufReader::new(file), config)
}

/// Create a progress bar with standard styling.
pub fn create_progress_bar(len: u64, enable: bool) -> ProgressBar {
    if !enable {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len);
    let template = "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";
    if let Ok(style) = ProgressStyle::default_bar().template(template) {
        pb.set_style(style.progress_chars("█▓▒░ "));
    }
    pb
}

/// Check if a name matches the filter patterns.
/// - If include patterns are specified, the name must match at least one
/// - If exclude patterns are specified, the name must not match any
pub fn matches_filters(name: &str, include: &[String], exclude: &[String]) -> bool {
    let matches = |pattern: &String| Pattern::new(pattern).is_ok_and(|p| p.matches(name));

    if exclude.iter().any(matches) {
        return false;
    }
    include.is_empty() || include.iter().any(matches)
}

/// Filter entries based on include/exclude patterns.
pub fn filter_entries(entries: &[Entry], include: &[String], exclude: &[String]) -> Vec<Entry> {
    entries
        .iter()
        .filter(|e| matches_filters(&e.name, include, exclude))
        .cloned()
        .collect()
}

/// Seconds since the Unix epoch.
pub fn unix_seconds(time: Option<SystemTime>) -> Option<i64> {
    time.and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as i64)
}

fn method_label(fork: Option<&ForkInfo>) -> String {
    match fork {
        Some(f) if f.size > 0 || f.compressed_size > 0 => f.method.name().to_string(),
        _ => "-".to_string(),
    }
}

/// Print entries in a formatted table.
pub fn print_entries(entries: &[Entry], verbose: bool) {
    if !verbose {
        for entry in entries {
            println!("{}", entry.name);
        }
        return;
    }

    println!(
        "{:>10} {:>10} {:>10} {:>6} {:>8} {:>8} {:>4} {:>4}  Name",
        "Data", "Resource", "Packed", "Ratio", "Data", "Rsrc", "Type", "Crtr",
    );
    println!("{}", "-".repeat(80));

    let mut total_size = 0u64;
    let mut total_compressed = 0u64;
    let mut files = 0usize;

    for entry in entries {
        if entry.is_dir() {
            println!("{:>67}  d {}/", "", entry.name);
            continue;
        }

        let ratio = if entry.total_size() > 0 {
            format!("{:.1}%", entry.compression_ratio())
        } else {
            "-".to_string()
        };
        let (file_type, creator) = entry.type_creator();
        let lock = if entry.encrypted { "* " } else { "  " };

        println!(
            "{:>10} {:>10} {:>10} {:>6} {:>8} {:>8} {:>4} {:>4}  {}{}",
            entry.size(),
            entry.resource.map_or(0, |f| f.size),
            entry.compressed_size(),
            ratio,
            method_label(entry.data.as_ref()),
            method_label(entry.resource.as_ref()),
            file_type,
            creator,
            lock,
            entry.name
        );
        if let Some(comment) = &entry.comment {
            println!("{:>67}    # {}", "", comment);
        }

        total_size += entry.total_size();
        total_compressed += entry.compressed_size();
        files += 1;
    }

    println!("{}", "-".repeat(80));
    let total_ratio = if total_size > 0 {
        (1.0 - total_compressed as f64 / total_size as f64) * 100.0
    } else {
        0.0
    };
    println!(
        "{:>21} {:>10} {:>5.1}%  {} files",
        total_size, total_compressed, total_ratio, files
    );
}
