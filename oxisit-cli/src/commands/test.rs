//! Test command implementation.
//!
//! Every fork is decoded into a sink. Forks are independent, so they are
//! spread over a rayon pool; each worker reads through its own file handle.

use crate::utils::open_archive;
use oxisit_archive::read_fork;
use oxisit_core::config::{ChecksumStatus, DecodeConfig};
use oxisit_core::entry::{CompressionMethod, Entry, ForkKind};
use rayon::prelude::*;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

/// Result of decoding one fork.
#[derive(Debug)]
enum Outcome {
    Passed(ChecksumStatus),
    Mismatch(ChecksumStatus),
    Failed(String),
    Encrypted,
}

struct ForkResult<'a> {
    entry: &'a Entry,
    kind: ForkKind,
    method: CompressionMethod,
    outcome: Outcome,
}

/// Forks worth decoding: every data fork, plus resource forks that exist.
fn work_items(entries: &[Entry]) -> Vec<(&Entry, ForkKind)> {
    entries
        .iter()
        .filter(|e| !e.is_dir())
        .flat_map(|e| {
            let rsrc = e.resource.is_some().then_some((e, ForkKind::Resource));
            std::iter::once((e, ForkKind::Data)).chain(rsrc)
        })
        .collect()
}

fn test_fork(
    handle: &mut io::Result<BufReader<File>>,
    entry: &Entry,
    kind: ForkKind,
    config: &DecodeConfig,
) -> Outcome {
    if entry.encrypted {
        return Outcome::Encrypted;
    }
    let reader = match handle.as_mut() {
        Ok(reader) => reader,
        Err(e) => return Outcome::Failed(e.to_string()),
    };
    match read_fork(reader, entry, kind, &mut io::sink(), config) {
        Ok(report) if report.checksum.is_ok() => Outcome::Passed(report.checksum),
        Ok(report) => Outcome::Mismatch(report.checksum),
        Err(e) => Outcome::Failed(e.to_string()),
    }
}

pub fn cmd_test(
    archive: &Path,
    verbose: bool,
    jobs: Option<usize>,
    config: DecodeConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let sit = open_archive(archive, config)?;
    println!("Testing {} ({})", archive.display(), sit.format());

    let items = work_items(sit.entries());
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs.unwrap_or(0))
        .build()?;
    log::debug!(
        "testing {} forks on {} threads",
        items.len(),
        pool.current_num_threads()
    );

    let results: Vec<ForkResult> = pool.install(|| {
        items
            .par_iter()
            .map_init(
                || File::open(archive).map(BufReader::new),
                |handle, &(entry, kind)| ForkResult {
                    entry,
                    kind,
                    method: entry.fork(kind).map_or(CompressionMethod::None, |f| f.method),
                    outcome: test_fork(handle, entry, kind, &config),
                },
            )
            .collect()
    });

    let mut ok_count = 0usize;
    let mut mismatch_count = 0usize;
    let mut encrypted_count = 0usize;
    let mut errors: Vec<String> = Vec::new();

    for result in &results {
        let label = format!("{} ({} fork, {})", result.entry.name, result.kind, result.method);
        match &result.outcome {
            Outcome::Passed(status) => {
                ok_count += 1;
                if verbose {
                    println!("  OK: {} [crc {}]", label, status);
                }
            }
            Outcome::Mismatch(status) => {
                mismatch_count += 1;
                errors.push(format!("{}: checksum {}", label, status));
                if verbose {
                    println!("  FAILED: {} - checksum {}", label, status);
                }
            }
            Outcome::Failed(e) => {
                errors.push(format!("{}: {}", label, e));
                if verbose {
                    println!("  FAILED: {} - {}", label, e);
                }
            }
            Outcome::Encrypted => {
                encrypted_count += 1;
                if verbose {
                    println!("  SKIPPED: {} - encrypted", label);
                }
            }
        }
    }

    println!();
    println!("Test results:");
    println!("  Total forks: {}", results.len());
    println!("  OK: {}", ok_count);
    println!("  Failed: {}", errors.len());
    if mismatch_count > 0 {
        println!("  CRC mismatches: {}", mismatch_count);
    }
    if encrypted_count > 0 {
        println!("  Skipped (encrypted): {}", encrypted_count);
    }

    if !errors.is_empty() && !verbose {
        println!();
        println!("Errors:");
        for err in &errors {
            println!("  {}", err);
        }
    }

    if !errors.is_empty() {
        std::process::exit(2);
    }

    println!();
    println!("All forks OK");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxisit_core::entry::ForkInfo;

    #[test]
    fn test_work_items() {
        let mut with_rsrc = Entry::file("a");
        with_rsrc.data = Some(ForkInfo::default());
        with_rsrc.resource = Some(ForkInfo::default());
        let mut plain = Entry::file("b");
        plain.data = Some(ForkInfo::default());
        let entries = vec![Entry::directory("Docs"), with_rsrc, plain];

        let items: Vec<(&str, ForkKind)> = work_items(&entries)
            .into_iter()
            .map(|(e, k)| (e.name.as_str(), k))
            .collect();
        assert_eq!(
            items,
            [
                ("a", ForkKind::Data),
                ("a", ForkKind::Resource),
                ("b", ForkKind::Data)
            ]
        );
    }

    #[test]
    fn test_encrypted_fork_is_skipped() {
        let mut entry = Entry::file("locked");
        entry.encrypted = true;
        let mut handle = Err(io::Error::other("unused"));
        let outcome = test_fork(&mut handle, &entry, ForkKind::Data, &DecodeConfig::DEFAULT);
        assert!(matches!(outcome, Outcome::Encrypted));
    }
}
