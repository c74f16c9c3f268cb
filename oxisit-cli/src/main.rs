//! OxiSit CLI - StuffIt archive reader
//!
//! A Pure Rust utility for classic and StuffIt 5 archives: stored, LZW,
//! LZSS (method 13) and Arsenic (method 15) forks.

mod commands;
mod utils;

use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use commands::{
    ExtractOptions, ListOptions, cmd_completions, cmd_detect, cmd_extract, cmd_info, cmd_list,
    cmd_test,
};
use oxisit_core::config::{ChecksumPolicy, DecodeConfig};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "oxisit")]
#[command(author, version, about = "OxiSit - Pure Rust StuffIt archive reader")]
#[command(long_about = "
OxiSit reads StuffIt archives: classic (SIT!) and StuffIt 5.
Supported methods: stored, LZW (2), LZSS (13), Arsenic (15)

Examples:
  oxisit list archive.sit
  oxisit list --json archive.sit
  oxisit extract archive.sit -o out
  oxisit extract --resource-forks archive.sit
  oxisit test -j 4 archive.sit
  oxisit info archive.sit
  oxisit completions bash > oxisit.bash
")]
struct Cli {
    /// Fail on any checksum mismatch
    #[arg(long, global = true, conflicts_with = "no_crc")]
    strict_crc: bool,

    /// Skip checksum verification
    #[arg(long, global = true)]
    no_crc: bool,

    /// Refuse forks whose declared size exceeds this many bytes
    #[arg(long, global = true, value_name = "BYTES")]
    max_size: Option<u64>,

    /// Verbose output; repeat (-vv) for debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List contents of an archive
    #[command(alias = "l")]
    List {
        /// Archive file to list
        archive: PathBuf,

        /// Output as JSON (machine-readable)
        #[arg(short, long)]
        json: bool,

        /// Include only entries matching pattern (glob syntax: *.txt, Folder/*)
        #[arg(short = 'I', long)]
        include: Vec<String>,

        /// Exclude entries matching pattern (glob syntax)
        #[arg(short = 'X', long)]
        exclude: Vec<String>,
    },

    /// Extract files from an archive
    #[command(alias = "x")]
    Extract {
        /// Archive file to extract
        archive: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Entries to extract (all if empty)
        files: Vec<String>,

        /// Include only entries matching pattern (glob syntax)
        #[arg(short = 'I', long)]
        include: Vec<String>,

        /// Exclude entries matching pattern (glob syntax)
        #[arg(short = 'X', long)]
        exclude: Vec<String>,

        /// Also write resource forks as `<name>.rsrc`
        #[arg(short = 'r', long)]
        resource_forks: bool,

        /// Hide the progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// Test archive integrity
    #[command(alias = "t")]
    Test {
        /// Archive file to test
        archive: PathBuf,

        /// Worker threads (defaults to the number of CPUs)
        #[arg(short, long)]
        jobs: Option<usize>,
    },

    /// Show information about an archive
    #[command(alias = "i")]
    Info {
        /// Archive file to inspect
        archive: PathBuf,
    },

    /// Detect archive format
    Detect {
        /// File to detect
        file: PathBuf,
    },

    /// Generate shell completions
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Cli {
    fn decode_config(&self) -> DecodeConfig {
        let checksum = if self.strict_crc {
            ChecksumPolicy::Enforce
        } else if self.no_crc {
            ChecksumPolicy::Ignore
        } else {
            ChecksumPolicy::Report
        };
        let config = DecodeConfig::new().with_checksum(checksum);
        match self.max_size {
            Some(limit) => config.with_max_output(limit),
            None => config,
        }
    }
}

fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose > 1);
    let config = cli.decode_config();
    let verbose = cli.verbose > 0;

    let result = match cli.command {
        Commands::List {
            archive,
            json,
            include,
            exclude,
        } => cmd_list(
            &archive,
            &ListOptions {
                verbose,
                json,
                include: &include,
                exclude: &exclude,
            },
            config,
        ),
        Commands::Extract {
            archive,
            output,
            files,
            include,
            exclude,
            resource_forks,
            no_progress,
        } => cmd_extract(
            &archive,
            &ExtractOptions {
                output: &output,
                files: &files,
                include: &include,
                exclude: &exclude,
                resource_forks,
                verbose,
                progress: !no_progress,
            },
            config,
        ),
        Commands::Test { archive, jobs } => cmd_test(&archive, verbose, jobs, config),
        Commands::Info { archive } => cmd_info(&archive, config),
        Commands::Detect { file } => cmd_detect(&file),
        Commands::Completions { shell } => {
            cmd_completions(shell, &mut Cli::command());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_checksum_flags() {
        let cli = Cli::parse_from(["oxisit", "--strict-crc", "test", "a.sit"]);
        assert_eq!(cli.decode_config().checksum, ChecksumPolicy::Enforce);

        let cli = Cli::parse_from(["oxisit", "list", "a.sit", "--no-crc"]);
        assert_eq!(cli.decode_config().checksum, ChecksumPolicy::Ignore);

        let cli = Cli::parse_from(["oxisit", "info", "a.sit", "--max-size", "1024"]);
        let config = cli.decode_config();
        assert_eq!(config.checksum, ChecksumPolicy::Report);
        assert_eq!(config.max_output, Some(1024));
    }

    #[test]
    fn test_conflicting_checksum_flags() {
        assert!(Cli::try_parse_from(["oxisit", "--strict-crc", "--no-crc", "test", "a.sit"]).is_err());
    }

    #[test]
    fn test_verbosity_count() {
        let cli = Cli::parse_from(["oxisit", "list", "-vv", "a.sit"]);
        assert_eq!(cli.verbose, 2);
        let cli = Cli::parse_from(["oxisit", "x", "a.sit", "-o", "out", "-r"]);
        assert_eq!(cli.verbose, 0);
        assert!(matches!(cli.command, Commands::Extract { resource_forks: true, .. }));
    }
}
