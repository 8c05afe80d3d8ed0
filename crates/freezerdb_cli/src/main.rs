//! freezerdb CLI
//!
//! Command-line tools for freezerdb ancient stores.
//!
//! # Commands
//!
//! - `inspect` - Display freezer statistics and segment layout
//! - `verify` - Verify every frame and the index
//! - `dump` - Print receipts for debugging
//! - `migrate` - Copy every receipt into a new freezer
//! - `rebuild-index` - Reconstruct the index from the segments

mod commands;

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// freezerdb command-line tools.
#[derive(Parser)]
#[command(name = "freezerdb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbosity level (0-4): error, warn, info, debug, trace
    #[arg(global = true, short, long, action = ArgAction::Count, default_value_t = 2)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display freezer statistics and segment layout
    Inspect {
        /// Path to the freezer directory
        path: PathBuf,

        /// Show per-segment details
        #[arg(short, long)]
        segments: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Verify checksums, decompression and the index
    Verify {
        /// Path to the freezer directory
        path: PathBuf,
    },

    /// Print receipts for debugging
    Dump {
        /// Path to the freezer directory
        path: PathBuf,

        /// First sequence number to print
        #[arg(short, long, default_value = "0")]
        start: u64,

        /// Maximum number of receipts to print
        #[arg(short, long)]
        limit: Option<u64>,

        /// Output format (hex, json)
        #[arg(short, long, default_value = "hex")]
        format: String,
    },

    /// Copy every receipt into a new freezer
    Migrate {
        /// Source freezer directory
        datadir: PathBuf,

        /// Destination directory; must not hold a freezer yet
        output: PathBuf,

        /// Codec for the new freezer (none, lz4)
        #[arg(short, long, default_value = "lz4")]
        compression: String,

        /// Segment size threshold for the new freezer, in bytes
        #[arg(short, long)]
        max_segment_size: Option<u64>,
    },

    /// Rebuild the index from the segments
    RebuildIndex {
        /// Path to the freezer directory
        path: PathBuf,
    },

    /// Show version information
    Version,
}

fn log_level(verbose: u8) -> Level {
    match verbose {
        0 => Level::ERROR,
        1 => Level::WARN,
        2 => Level::INFO,
        3 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// `RUST_LOG` takes precedence over the verbosity level.
fn log_filter(verbose: u8) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level(verbose).as_str().to_lowercase()))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(cli.verbose))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Inspect {
            path,
            segments,
            format,
        } => {
            commands::inspect::run(&path, segments, &format)?;
        }
        Commands::Verify { path } => {
            commands::verify::run(&path)?;
        }
        Commands::Dump {
            path,
            start,
            limit,
            format,
        } => {
            commands::dump::run(&path, start, limit, &format)?;
        }
        Commands::Migrate {
            datadir,
            output,
            compression,
            max_segment_size,
        } => {
            let compression = compression.parse()?;
            commands::migrate::run(&datadir, &output, compression, max_segment_size)?;
        }
        Commands::RebuildIndex { path } => {
            commands::rebuild_index::run(&path)?;
        }
        Commands::Version => {
            println!("freezerdb CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("freezerdb core v{}", freezerdb_core::VERSION);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn verbosity_is_counted() {
        let cli = Cli::parse_from(["freezerdb", "verify", "/tmp/x"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(log_level(cli.verbose), Level::INFO);
        assert!(matches!(cli.command, Commands::Verify { .. }));

        let cli = Cli::parse_from(["freezerdb", "-v", "verify", "/tmp/x"]);
        assert_eq!(log_level(cli.verbose), Level::WARN);

        let cli = Cli::parse_from(["freezerdb", "-vvv", "verify", "/tmp/x"]);
        assert_eq!(log_level(cli.verbose), Level::DEBUG);

        let cli = Cli::parse_from(["freezerdb", "verify", "/tmp/x", "-vvvv"]);
        assert_eq!(log_level(cli.verbose), Level::TRACE);
    }

    #[test]
    fn verbosity_levels() {
        let levels: Vec<Level> = (0..=5).map(log_level).collect();
        assert_eq!(
            levels,
            [
                Level::ERROR,
                Level::WARN,
                Level::INFO,
                Level::DEBUG,
                Level::TRACE,
                Level::TRACE
            ]
        );
    }

    #[test]
    fn migrate_arguments() {
        let cli = Cli::parse_from([
            "freezerdb",
            "migrate",
            "old",
            "new",
            "--compression",
            "none",
            "--max-segment-size",
            "4096",
        ]);
        match cli.command {
            Commands::Migrate {
                datadir,
                output,
                compression,
                max_segment_size,
            } => {
                assert_eq!(datadir, PathBuf::from("old"));
                assert_eq!(output, PathBuf::from("new"));
                assert_eq!(compression, "none");
                assert_eq!(max_segment_size, Some(4096));
            }
            _ => panic!("expected migrate"),
        }
    }
}
