//! legacy-import: one-shot migration of published legacy CMS nodes.
//!
//! Reads published rows from a read-only legacy store, discovers which legacy
//! fields carry rich text and image references, maps them onto the
//! destination bundle's fields, ensures one destination file record per image
//! URI, and commits each node in a single transaction.
//!
//! # Usage
//!
//! ```bash
//! # Import the 10 newest published nodes
//! legacy-import
//!
//! # Import up to 50
//! legacy-import 50
//! ```
//!
//! Store locations come from `legacy-import.toml` in the working directory
//! (see [`core::config`]).
//!
//! # Failure policy
//!
//! Only an unreachable legacy store (or unusable setup) aborts the run with
//! exit code 1. Missing fields, failed file records and failed saves are
//! reported per node and the batch continues. No rows at all is a successful
//! no-op.
//!
//! # Crate Structure
//!
//! - [`core`]: errors, connections, schemas, config, audit log, output
//! - [`import`]: legacy reader, field discovery, field mapping, assets, importer

pub mod core;
pub mod import;

use crate::core::config::{self, ImportConfig};
use crate::core::error::ImportError;
use crate::core::output;
use crate::import::destination::DestinationStore;
use crate::import::importer::Importer;
use crate::import::legacy::{self, LegacyReader};

use clap::Parser;
use std::io::Write;

#[derive(Parser, Debug)]
#[clap(
    name = "legacy-import",
    version = env!("CARGO_PKG_VERSION"),
    about = "Import published legacy nodes with body text and images"
)]
pub struct Cli {
    /// Maximum number of nodes to import; non-positive values mean 10.
    #[clap(allow_negative_numbers = true)]
    pub limit: Option<i64>,
}

/// Run the full import and return the process exit code.
pub fn run_import(
    config: &ImportConfig,
    limit: Option<i64>,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> i32 {
    let limit = legacy::effective_limit(limit);
    if writeln!(out, "{}", output::banner_line(limit)).is_err() {
        return 1;
    }

    let legacy = match LegacyReader::open(&config.legacy_db) {
        Ok(reader) => reader,
        Err(e) => {
            let _ = writeln!(err, "{}", e);
            return 1;
        }
    };
    let dest = match DestinationStore::open(&config.destination_db) {
        Ok(store) => store,
        Err(e) => {
            let _ = writeln!(err, "{}", e);
            return 1;
        }
    };

    let mut importer = Importer::new(legacy, dest, config.clone());
    match importer.run(limit, out) {
        Ok(summary) => {
            log::info!(
                "import finished: fetched={} created={} skipped={} failed={}",
                summary.fetched,
                summary.created,
                summary.skipped,
                summary.failed
            );
            0
        }
        Err(e) => {
            let _ = writeln!(err, "{}", run_failure_message(&e));
            1
        }
    }
}

/// Diagnostic for an error that stopped the run after both stores opened.
fn run_failure_message(e: &ImportError) -> String {
    match e {
        ImportError::IoError(io) => format!("Transcript write failed: {}", io),
        other => format!("Legacy query failed: {}", other),
    }
}

/// Binary entry: parse arguments, load config from the working directory, import.
pub fn run() -> i32 {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let cwd = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("Cannot determine working directory: {}", e);
            return 1;
        }
    };
    let config = match config::load_config(&cwd) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return 1;
        }
    };

    let stdout = std::io::stdout();
    let stderr = std::io::stderr();
    run_import(&config, cli.limit, &mut stdout.lock(), &mut stderr.lock())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_accepts_optional_and_negative_limit() {
        assert_eq!(Cli::try_parse_from(["legacy-import"]).unwrap().limit, None);
        assert_eq!(Cli::try_parse_from(["legacy-import", "5"]).unwrap().limit, Some(5));
        assert_eq!(Cli::try_parse_from(["legacy-import", "-3"]).unwrap().limit, Some(-3));
        assert!(Cli::try_parse_from(["legacy-import", "ten"]).is_err());
    }

    #[test]
    fn transcript_write_errors_are_not_reported_as_query_failures() {
        let io = ImportError::IoError(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "stdout closed",
        ));
        let msg = run_failure_message(&io);
        assert!(msg.starts_with("Transcript write failed"), "{msg}");
        assert!(!msg.contains("Legacy query"));

        let sql = ImportError::RusqliteError(rusqlite::Error::InvalidQuery);
        assert!(run_failure_message(&sql).starts_with("Legacy query failed"));
    }
}
