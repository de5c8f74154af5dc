//! Undo Ledger CLI
//!
//! # Usage
//!
//! ```bash
//! undo-ledger register alice --password secret
//! undo-ledger deposit alice 100 --password secret
//! undo-ledger withdraw alice 30 --password secret
//! undo-ledger undo alice --password secret
//! undo-ledger statement alice --password secret
//! undo-ledger shell alice --password secret < commands.txt
//! undo-ledger replay --strategy async --batch-size 500 operations.csv > summary.csv
//! ```
//!
//! State lives in `--data-dir` (env `UNDO_LEDGER_DATA_DIR`, default
//! `ledger-data`). Logs go to stderr, filtered by `RUST_LOG` (default `warn`).
//!
//! # Exit Codes
//!
//! - 0: Success, including "nothing to undo" and "nothing to redo"
//! - 1: The request was rejected or storage failed
//! - 2: Invalid arguments (reported by clap)

use std::io::{self, Write};
use std::process;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;
use undo_ledger::cli;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .with_writer(io::stderr)
        .init();

    let args = cli::parse_args();

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout().lock();

    let result = cli::execute(args, &mut input, &mut output);
    let _ = output.flush();

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
