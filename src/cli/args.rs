use crate::strategy::ReplayConfig;
use crate::types::parse_amount;
use clap::{Args, Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "undo-ledger")]
#[command(about = "Per-user ledger with undo and redo", long_about = None)]
pub struct CliArgs {
    /// Directory holding users.csv and transactions.csv
    #[arg(
        long = "data-dir",
        value_name = "DIR",
        global = true,
        env = "UNDO_LEDGER_DATA_DIR",
        default_value = "ledger-data"
    )]
    pub data_dir: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

/// A username plus the password proving it
#[derive(Args, Debug, Clone, PartialEq)]
pub struct Credentials {
    #[arg(value_name = "USERNAME")]
    pub username: String,

    #[arg(
        long = "password",
        value_name = "PASSWORD",
        env = "UNDO_LEDGER_PASSWORD",
        hide_env_values = true
    )]
    pub password: String,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Create a user
    Register(Credentials),

    /// Check credentials and print the statement
    Login(Credentials),

    /// Record a deposit
    Deposit {
        #[command(flatten)]
        credentials: Credentials,

        #[arg(value_name = "AMOUNT", value_parser = parse_amount, allow_hyphen_values = true)]
        amount: Decimal,
    },

    /// Record a withdraw
    Withdraw {
        #[command(flatten)]
        credentials: Credentials,

        #[arg(value_name = "AMOUNT", value_parser = parse_amount, allow_hyphen_values = true)]
        amount: Decimal,
    },

    /// Undo the most recent active transaction
    Undo(Credentials),

    /// Redo the nearest undone transaction
    Redo(Credentials),

    /// Print balance and visible transactions
    Statement(Credentials),

    /// Log in and read commands from stdin, keeping one live history
    Shell(Credentials),

    /// Apply a CSV file of operations and print per-user summaries
    Replay(ReplayArgs),
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct ReplayArgs {
    #[arg(value_name = "INPUT", help = "Path to the operations CSV file")]
    pub input_file: PathBuf,

    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "sync",
        help = "Replay strategy: 'sync' for file order or 'async' for per-user batches"
    )]
    pub strategy: StrategyType,

    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of operations per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        help = "Maximum number of users replayed concurrently (default: CPU cores)"
    )]
    pub max_concurrent_users: Option<usize>,

    /// Write to the data directory instead of a throwaway in-memory store
    #[arg(long = "persist")]
    pub persist: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

impl ReplayArgs {
    /// Build the replay configuration, filling unset values with defaults
    pub fn to_replay_config(&self) -> ReplayConfig {
        if self.batch_size.is_none() && self.max_concurrent_users.is_none() {
            return ReplayConfig::default();
        }

        let default = ReplayConfig::default();
        ReplayConfig::new(
            self.batch_size.unwrap_or(default.batch_size),
            self.max_concurrent_users
                .unwrap_or(default.max_concurrent_users),
        )
    }
}
