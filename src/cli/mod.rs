// CLI module
// Argument parsing, command execution and the interactive shell

mod args;
mod commands;
mod shell;

pub use args::{CliArgs, Command, Credentials, ReplayArgs, StrategyType};
pub use commands::{execute, render_outcome};
pub use shell::run_shell;

use clap::Parser;

/// Parse command-line arguments using clap
///
/// On invalid arguments or `--help`, clap prints its message and exits.
pub fn parse_args() -> CliArgs {
    CliArgs::parse()
}
