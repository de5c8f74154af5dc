//! Command execution
//!
//! Every command except `replay` works against the CSV store in the data
//! directory. Commands other than `register` and `login` authenticate first,
//! which also rebuilds the user's session from storage.

use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use super::args::{CliArgs, Command, Credentials, ReplayArgs};
use super::shell::run_shell;
use crate::core::{LedgerService, LedgerStore, MemoryStore, SessionRegistry};
use crate::io::{write_statement, CsvStore};
use crate::strategy::create_strategy;
use crate::types::{LedgerError, NavigationOutcome, Operation, OperationOutcome, TransactionKind};

/// Run one command, writing its report to `output`
///
/// `input` is only read by `shell`.
pub fn execute(
    args: CliArgs,
    input: &mut dyn BufRead,
    output: &mut dyn Write,
) -> Result<(), LedgerError> {
    let CliArgs { data_dir, command } = args;

    match command {
        Command::Replay(replay) => run_replay(&data_dir, &replay, output),
        Command::Shell(Credentials { username, password }) => {
            let service = open_service(Arc::new(CsvStore::open(&data_dir)?));
            run_shell(&service, &username, &password, input, output)
        }
        command => {
            let service = open_service(Arc::new(CsvStore::open(&data_dir)?));
            let operation = to_operation(&service, command)?;
            let outcome = service.apply(operation)?;
            render_outcome(&outcome, output)
        }
    }
}

/// Lower a single-shot command, authenticating where it needs a login
fn to_operation(service: &LedgerService, command: Command) -> Result<Operation, LedgerError> {
    let operation = match command {
        Command::Register(Credentials { username, password }) => {
            Operation::Register { username, password }
        }
        Command::Login(Credentials { username, password }) => {
            Operation::Login { username, password }
        }
        Command::Deposit {
            credentials,
            amount,
        } => Operation::Post {
            username: authenticate(service, credentials)?,
            kind: TransactionKind::Deposit,
            amount,
        },
        Command::Withdraw {
            credentials,
            amount,
        } => Operation::Post {
            username: authenticate(service, credentials)?,
            kind: TransactionKind::Withdraw,
            amount,
        },
        Command::Undo(credentials) => Operation::Undo {
            username: authenticate(service, credentials)?,
        },
        Command::Redo(credentials) => Operation::Redo {
            username: authenticate(service, credentials)?,
        },
        Command::Statement(credentials) => Operation::Statement {
            username: authenticate(service, credentials)?,
        },
        Command::Shell(_) | Command::Replay(_) => {
            return Err(LedgerError::invalid_operation("session command"))
        }
    };
    Ok(operation)
}

/// Print an operation's result
///
/// Navigation reports what moved (or that nothing could) before the
/// statement.
pub fn render_outcome(
    outcome: &OperationOutcome,
    output: &mut dyn Write,
) -> Result<(), LedgerError> {
    match outcome {
        OperationOutcome::Registered { username } => writeln!(output, "registered {}", username)?,
        OperationOutcome::LoggedOut { username } => writeln!(output, "logged out {}", username)?,
        OperationOutcome::Statement(statement) => write_statement(statement, output)?,
        OperationOutcome::Navigated { outcome, statement } => {
            match outcome {
                NavigationOutcome::Undone(tx) => {
                    writeln!(output, "undone {}: {} {:.4}", tx.id, tx.kind, tx.amount)?
                }
                NavigationOutcome::Redone(tx) => {
                    writeln!(output, "redone {}: {} {:.4}", tx.id, tx.kind, tx.amount)?
                }
                NavigationOutcome::NothingToUndo => writeln!(output, "nothing to undo")?,
                NavigationOutcome::NothingToRedo => writeln!(output, "nothing to redo")?,
            }
            write_statement(statement, output)?;
        }
    }
    Ok(())
}

fn open_service(store: Arc<dyn LedgerStore>) -> LedgerService {
    LedgerService::new(store, Arc::new(SessionRegistry::new()))
}

fn authenticate(service: &LedgerService, credentials: Credentials) -> Result<String, LedgerError> {
    service.login(&credentials.username, &credentials.password)?;
    Ok(credentials.username.trim().to_string())
}

fn run_replay(
    data_dir: &Path,
    replay: &ReplayArgs,
    output: &mut dyn Write,
) -> Result<(), LedgerError> {
    let store: Arc<dyn LedgerStore> = if replay.persist {
        info!(dir = %data_dir.display(), "replaying into data directory");
        Arc::new(CsvStore::open(data_dir)?)
    } else {
        Arc::new(MemoryStore::new())
    };
    let service = open_service(store);

    let strategy = create_strategy(replay.strategy, Some(replay.to_replay_config()));
    strategy.replay(&replay.input_file, &service, output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    /// Run a command line against `dir`, as a fresh process would
    fn run(dir: &Path, args: &[&str]) -> Result<String, LedgerError> {
        let mut argv = vec!["undo-ledger", "--data-dir", dir.to_str().unwrap()];
        argv.extend_from_slice(args);
        let args = CliArgs::try_parse_from(argv).unwrap();

        let mut output = Vec::new();
        execute(args, &mut std::io::empty(), &mut output)?;
        Ok(String::from_utf8(output).unwrap().replace("\r\n", "\n"))
    }

    #[test]
    fn test_register_then_deposit_across_processes() {
        let dir = TempDir::new().unwrap();

        assert_eq!(
            run(dir.path(), &["register", "alice", "--password", "pw"]).unwrap(),
            "registered alice\n"
        );
        let output = run(dir.path(), &["deposit", "alice", "25", "--password", "pw"]).unwrap();
        assert!(output.starts_with("balance: 25.0000\nid,kind,amount,status,created_at\n1,deposit,25.0000,active,"));

        let output = run(dir.path(), &["statement", "alice", "--password", "pw"]).unwrap();
        assert!(output.starts_with("balance: 25.0000\n"));
    }

    #[test]
    fn test_wrong_password_is_rejected() {
        let dir = TempDir::new().unwrap();
        run(dir.path(), &["register", "alice", "--password", "pw"]).unwrap();

        let result = run(dir.path(), &["deposit", "alice", "25", "--password", "nope"]);

        assert_eq!(result.unwrap_err(), LedgerError::invalid_credentials("alice"));
    }

    #[test]
    fn test_undo_survives_restart_but_redo_does_not() {
        let dir = TempDir::new().unwrap();
        run(dir.path(), &["register", "alice", "--password", "pw"]).unwrap();
        run(dir.path(), &["deposit", "alice", "100", "--password", "pw"]).unwrap();
        run(dir.path(), &["withdraw", "alice", "40", "--password", "pw"]).unwrap();

        let output = run(dir.path(), &["undo", "alice", "--password", "pw"]).unwrap();
        assert!(output.starts_with("undone 2: withdraw 40.0000\nbalance: 100.0000\n"));

        let output = run(dir.path(), &["statement", "alice", "--password", "pw"]).unwrap();
        assert!(output.starts_with("balance: 100.0000\n"));

        let output = run(dir.path(), &["redo", "alice", "--password", "pw"]).unwrap();
        assert!(output.starts_with("nothing to redo\nbalance: 100.0000\n"));
    }

    #[test]
    fn test_insufficient_funds() {
        let dir = TempDir::new().unwrap();
        run(dir.path(), &["register", "bob", "--password", "pw"]).unwrap();

        let result = run(dir.path(), &["withdraw", "bob", "1", "--password", "pw"]);

        assert!(matches!(result, Err(LedgerError::InsufficientFunds { .. })));
    }

    #[test]
    fn test_replay_in_memory_leaves_data_dir_empty() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("ops.csv");
        std::fs::write(&input, "op,user,amount,password\nregister,zed,,pw\ndeposit,zed,9\n").unwrap();
        let data = dir.path().join("data");

        let output = run(&data, &["replay", input.to_str().unwrap()]).unwrap();

        assert_eq!(output, "user,balance,visible\nzed,9.0000,1\n");
        assert!(!data.exists());
    }

    #[test]
    fn test_replay_persist_writes_data_dir() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("ops.csv");
        std::fs::write(&input, "op,user,amount,password\nregister,zed,,pw\ndeposit,zed,9\n").unwrap();
        let data = dir.path().join("data");

        run(&data, &["replay", "--persist", input.to_str().unwrap()]).unwrap();

        let output = run(&data, &["statement", "zed", "--password", "pw"]).unwrap();
        assert!(output.starts_with("balance: 9.0000\n"));
    }
}
