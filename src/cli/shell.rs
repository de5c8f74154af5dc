//! Line-oriented session for one logged-in user
//!
//! Commands, one per line:
//!
//! ```text
//! deposit <amount>
//! withdraw <amount>
//! undo
//! redo
//! statement
//! quit
//! ```
//!
//! The whole session shares one live history, so `redo` can bring back what
//! `undo` removed. Rejected commands print an `error:` line and the session
//! continues; storage failures end it.

use std::io::{BufRead, Write};

use super::commands::render_outcome;
use crate::core::LedgerService;
use crate::io::write_statement;
use crate::types::{parse_amount, LedgerError, Operation, TransactionKind};

enum ShellLine {
    Run(Operation),
    Quit,
    Blank,
}

/// Log in, then apply commands read from `input` until `quit` or end of input
pub fn run_shell(
    service: &LedgerService,
    username: &str,
    password: &str,
    input: &mut dyn BufRead,
    output: &mut dyn Write,
) -> Result<(), LedgerError> {
    let statement = service.login(username, password)?;
    let username = statement.username.clone();
    write_statement(&statement, output)?;

    let mut line = String::new();
    loop {
        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }

        let operation = match parse_line(&username, &line) {
            Ok(ShellLine::Run(operation)) => operation,
            Ok(ShellLine::Quit) => break,
            Ok(ShellLine::Blank) => continue,
            Err(e) => {
                writeln!(output, "error: {}", e)?;
                continue;
            }
        };

        match service.apply(operation) {
            Ok(outcome) => render_outcome(&outcome, output)?,
            Err(e) if e.is_rejection() => writeln!(output, "error: {}", e)?,
            Err(e) => return Err(e),
        }
        output.flush()?;
    }

    service.logout(&username);
    Ok(())
}

fn parse_line(username: &str, line: &str) -> Result<ShellLine, LedgerError> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(ShellLine::Blank);
    };
    let username = username.to_string();

    let operation = match command.to_lowercase().as_str() {
        "deposit" | "withdraw" => Operation::Post {
            username,
            kind: command.parse::<TransactionKind>()?,
            amount: parse_amount(words.next().unwrap_or_default())?,
        },
        "undo" => Operation::Undo { username },
        "redo" => Operation::Redo { username },
        "statement" => Operation::Statement { username },
        "quit" | "exit" => return Ok(ShellLine::Quit),
        _ => return Err(LedgerError::invalid_operation(command)),
    };

    Ok(ShellLine::Run(operation))
}
