//! CSV format handling for operation records and ledger output
//!
//! This module centralizes all CSV format concerns, providing:
//! - OperationRecord structure for deserializing replay input
//! - Conversion from replay records to [`Operation`]s
//! - Statement and per-user summary serialization
//!
//! All functions are pure (no file I/O) for easy testing.

use serde::Deserialize;
use std::io::Write;

use crate::types::{parse_amount, LedgerError, Operation, Statement, TransactionKind};

/// Replay input row
///
/// Columns: `op, user, amount, password`. The trailing columns are optional
/// because most operations need neither.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct OperationRecord {
    pub op: String,
    pub user: String,
    pub amount: Option<String>,
    pub password: Option<String>,
}

/// Balance and visible-entry count for one user, as written after a replay
#[derive(Debug, Clone, PartialEq)]
pub struct UserSummary {
    pub username: String,
    pub balance: rust_decimal::Decimal,
    pub visible: usize,
}

impl From<&Statement> for UserSummary {
    fn from(statement: &Statement) -> Self {
        Self {
            username: statement.username.clone(),
            balance: statement.balance,
            visible: statement.transactions.len(),
        }
    }
}

/// Convert an OperationRecord to an Operation
///
/// # Arguments
///
/// * `record` - The deserialized replay row
///
/// # Returns
///
/// * `Ok(Operation)` - A well-formed request (it may still be rejected by
///   the service, e.g. for an unknown user)
/// * `Err(LedgerError)` - Unknown op, or a field the op needs is missing or
///   malformed
pub fn convert_operation_record(record: OperationRecord) -> Result<Operation, LedgerError> {
    let username = record.user.trim().to_string();
    if username.is_empty() {
        return Err(LedgerError::missing_field("username"));
    }

    let op = record.op.trim().to_lowercase();
    let operation = match op.as_str() {
        "register" => Operation::Register {
            username,
            password: required_password(record.password)?,
        },
        "login" => Operation::Login {
            username,
            password: required_password(record.password)?,
        },
        "logout" => Operation::Logout { username },
        "deposit" | "withdraw" => Operation::Post {
            username,
            kind: op.parse::<TransactionKind>()?,
            amount: parse_amount(record.amount.as_deref().unwrap_or_default())?,
        },
        "undo" => Operation::Undo { username },
        "redo" => Operation::Redo { username },
        "statement" => Operation::Statement { username },
        _ => return Err(LedgerError::invalid_operation(record.op.trim())),
    };

    Ok(operation)
}

fn required_password(password: Option<String>) -> Result<String, LedgerError> {
    match password {
        Some(password) if !password.trim().is_empty() => Ok(password),
        _ => Err(LedgerError::missing_field("password")),
    }
}

/// Write a statement: a `balance:` line followed by the visible entries
///
/// Entries are written oldest first with columns
/// `id, kind, amount, status, created_at`.
pub fn write_statement(statement: &Statement, output: &mut dyn Write) -> Result<(), LedgerError> {
    writeln!(output, "balance: {:.4}", statement.balance)?;

    let mut writer = csv::Writer::from_writer(output);
    writer.write_record(["id", "kind", "amount", "status", "created_at"])?;
    for transaction in &statement.transactions {
        writer.write_record(&[
            transaction.id.to_string(),
            transaction.kind.to_string(),
            format!("{:.4}", transaction.amount),
            transaction.status.to_string(),
            transaction.created_at.to_rfc3339(),
        ])?;
    }
    writer.flush()?;

    Ok(())
}

/// Write per-user summaries with columns `user, balance, visible`
///
/// Rows are sorted by username for deterministic output.
pub fn write_summaries_csv(
    summaries: &[UserSummary],
    output: &mut dyn Write,
) -> Result<(), LedgerError> {
    let mut writer = csv::Writer::from_writer(output);
    writer.write_record(["user", "balance", "visible"])?;

    let mut sorted: Vec<&UserSummary> = summaries.iter().collect();
    sorted.sort_by(|a, b| a.username.cmp(&b.username));

    for summary in sorted {
        writer.write_record(&[
            summary.username.clone(),
            format!("{:.4}", summary.balance),
            summary.visible.to_string(),
        ])?;
    }
    writer.flush()?;

    Ok(())
}
