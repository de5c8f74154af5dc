//! Transaction-related types for the ledger
//!
//! A transaction is one ledger entry (deposit or withdraw). Its owner, amount,
//! kind and creation time never change once persisted; only its status flips
//! between `active` and `undone` as the user navigates their history.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::LedgerError;
use super::user::UserId;

/// Transaction identifier, assigned by the persistence layer
pub type TransactionId = u64;

/// Kind of ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Adds the amount to the balance
    Deposit,

    /// Subtracts the amount from the balance
    ///
    /// Rejected at posting time when the amount exceeds the current balance.
    Withdraw,
}

impl TransactionKind {
    /// Lowercase name used in files and messages
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdraw => "withdraw",
        }
    }

    /// Apply the kind's sign to an amount
    pub fn signed(&self, amount: Decimal) -> Decimal {
        match self {
            TransactionKind::Deposit => amount,
            TransactionKind::Withdraw => -amount,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "deposit" => Ok(TransactionKind::Deposit),
            "withdraw" => Ok(TransactionKind::Withdraw),
            _ => Err(LedgerError::invalid_kind(s)),
        }
    }
}

/// Status of a persisted transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Counts toward the balance when at or before the cursor
    Active,

    /// Reversed by an undo; excluded from the balance until redone
    Undone,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Active => "active",
            TransactionStatus::Undone => "undone",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(TransactionStatus::Active),
            "undone" => Ok(TransactionStatus::Undone),
            other => Err(LedgerError::ParseError {
                line: None,
                message: format!("unknown transaction status '{}'", other),
            }),
        }
    }
}

/// A persisted ledger entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique id assigned by the store
    pub id: TransactionId,

    /// The user owning this entry
    pub owner: UserId,

    /// Positive amount; stored as text so files round-trip exactly
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,

    /// Deposit or withdraw
    pub kind: TransactionKind,

    /// Current status; the only mutable attribute
    pub status: TransactionStatus,

    /// Creation time, primary ordering key for history rebuilds
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Amount with the kind's sign applied (deposit positive, withdraw negative)
    pub fn signed_amount(&self) -> Decimal {
        self.kind.signed(self.amount)
    }

    pub fn is_active(&self) -> bool {
        self.status == TransactionStatus::Active
    }

    /// Ordering key used when rebuilding a history: creation time, then id
    pub fn history_key(&self) -> (DateTime<Utc>, TransactionId) {
        (self.created_at, self.id)
    }
}

/// A transaction that has been validated but not yet persisted
///
/// The store assigns `id` and `created_at`; new entries always start `active`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub owner: UserId,
    pub amount: Decimal,
    pub kind: TransactionKind,
}

impl NewTransaction {
    /// Attach persistence-assigned fields
    pub fn into_transaction(self, id: TransactionId, created_at: DateTime<Utc>) -> Transaction {
        Transaction {
            id,
            owner: self.owner,
            amount: self.amount,
            kind: self.kind,
            status: TransactionStatus::Active,
            created_at,
        }
    }
}

/// Parse a user-supplied amount
///
/// Blank input is a missing field. Anything that is not a positive decimal is
/// an invalid amount.
pub fn parse_amount(raw: &str) -> Result<Decimal, LedgerError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::missing_field("amount"));
    }
    match Decimal::from_str(trimmed) {
        Ok(amount) if amount > Decimal::ZERO => Ok(amount),
        _ => Err(LedgerError::invalid_amount(trimmed)),
    }
}
