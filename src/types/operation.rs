//! Logical requests accepted by the ledger service
//!
//! Every outer surface (single-shot CLI commands, the interactive shell and
//! replay files) is lowered into an [`Operation`] before it reaches the
//! [`LedgerService`](crate::core::LedgerService).

use rust_decimal::Decimal;

use super::transaction::TransactionKind;

/// One request against the ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Create a user with a password
    Register { username: String, password: String },

    /// Check credentials and rebuild the user's session from storage
    Login { username: String, password: String },

    /// Drop the user's in-memory session
    Logout { username: String },

    /// Record a deposit or withdraw
    Post {
        username: String,
        kind: TransactionKind,
        amount: Decimal,
    },

    /// Reverse the most recent active transaction
    Undo { username: String },

    /// Re-apply the nearest undone transaction after the cursor
    Redo { username: String },

    /// Report the balance and visible transactions
    Statement { username: String },
}

impl Operation {
    /// The user the operation acts on
    pub fn username(&self) -> &str {
        match self {
            Operation::Register { username, .. }
            | Operation::Login { username, .. }
            | Operation::Logout { username }
            | Operation::Post { username, .. }
            | Operation::Undo { username }
            | Operation::Redo { username }
            | Operation::Statement { username } => username,
        }
    }

    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Register { .. } => "register",
            Operation::Login { .. } => "login",
            Operation::Logout { .. } => "logout",
            Operation::Post {
                kind: TransactionKind::Deposit,
                ..
            } => "deposit",
            Operation::Post {
                kind: TransactionKind::Withdraw,
                ..
            } => "withdraw",
            Operation::Undo { .. } => "undo",
            Operation::Redo { .. } => "redo",
            Operation::Statement { .. } => "statement",
        }
    }
}
