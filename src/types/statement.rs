//! Derived views returned to callers

use rust_decimal::Decimal;

use super::transaction::Transaction;

/// Balance and visible transaction list for one user
///
/// Both values are derived from the user's history cursor at the time the
/// statement was taken; they are never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub username: String,

    /// Sum of signed amounts over the active, cursor-gated prefix
    pub balance: Decimal,

    /// Active transactions from the head through the cursor, oldest first
    pub transactions: Vec<Transaction>,
}

/// Result of an undo or redo request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// The transaction was marked undone
    Undone(Transaction),

    /// The transaction was marked active again
    Redone(Transaction),

    /// No active transaction precedes the cursor
    NothingToUndo,

    /// No undone transaction follows the cursor
    NothingToRedo,
}

impl NavigationOutcome {
    /// The transaction whose status changed, if any
    pub fn affected(&self) -> Option<&Transaction> {
        match self {
            NavigationOutcome::Undone(tx) | NavigationOutcome::Redone(tx) => Some(tx),
            NavigationOutcome::NothingToUndo | NavigationOutcome::NothingToRedo => None,
        }
    }
}

/// Result of any operation applied through the ledger service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationOutcome {
    Registered { username: String },
    LoggedOut { username: String },
    Statement(Statement),
    Navigated {
        outcome: NavigationOutcome,
        statement: Statement,
    },
}

impl OperationOutcome {
    pub fn statement(&self) -> Option<&Statement> {
        match self {
            OperationOutcome::Statement(statement)
            | OperationOutcome::Navigated { statement, .. } => Some(statement),
            OperationOutcome::Registered { .. } | OperationOutcome::LoggedOut { .. } => None,
        }
    }
}
