//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `transaction`: Ledger entries, their kinds and statuses
//! - `user`: Registered users
//! - `operation`: Requests accepted by the ledger service
//! - `statement`: Derived views (balance, visible list, navigation results)
//! - `error`: Error types for the ledger

pub mod error;
pub mod operation;
pub mod statement;
pub mod transaction;
pub mod user;

pub use error::LedgerError;
pub use operation::Operation;
pub use statement::{NavigationOutcome, OperationOutcome, Statement};
pub use transaction::{
    parse_amount, NewTransaction, Transaction, TransactionId, TransactionKind, TransactionStatus,
};
pub use user::{User, UserId};
