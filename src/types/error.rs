//! Error types for the ledger
//!
//! Errors fall into two groups:
//!
//! - **Rejections**: the request itself is invalid (missing or malformed
//!   fields, unknown user, bad credentials, insufficient funds, a balance
//!   that would leave the decimal range). Nothing is
//!   persisted and no session state changes.
//! - **Failures**: the persistence layer or the filesystem failed. These are
//!   fatal to the request and are propagated unchanged to the caller.
//!
//! An undo or redo with nothing eligible is not an error; see
//! [`NavigationOutcome`](super::NavigationOutcome).

use rust_decimal::Decimal;
use thiserror::Error;

/// Main error type for the ledger
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// A required request field was absent or empty
    #[error("Missing {field}")]
    MissingField {
        /// Name of the missing field
        field: String,
    },

    /// Amount did not parse as a positive decimal
    #[error("Invalid amount '{amount}'")]
    InvalidAmount {
        /// The rejected amount text
        amount: String,
    },

    /// Transaction kind was neither `deposit` nor `withdraw`
    #[error("Invalid transaction kind '{kind}'")]
    InvalidKind {
        /// The rejected kind text
        kind: String,
    },

    /// Operation name in a replay record was not recognised
    #[error("Invalid operation '{operation}'")]
    InvalidOperation {
        /// The rejected operation text
        operation: String,
    },

    /// Registration attempted with a name that is already in use
    #[error("Username '{username}' already exists")]
    UsernameTaken { username: String },

    /// Unknown user or wrong password
    ///
    /// Both cases share one variant so callers cannot tell which usernames exist.
    #[error("Invalid credentials for '{username}'")]
    InvalidCredentials { username: String },

    /// Operation targeted a user that is not registered
    #[error("User '{username}' not found")]
    UserNotFound { username: String },

    /// Withdraw exceeds the current balance
    #[error("Insufficient funds for '{username}': balance {balance}, requested {requested}")]
    InsufficientFunds {
        username: String,
        /// Balance at the time of the request
        balance: Decimal,
        /// Requested withdraw amount
        requested: Decimal,
    },

    /// The resulting balance would not fit in a `Decimal`
    ///
    /// The request is rejected so the history never holds a balance that
    /// cannot be computed.
    #[error("Arithmetic overflow in {operation} for '{username}'")]
    ArithmeticOverflow {
        /// Operation that would overflow
        operation: String,
        username: String,
    },

    /// The persistence layer failed to read or write
    #[error("Storage error: {message}")]
    StorageError { message: String },

    /// I/O error while reading or writing files
    #[error("I/O error: {message}")]
    IoError { message: String },

    /// CSV or field parsing error
    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        message: String,
    },
}

impl From<std::io::Error> for LedgerError {
    fn from(error: std::io::Error) -> Self {
        LedgerError::IoError {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for LedgerError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        LedgerError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

impl LedgerError {
    pub fn missing_field(field: &str) -> Self {
        LedgerError::MissingField {
            field: field.to_string(),
        }
    }

    pub fn invalid_amount(amount: &str) -> Self {
        LedgerError::InvalidAmount {
            amount: amount.to_string(),
        }
    }

    pub fn invalid_kind(kind: &str) -> Self {
        LedgerError::InvalidKind {
            kind: kind.to_string(),
        }
    }

    pub fn invalid_operation(operation: &str) -> Self {
        LedgerError::InvalidOperation {
            operation: operation.to_string(),
        }
    }

    pub fn username_taken(username: &str) -> Self {
        LedgerError::UsernameTaken {
            username: username.to_string(),
        }
    }

    pub fn invalid_credentials(username: &str) -> Self {
        LedgerError::InvalidCredentials {
            username: username.to_string(),
        }
    }

    pub fn user_not_found(username: &str) -> Self {
        LedgerError::UserNotFound {
            username: username.to_string(),
        }
    }

    pub fn insufficient_funds(username: &str, balance: Decimal, requested: Decimal) -> Self {
        LedgerError::InsufficientFunds {
            username: username.to_string(),
            balance,
            requested,
        }
    }

    pub fn arithmetic_overflow(operation: &str, username: &str) -> Self {
        LedgerError::ArithmeticOverflow {
            operation: operation.to_string(),
            username: username.to_string(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        LedgerError::StorageError {
            message: message.into(),
        }
    }

    /// Whether the error rejects the request rather than reporting a failure
    ///
    /// Rejections leave storage and sessions untouched and are safe to report
    /// back to the requester as-is.
    pub fn is_rejection(&self) -> bool {
        !matches!(
            self,
            LedgerError::StorageError { .. }
                | LedgerError::IoError { .. }
                | LedgerError::ParseError { .. }
        )
    }
}
