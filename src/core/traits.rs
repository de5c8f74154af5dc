//! Persistence port for the ledger
//!
//! The ledger service never talks to a storage engine directly. Anything that
//! can keep users and transactions durably implements [`LedgerStore`]: the
//! in-memory [`MemoryStore`](super::MemoryStore) used for replays and tests,
//! and the file-backed [`CsvStore`](crate::io::CsvStore) used by the binary.

use crate::types::{
    LedgerError, NewTransaction, Transaction, TransactionId, TransactionStatus, User, UserId,
};

/// Durable storage for users and their transactions
///
/// Implementations must be safe to share across threads. Every method either
/// completes its write or reports an error without a partial effect; the
/// service relies on this to keep in-memory sessions consistent with storage.
pub trait LedgerStore: Send + Sync {
    /// Create a user with an already-hashed credential
    ///
    /// Fails with [`LedgerError::UsernameTaken`] if the name is in use.
    fn create_user(&self, username: &str, credential: &str) -> Result<User, LedgerError>;

    /// Look up a user by name
    fn find_user(&self, username: &str) -> Result<Option<User>, LedgerError>;

    /// Persist a new transaction with status `active`
    ///
    /// The store assigns the id and creation time.
    fn insert_transaction(&self, transaction: NewTransaction) -> Result<Transaction, LedgerError>;

    /// All transactions owned by `owner`, by creation time then id
    fn transactions_for(&self, owner: UserId) -> Result<Vec<Transaction>, LedgerError>;

    /// Overwrite the status of one transaction
    fn set_status(&self, id: TransactionId, status: TransactionStatus) -> Result<(), LedgerError>;
}
