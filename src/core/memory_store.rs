//! Thread-safe in-memory ledger store
//!
//! `MemoryStore` keeps users and transactions in `DashMap`s so that requests
//! for different users can read and write concurrently. Identifiers come from
//! atomic counters and are strictly increasing, which keeps the
//! "creation time, then id" ordering deterministic even when two transactions
//! share a timestamp.

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use super::traits::LedgerStore;
use crate::types::{
    LedgerError, NewTransaction, Transaction, TransactionId, TransactionStatus, User, UserId,
};

/// In-memory implementation of [`LedgerStore`]
#[derive(Debug)]
pub struct MemoryStore {
    /// Users keyed by username
    users: DashMap<String, User>,

    /// Transactions keyed by id
    transactions: DashMap<TransactionId, Transaction>,

    next_user_id: AtomicU64,
    next_transaction_id: AtomicU64,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            transactions: DashMap::new(),
            next_user_id: AtomicU64::new(1),
            next_transaction_id: AtomicU64::new(1),
        }
    }

    /// Number of stored transactions across all users
    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerStore for MemoryStore {
    fn create_user(&self, username: &str, credential: &str) -> Result<User, LedgerError> {
        match self.users.entry(username.to_string()) {
            Entry::Occupied(_) => Err(LedgerError::username_taken(username)),
            Entry::Vacant(vacant) => {
                let user = User {
                    id: self.next_user_id.fetch_add(1, Ordering::Relaxed),
                    username: username.to_string(),
                    credential: credential.to_string(),
                };
                vacant.insert(user.clone());
                Ok(user)
            }
        }
    }

    fn find_user(&self, username: &str) -> Result<Option<User>, LedgerError> {
        Ok(self.users.get(username).map(|entry| entry.value().clone()))
    }

    fn insert_transaction(&self, transaction: NewTransaction) -> Result<Transaction, LedgerError> {
        let id = self.next_transaction_id.fetch_add(1, Ordering::Relaxed);
        let stored = transaction.into_transaction(id, Utc::now());
        self.transactions.insert(id, stored.clone());
        Ok(stored)
    }

    fn transactions_for(&self, owner: UserId) -> Result<Vec<Transaction>, LedgerError> {
        let mut owned: Vec<Transaction> = self
            .transactions
            .iter()
            .filter(|entry| entry.value().owner == owner)
            .map(|entry| entry.value().clone())
            .collect();
        owned.sort_by_key(Transaction::history_key);
        Ok(owned)
    }

    fn set_status(&self, id: TransactionId, status: TransactionStatus) -> Result<(), LedgerError> {
        let mut entry = self
            .transactions
            .get_mut(&id)
            .ok_or_else(|| LedgerError::storage(format!("transaction {} not found", id)))?;
        entry.value_mut().status = status;
        Ok(())
    }
}
