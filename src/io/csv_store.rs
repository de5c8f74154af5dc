//! File-backed ledger store
//!
//! `CsvStore` keeps two tables in a data directory:
//!
//! ```text
//! <dir>/users.csv          id,username,credential
//! <dir>/transactions.csv   id,owner,amount,kind,status,created_at
//! ```
//!
//! Both tables are loaded on open and held in memory. Each mutation rewrites
//! the affected table to a temporary file and renames it over the live file,
//! so a crash never leaves a half-written table. If the write fails, the
//! in-memory change is rolled back before the error is returned.

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

use crate::core::LedgerStore;
use crate::types::{
    LedgerError, NewTransaction, Transaction, TransactionId, TransactionStatus, User, UserId,
};

const USERS_FILE: &str = "users.csv";
const TRANSACTIONS_FILE: &str = "transactions.csv";

#[derive(Debug, Default)]
struct CsvState {
    users: Vec<User>,
    transactions: Vec<Transaction>,
}

/// [`LedgerStore`] persisted as CSV files in a directory
#[derive(Debug)]
pub struct CsvStore {
    dir: PathBuf,
    state: Mutex<CsvState>,
}

impl CsvStore {
    /// Open (creating if needed) the data directory and load both tables
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| {
            LedgerError::storage(format!("cannot create '{}': {}", dir.display(), e))
        })?;

        let users: Vec<User> = read_table(&dir.join(USERS_FILE))?;
        let transactions: Vec<Transaction> = read_table(&dir.join(TRANSACTIONS_FILE))?;
        debug!(
            dir = %dir.display(),
            users = users.len(),
            transactions = transactions.len(),
            "opened csv store"
        );

        Ok(Self {
            dir,
            state: Mutex::new(CsvState {
                users,
                transactions,
            }),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn state(&self) -> MutexGuard<'_, CsvState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn save_users(&self, state: &CsvState) -> Result<(), LedgerError> {
        write_table(&self.dir.join(USERS_FILE), &state.users)
    }

    fn save_transactions(&self, state: &CsvState) -> Result<(), LedgerError> {
        write_table(&self.dir.join(TRANSACTIONS_FILE), &state.transactions)
    }
}

impl LedgerStore for CsvStore {
    fn create_user(&self, username: &str, credential: &str) -> Result<User, LedgerError> {
        let mut state = self.state();
        if state.users.iter().any(|user| user.username == username) {
            return Err(LedgerError::username_taken(username));
        }

        let user = User {
            id: state.users.iter().map(|user| user.id).max().unwrap_or(0) + 1,
            username: username.to_string(),
            credential: credential.to_string(),
        };
        state.users.push(user.clone());

        if let Err(e) = self.save_users(&state) {
            state.users.pop();
            return Err(e);
        }
        Ok(user)
    }

    fn find_user(&self, username: &str) -> Result<Option<User>, LedgerError> {
        Ok(self
            .state()
            .users
            .iter()
            .find(|user| user.username == username)
            .cloned())
    }

    fn insert_transaction(&self, transaction: NewTransaction) -> Result<Transaction, LedgerError> {
        let mut state = self.state();

        let id = state.transactions.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        // never earlier than an existing row, so (created_at, id) follows insertion
        let created_at = state
            .transactions
            .iter()
            .map(|t| t.created_at)
            .max()
            .map_or_else(Utc::now, |latest| latest.max(Utc::now()));

        let stored = transaction.into_transaction(id, created_at);
        state.transactions.push(stored.clone());

        if let Err(e) = self.save_transactions(&state) {
            state.transactions.pop();
            return Err(e);
        }
        Ok(stored)
    }

    fn transactions_for(&self, owner: UserId) -> Result<Vec<Transaction>, LedgerError> {
        let mut owned: Vec<Transaction> = self
            .state()
            .transactions
            .iter()
            .filter(|t| t.owner == owner)
            .cloned()
            .collect();
        owned.sort_by_key(Transaction::history_key);
        Ok(owned)
    }

    fn set_status(&self, id: TransactionId, status: TransactionStatus) -> Result<(), LedgerError> {
        let mut state = self.state();
        let index = state
            .transactions
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| LedgerError::storage(format!("transaction {} not found", id)))?;

        let previous = std::mem::replace(&mut state.transactions[index].status, status);
        if let Err(e) = self.save_transactions(&state) {
            state.transactions[index].status = previous;
            return Err(e);
        }
        Ok(())
    }
}

fn read_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, LedgerError> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let mut reader = csv::Reader::from_path(path).map_err(|e| {
        LedgerError::storage(format!("cannot read '{}': {}", path.display(), e))
    })?;
    reader
        .deserialize()
        .collect::<Result<Vec<T>, csv::Error>>()
        .map_err(|e| LedgerError::storage(format!("corrupt '{}': {}", path.display(), e)))
}

fn write_table<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), LedgerError> {
    let tmp = path.with_extension("csv.tmp");

    let mut writer = csv::Writer::from_path(&tmp).map_err(|e| write_error(path, e))?;
    for row in rows {
        writer.serialize(row).map_err(|e| write_error(path, e))?;
    }
    writer.flush().map_err(|e| write_error(path, e))?;
    drop(writer);

    fs::rename(&tmp, path).map_err(|e| write_error(path, e))
}

fn write_error(path: &Path, e: impl std::fmt::Display) -> LedgerError {
    LedgerError::storage(format!("cannot write '{}': {}", path.display(), e))
}
