//! Ledger service: persistence reads and writes around the history cursor
//!
//! The service is the boundary every outer surface goes through. For each
//! request it:
//!
//! 1. validates the input and resolves the user,
//! 2. takes that user's session lock from the [`SessionRegistry`],
//! 3. rebuilds the session from storage when required,
//! 4. applies the operation, writing to storage *before* the in-memory
//!    history changes,
//! 5. returns a [`Statement`] derived from the history.
//!
//! # When sessions are rebuilt
//!
//! - `login` and `load` always rebuild from storage.
//! - `post_transaction` checks funds against a history rebuilt from storage
//!   and installs it only once the new entry is persisted, so a rejected
//!   post leaves the live session (and its redo suffix) alone.
//! - `undo`, `redo` and `statement` reuse the live session so that an undo
//!   can be redone; they only rebuild when the session is missing (new
//!   process, logout), in which case the newest transaction becomes current.
//! - `logout` clears the session under its lock but keeps the registry
//!   entry, so a request racing with it still waits on the same mutex.
//!
//! Balances use checked arithmetic. A post or redo whose resulting balance
//! would not fit in a `Decimal` is rejected before anything is written.
//!
//! # Architecture
//!
//! ```text
//! LedgerService
//!     ├── Arc<dyn LedgerStore>   (durable users and transactions)
//!     └── Arc<SessionRegistry>   (one locked HistoryCursor per user)
//! ```

use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::credentials::{hash_password, verify_password};
use super::history::HistoryCursor;
use super::session_registry::{lock_session, Session, SessionRegistry};
use super::traits::LedgerStore;
use crate::types::{
    LedgerError, NavigationOutcome, NewTransaction, Operation, OperationOutcome, Statement,
    TransactionKind, TransactionStatus, User,
};

/// Orchestrates storage and per-user history sessions
///
/// Cheap to clone; clones share the same store and registry.
#[derive(Clone)]
pub struct LedgerService {
    store: Arc<dyn LedgerStore>,
    sessions: Arc<SessionRegistry>,
}

impl LedgerService {
    pub fn new(store: Arc<dyn LedgerStore>, sessions: Arc<SessionRegistry>) -> Self {
        Self { store, sessions }
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Apply any [`Operation`], logging the result
    pub fn apply(&self, operation: Operation) -> Result<OperationOutcome, LedgerError> {
        let name = operation.name();
        let username = operation.username().to_string();

        let result = match operation {
            Operation::Register { username, password } => self
                .register(&username, &password)
                .map(|user| OperationOutcome::Registered {
                    username: user.username,
                }),
            Operation::Login { username, password } => self
                .login(&username, &password)
                .map(OperationOutcome::Statement),
            Operation::Logout { username } => {
                self.logout(&username);
                Ok(OperationOutcome::LoggedOut { username })
            }
            Operation::Post {
                username,
                kind,
                amount,
            } => self
                .post_transaction(&username, kind, amount)
                .map(OperationOutcome::Statement),
            Operation::Undo { username } => self
                .undo(&username)
                .map(|(outcome, statement)| OperationOutcome::Navigated { outcome, statement }),
            Operation::Redo { username } => self
                .redo(&username)
                .map(|(outcome, statement)| OperationOutcome::Navigated { outcome, statement }),
            Operation::Statement { username } => {
                self.statement(&username).map(OperationOutcome::Statement)
            }
        };

        Self::log_result(name, &username, &result);
        result
    }

    /// Register a new user, storing only a salted credential hash
    pub fn register(&self, username: &str, password: &str) -> Result<User, LedgerError> {
        let username = require("username", username)?;
        let password = require("password", password)?;

        self.store.create_user(username, &hash_password(password))
    }

    /// Verify credentials and rebuild the user's session
    ///
    /// Unknown users and wrong passwords produce the same error.
    pub fn login(&self, username: &str, password: &str) -> Result<Statement, LedgerError> {
        let username = require("username", username)?;
        let password = require("password", password)?;

        let user = self
            .store
            .find_user(username)?
            .ok_or_else(|| LedgerError::invalid_credentials(username))?;

        if !verify_password(password, &user.credential) {
            return Err(LedgerError::invalid_credentials(username));
        }

        self.load_user(&user)
    }

    /// Clear the user's session; returns whether one was loaded
    pub fn logout(&self, username: &str) -> bool {
        self.sessions.reset(username)
    }

    /// Rebuild the user's session from storage and report it
    pub fn load(&self, username: &str) -> Result<Statement, LedgerError> {
        let user = self.user(username)?;
        self.load_user(&user)
    }

    /// Record a deposit or withdraw
    ///
    /// The withdraw check runs against a history rebuilt from storage. A
    /// withdraw larger than the balance is rejected without touching storage
    /// or the live session. Once the new transaction is persisted, the rebuilt
    /// history (with the new entry current) replaces the session.
    pub fn post_transaction(
        &self,
        username: &str,
        kind: TransactionKind,
        amount: Decimal,
    ) -> Result<Statement, LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::invalid_amount(&amount.to_string()));
        }
        let user = self.user(username)?;

        let handle = self.sessions.get_or_create(&user.username);
        let mut session = lock_session(&handle);

        let mut history = HistoryCursor::new();
        history.reload(self.store.transactions_for(user.id)?);

        let balance = history
            .checked_balance()
            .ok_or_else(|| LedgerError::arithmetic_overflow(kind.as_str(), &user.username))?;
        if kind == TransactionKind::Withdraw && amount > balance {
            return Err(LedgerError::insufficient_funds(
                &user.username,
                balance,
                amount,
            ));
        }
        balance
            .checked_add(kind.signed(amount))
            .ok_or_else(|| LedgerError::arithmetic_overflow(kind.as_str(), &user.username))?;

        let stored = self.store.insert_transaction(NewTransaction {
            owner: user.id,
            amount,
            kind,
        })?;
        debug!(user = %user.username, tx = stored.id, "transaction persisted");
        history.insert(stored);
        session.install(user.id, history);

        statement(&user.username, session.history())
    }

    /// Undo the most recent active transaction
    pub fn undo(&self, username: &str) -> Result<(NavigationOutcome, Statement), LedgerError> {
        let user = self.user(username)?;

        let handle = self.sessions.get_or_create(&user.username);
        let mut session = lock_session(&handle);
        self.ensure_loaded(&mut session, &user)?;
        if session.history().checked_balance_after_undo().is_none() {
            return Err(LedgerError::arithmetic_overflow("undo", &user.username));
        }

        let store = &self.store;
        let outcome = match session
            .history_mut()
            .undo_with(|target| store.set_status(target.id, TransactionStatus::Undone))?
        {
            Some(undone) => NavigationOutcome::Undone(undone),
            None => NavigationOutcome::NothingToUndo,
        };

        Ok((outcome, statement(&user.username, session.history())?))
    }

    /// Redo the nearest undone transaction after the cursor
    pub fn redo(&self, username: &str) -> Result<(NavigationOutcome, Statement), LedgerError> {
        let user = self.user(username)?;

        let handle = self.sessions.get_or_create(&user.username);
        let mut session = lock_session(&handle);
        self.ensure_loaded(&mut session, &user)?;
        if session.history().checked_balance_after_redo().is_none() {
            return Err(LedgerError::arithmetic_overflow("redo", &user.username));
        }

        let store = &self.store;
        let outcome = match session
            .history_mut()
            .redo_with(|target| store.set_status(target.id, TransactionStatus::Active))?
        {
            Some(redone) => NavigationOutcome::Redone(redone),
            None => NavigationOutcome::NothingToRedo,
        };

        Ok((outcome, statement(&user.username, session.history())?))
    }

    /// Report the user's balance and visible transactions without changing them
    pub fn statement(&self, username: &str) -> Result<Statement, LedgerError> {
        let user = self.user(username)?;

        let handle = self.sessions.get_or_create(&user.username);
        let mut session = lock_session(&handle);
        self.ensure_loaded(&mut session, &user)?;

        statement(&user.username, session.history())
    }

    fn user(&self, username: &str) -> Result<User, LedgerError> {
        let username = require("username", username)?;
        self.store
            .find_user(username)?
            .ok_or_else(|| LedgerError::user_not_found(username))
    }

    fn load_user(&self, user: &User) -> Result<Statement, LedgerError> {
        let handle = self.sessions.get_or_create(&user.username);
        let mut session = lock_session(&handle);
        self.reload(&mut session, user)?;

        statement(&user.username, session.history())
    }

    /// Rebuild from storage; the session is untouched if the read fails
    fn reload(&self, session: &mut Session, user: &User) -> Result<(), LedgerError> {
        let transactions = self.store.transactions_for(user.id)?;
        session.reload(user.id, transactions);
        Ok(())
    }

    fn ensure_loaded(&self, session: &mut Session, user: &User) -> Result<(), LedgerError> {
        if session.is_loaded_for(user.id) {
            return Ok(());
        }
        debug!(user = %user.username, "rebuilding missing session");
        self.reload(session, user)
    }

    fn log_result(
        operation: &str,
        username: &str,
        result: &Result<OperationOutcome, LedgerError>,
    ) {
        match result {
            Ok(OperationOutcome::Navigated {
                outcome: NavigationOutcome::NothingToUndo | NavigationOutcome::NothingToRedo,
                ..
            }) => {
                info!(user = %username, "{operation}: nothing to do");
            }
            Ok(outcome) => match outcome.statement() {
                Some(statement) => info!(
                    user = %username,
                    balance = %statement.balance,
                    visible = statement.transactions.len(),
                    "{operation} applied"
                ),
                None => info!(user = %username, "{operation} applied"),
            },
            Err(e) if e.is_rejection() => {
                info!(user = %username, reason = %e, "{operation} rejected");
            }
            Err(e) => {
                warn!(user = %username, error = %e, "{operation} failed");
            }
        }
    }
}

fn require<'a>(field: &str, value: &'a str) -> Result<&'a str, LedgerError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::missing_field(field));
    }
    Ok(trimmed)
}

/// Stored histories whose sum leaves the `Decimal` range are reported, not summed
fn statement(username: &str, history: &HistoryCursor) -> Result<Statement, LedgerError> {
    let balance = history
        .checked_balance()
        .ok_or_else(|| LedgerError::arithmetic_overflow("statement", username))?;

    Ok(Statement {
        username: username.to_string(),
        balance,
        transactions: history.visible_transactions().cloned().collect(),
    })
}
