//! Process-wide registry of per-user history sessions
//!
//! The registry maps a username to that user's [`Session`]. It is an explicit
//! object handed to the [`LedgerService`](super::LedgerService) rather than
//! ambient global state.
//!
//! # Locking
//!
//! Each entry is an `Arc<Mutex<Session>>`. The map itself is a `DashMap`, so
//! lookups for different users never contend, and the per-entry mutex gives
//! each user a single writer. Callers hold the user's mutex for the whole
//! reload-plus-operation sequence so that insert, undo, redo and the derived
//! views are atomic with respect to other requests for the same user. The
//! DashMap shard guard is always released before the session mutex is taken.
//!
//! # Lifecycle
//!
//! Entries are created on first use and never removed, so every request for
//! a user locks the same mutex for the life of the process. Reloads and
//! [`reset`](SessionRegistry::reset) clear an entry in place. A cleared
//! entry, like one lost on process restart, is rebuilt from storage on the
//! next request with the newest transaction as the current node.

use dashmap::DashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::history::HistoryCursor;
use crate::types::{Transaction, UserId};

/// Shared handle to one user's session
pub type SessionHandle = Arc<Mutex<Session>>;

/// One user's in-memory history plus whether it has been loaded
#[derive(Debug, Default)]
pub struct Session {
    history: HistoryCursor,
    /// Set once the history has been rebuilt from storage
    owner: Option<UserId>,
}

impl Session {
    pub fn history(&self) -> &HistoryCursor {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut HistoryCursor {
        &mut self.history
    }

    /// The user whose transactions were last loaded, if any
    pub fn owner(&self) -> Option<UserId> {
        self.owner
    }

    /// Whether the history reflects storage for `owner`
    pub fn is_loaded_for(&self, owner: UserId) -> bool {
        self.owner == Some(owner)
    }

    /// Reset the history and reinsert `transactions`, newest becoming current
    pub fn reload<I>(&mut self, owner: UserId, transactions: I)
    where
        I: IntoIterator<Item = Transaction>,
    {
        self.history.reload(transactions);
        self.owner = Some(owner);
    }

    /// Swap in a history that was built elsewhere
    pub fn install(&mut self, owner: UserId, history: HistoryCursor) {
        self.history = history;
        self.owner = Some(owner);
    }

    /// Forget the history; returns whether one was loaded
    pub fn clear(&mut self) -> bool {
        self.history.reset();
        self.owner.take().is_some()
    }
}

/// Lock a session
///
/// A poisoned mutex is recovered rather than propagated: the session is a
/// cache of storage and the next reload restores it.
pub fn lock_session(handle: &SessionHandle) -> MutexGuard<'_, Session> {
    handle.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Registry of sessions keyed by username
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, SessionHandle>,
}

impl SessionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Get the user's session, creating an empty one if missing
    ///
    /// Concurrent callers for the same username always receive the same
    /// handle.
    pub fn get_or_create(&self, username: &str) -> SessionHandle {
        if let Some(existing) = self.sessions.get(username) {
            return Arc::clone(existing.value());
        }

        Arc::clone(
            self.sessions
                .entry(username.to_string())
                .or_insert_with(SessionHandle::default)
                .value(),
        )
    }

    /// Get the user's session without creating one
    pub fn get(&self, username: &str) -> Option<SessionHandle> {
        self.sessions
            .get(username)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Reset the user's session and reinsert `transactions`
    ///
    /// Takes the user's lock for the duration of the rebuild.
    pub fn reload_from<I>(&self, username: &str, owner: UserId, transactions: I) -> SessionHandle
    where
        I: IntoIterator<Item = Transaction>,
    {
        let handle = self.get_or_create(username);
        lock_session(&handle).reload(owner, transactions);
        handle
    }

    /// Clear the user's session in place; returns whether one was loaded
    ///
    /// Waits for any request holding the user's lock. The entry stays in the
    /// map so later requests still serialise on the same mutex.
    pub fn reset(&self, username: &str) -> bool {
        match self.get(username) {
            Some(handle) => lock_session(&handle).clear(),
            None => false,
        }
    }

    pub fn contains(&self, username: &str) -> bool {
        self.sessions.contains_key(username)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
