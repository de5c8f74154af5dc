//! Undo Ledger Library
//! # Overview
//!
//! A per-user ledger of deposits and withdraws with undo and redo. Each
//! user's transactions form a history with a cursor; the balance and the
//! visible transaction list are always derived from the active entries at or
//! before the cursor.
//!
//! # Architecture
//!
//! - [`types`] - Domain types (Transaction, User, Operation, Statement, LedgerError)
//! - [`core`] - Ledger logic:
//!   - [`core::history`] - The history cursor: insert, undo, redo, balance
//!   - [`core::session_registry`] - One locked history per user
//!   - [`core::ledger_service`] - Persist-then-mutate orchestration
//!   - [`core::traits`] - The storage port, with [`core::MemoryStore`]
//! - [`io`] - CSV replay readers, output formats and [`io::CsvStore`]
//! - [`strategy`] - Sync and async replay pipelines
//! - [`cli`] - Argument parsing, commands and the interactive shell
//!
//! # Undo and Redo
//!
//! - **Insert**: appends after the cursor and becomes current; anything
//!   previously undone past the cursor can no longer be redone
//! - **Undo**: marks the nearest active entry at or before the cursor as
//!   undone and moves the cursor just before it
//! - **Redo**: marks the nearest undone entry after the cursor as active and
//!   moves the cursor onto it
//!
//! Statuses are persisted; the cursor position is not. A history rebuilt
//! from storage puts the cursor on the newest entry.

pub mod cli;
pub mod core;
pub mod io;
pub mod strategy;
pub mod types;

pub use core::{HistoryCursor, LedgerService, LedgerStore, MemoryStore, SessionRegistry};
pub use io::CsvStore;
pub use types::{
    LedgerError, NavigationOutcome, Operation, OperationOutcome, Statement, Transaction,
    TransactionId, TransactionKind, TransactionStatus, User, UserId,
};
