//! Core ledger logic
//!
//! This module contains the ledger components:
//! - `history` - The undo/redo history cursor and balance derivation
//! - `session_registry` - Per-user sessions behind per-user locks
//! - `traits` - The storage port
//! - `memory_store` - In-memory storage
//! - `credentials` - Password hashing and verification
//! - `ledger_service` - Orchestration of storage and sessions
//! - `batch_processor` - Concurrent per-user replay of operation batches

pub mod batch_processor;
pub mod credentials;
pub mod history;
pub mod ledger_service;
pub mod memory_store;
pub mod session_registry;
pub mod traits;

pub use batch_processor::{BatchProcessor, ProcessingResult};
pub use history::HistoryCursor;
pub use ledger_service::LedgerService;
pub use memory_store::MemoryStore;
pub use session_registry::{lock_session, Session, SessionHandle, SessionRegistry};
pub use traits::LedgerStore;
