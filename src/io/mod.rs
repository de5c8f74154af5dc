//! I/O module
//!
//! Handles CSV parsing, output and file-backed storage.
//!
//! # Components
//!
//! - `csv_format` - Replay record conversion, statement and summary output
//! - `sync_reader` - Synchronous replay reader with iterator interface
//! - `async_reader` - Asynchronous replay reader with batch interface
//! - `csv_store` - [`LedgerStore`](crate::core::LedgerStore) over CSV files

pub mod async_reader;
pub mod csv_format;
pub mod csv_store;
pub mod sync_reader;

pub use async_reader::AsyncReader;
pub use csv_format::{
    convert_operation_record, write_statement, write_summaries_csv, OperationRecord, UserSummary,
};
pub use csv_store::CsvStore;
pub use sync_reader::SyncReader;
