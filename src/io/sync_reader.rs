//! Synchronous CSV reader with iterator interface
//!
//! Streams replay records from a CSV file one row at a time and converts each
//! into an [`Operation`]. Conversion is delegated to the csv_format module.
//!
//! # Error Handling
//!
//! - Fatal errors (file not found, I/O errors) are returned from `new()`
//! - Individual record errors are yielded as `Err` items carrying the line
//!   number, so the caller can log and skip them

use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::path::Path;

use crate::io::csv_format::{convert_operation_record, OperationRecord};
use crate::types::{LedgerError, Operation};

/// Synchronous CSV reader over replay operations
#[derive(Debug)]
pub struct SyncReader {
    reader: csv::Reader<File>,
    line_num: u64,
}

impl SyncReader {
    /// Open a replay file
    ///
    /// The reader trims whitespace and accepts rows with fewer columns than
    /// the header, since `amount` and `password` are optional.
    pub fn new(path: &Path) -> Result<Self, LedgerError> {
        let file = File::open(path).map_err(|e| LedgerError::IoError {
            message: format!("Failed to open file '{}': {}", path.display(), e),
        })?;

        let reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .buffer_capacity(8 * 1024)
            .from_reader(file);

        Ok(Self {
            reader,
            line_num: 1,
        })
    }
}

impl Iterator for SyncReader {
    type Item = Result<Operation, LedgerError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut deserializer = self.reader.deserialize::<OperationRecord>();
        let next = deserializer.next()?;
        self.line_num += 1;

        let line = self.line_num;
        Some(match next {
            Ok(record) => convert_operation_record(record).map_err(|e| {
                if e.is_rejection() {
                    LedgerError::ParseError {
                        line: Some(line),
                        message: e.to_string(),
                    }
                } else {
                    e
                }
            }),
            Err(e) => Err(e.into()),
        })
    }
}
