//! Asynchronous CSV reader with batch interface
//!
//! # Architecture
//!
//! ```text
//! CSV file → AsyncReader → batches of Operations
//!                 ↓
//!           csv_format module
//!   (OperationRecord, convert_operation_record)
//! ```

use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;
use tracing::warn;

use crate::io::csv_format::{convert_operation_record, OperationRecord};
use crate::types::Operation;

/// Asynchronous CSV reader over replay operations
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self { csv_reader }
    }

    /// Read up to `batch_size` operations
    ///
    /// Invalid records are logged and skipped. Returns an empty vector at end
    /// of input.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<Operation> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut records = self.csv_reader.deserialize::<OperationRecord>();

        while batch.len() < batch_size {
            match records.next().await {
                Some(Ok(record)) => match convert_operation_record(record) {
                    Ok(operation) => batch.push(operation),
                    Err(e) => warn!(error = %e, "skipping invalid record"),
                },
                Some(Err(e)) => warn!(error = %e, "skipping unparsable record"),
                None => break,
            }
        }

        batch
    }
}
