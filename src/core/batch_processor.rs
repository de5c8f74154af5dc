//! Batch processing with user-based partitioning for async replays
//!
//! `BatchProcessor` splits a batch of operations by username so that
//! different users are replayed concurrently while each user's operations
//! keep their input order.
//!
//! # Architecture
//!
//! ```text
//! BatchProcessor
//!     └── LedgerService  (shared store + session registry)
//! ```
//!
//! Ordering between users is not preserved. Within a user it is, because a
//! user's operations run sequentially inside a single task and the service
//! serialises them on the user's session lock anyway.
//!
//! The service blocks on session mutexes and on store I/O, so each user's
//! operations run on tokio's blocking pool rather than on a runtime worker.

use std::collections::HashMap;

use tracing::error;

use super::LedgerService;
use crate::types::{LedgerError, Operation, OperationOutcome};

/// Result of replaying a single operation
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    /// The operation that was replayed
    pub record: Operation,

    /// What the service returned for it
    pub result: Result<OperationOutcome, LedgerError>,
}

/// Batch processor with user-based partitioning
#[derive(Clone)]
pub struct BatchProcessor {
    service: LedgerService,
}

impl BatchProcessor {
    /// Create a new BatchProcessor
    ///
    /// # Arguments
    ///
    /// * `service` - The ledger service every task applies operations through
    pub fn new(service: LedgerService) -> Self {
        Self { service }
    }

    /// Partition a batch of operations by username
    ///
    /// # Returns
    ///
    /// A map from username to that user's operations, in input order.
    /// Every operation appears in exactly one partition.
    pub fn partition_by_user(&self, batch: Vec<Operation>) -> HashMap<String, Vec<Operation>> {
        let mut user_batches: HashMap<String, Vec<Operation>> = HashMap::new();

        for operation in batch {
            user_batches
                .entry(operation.username().to_string())
                .or_default()
                .push(operation);
        }

        user_batches
    }

    /// Apply one user's operations sequentially, blocking the caller
    ///
    /// Failed operations are recorded and do not stop the rest. Results keep
    /// the input order.
    pub fn process_user_operations(&self, operations: Vec<Operation>) -> Vec<ProcessingResult> {
        let mut results = Vec::with_capacity(operations.len());

        for record in operations {
            let result = self.service.apply(record.clone());
            results.push(ProcessingResult { record, result });
        }

        results
    }

    /// Replay a batch, one blocking task per user
    ///
    /// Results are grouped per user; the grouping order is unspecified.
    pub async fn process_batch(&self, batch: Vec<Operation>) -> Vec<ProcessingResult> {
        let user_batches = self.partition_by_user(batch);

        let mut tasks = Vec::with_capacity(user_batches.len());
        for (_username, operations) in user_batches {
            let processor = self.clone();
            tasks.push(tokio::task::spawn_blocking(move || {
                processor.process_user_operations(operations)
            }));
        }

        let mut results = Vec::new();
        for task in tasks {
            match task.await {
                Ok(user_results) => results.extend(user_results),
                Err(e) => error!(error = %e, "replay task panicked"),
            }
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{MemoryStore, SessionRegistry};
    use crate::types::TransactionKind;
    use rust_decimal::Decimal;
    use std::sync::Arc;

    fn processor() -> BatchProcessor {
        BatchProcessor::new(LedgerService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(SessionRegistry::new()),
        ))
    }

    fn register(username: &str) -> Operation {
        Operation::Register {
            username: username.to_string(),
            password: "pw".to_string(),
        }
    }

    fn deposit(username: &str, amount: i64) -> Operation {
        Operation::Post {
            username: username.to_string(),
            kind: TransactionKind::Deposit,
            amount: Decimal::new(amount, 0),
        }
    }

    fn undo(username: &str) -> Operation {
        Operation::Undo {
            username: username.to_string(),
        }
    }

    #[test]
    fn test_partition_by_user_empty_batch() {
        assert!(processor().partition_by_user(vec![]).is_empty());
    }

    #[test]
    fn test_partition_by_user_keeps_order() {
        let batch = vec![
            register("alice"),
            register("bob"),
            deposit("alice", 1),
            deposit("bob", 2),
            undo("alice"),
        ];

        let partitioned = processor().partition_by_user(batch);

        assert_eq!(partitioned.len(), 2);
        assert_eq!(
            partitioned["alice"],
            vec![register("alice"), deposit("alice", 1), undo("alice")]
        );
        assert_eq!(partitioned["bob"], vec![register("bob"), deposit("bob", 2)]);
    }

    #[test]
    fn test_process_user_operations_continues_after_errors() {
        let processor = processor();
        let operations = vec![deposit("alice", 5), register("alice"), deposit("alice", 5)];

        let results = processor.process_user_operations(operations);

        assert_eq!(results.len(), 3);
        assert_eq!(
            results[0].result.as_ref().unwrap_err(),
            &LedgerError::user_not_found("alice")
        );
        assert!(results[1].result.is_ok());
        let statement = results[2].result.as_ref().unwrap().statement().unwrap();
        assert_eq!(statement.balance, Decimal::new(5, 0));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_process_batch_many_users() {
        let processor = processor();
        let mut batch = Vec::new();
        for user in 0..20 {
            let name = format!("user{}", user);
            batch.push(register(&name));
            batch.push(deposit(&name, 10));
            batch.push(deposit(&name, 5));
            batch.push(undo(&name));
        }

        let results = processor.process_batch(batch).await;

        assert_eq!(results.len(), 80);
        assert!(results.iter().all(|r| r.result.is_ok()));
        for user in 0..20 {
            let statement = processor
                .service
                .statement(&format!("user{}", user))
                .unwrap();
            assert_eq!(statement.balance, Decimal::new(10, 0));
        }
    }
}
