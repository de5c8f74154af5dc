//! Asynchronous batch replay strategy
//!
//! # Architecture
//!
//! ```text
//! AsyncReplayStrategy
//!     ├── ReplayConfig (batch_size, max_concurrent_users)
//!     ├── AsyncReader (batch CSV reading)
//!     └── BatchProcessor (user partitioning, one task per user)
//!         └── LedgerService
//! ```
//!
//! Batches are processed one after another, so a user's operations keep
//! file order even when they span batches. Inside a batch, different users
//! run concurrently on the runtime's blocking pool, which is sized to
//! `max_concurrent_users`. A storage failure anywhere in a batch ends the
//! replay once that batch has finished.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;

use tokio_util::compat::TokioAsyncReadCompatExt;
use tracing::{debug, warn};

use crate::core::{BatchProcessor, LedgerService};
use crate::io::AsyncReader;
use crate::strategy::{write_summaries, ReplayStrategy};
use crate::types::LedgerError;

/// Configuration for batched replays
#[derive(Clone, Debug, PartialEq)]
pub struct ReplayConfig {
    /// Number of operations read per batch
    pub batch_size: usize,
    /// Runtime threads, and so the number of users replayed at once
    pub max_concurrent_users: usize,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent_users: num_cpus::get(),
        }
    }
}

impl ReplayConfig {
    /// Create a ReplayConfig; zero values fall back to the defaults
    pub fn new(batch_size: usize, max_concurrent_users: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            warn!(
                "invalid batch_size ({}), using default ({})",
                batch_size, default.batch_size
            );
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent_users = if max_concurrent_users == 0 {
            warn!(
                "invalid max_concurrent_users ({}), using default ({})",
                max_concurrent_users, default.max_concurrent_users
            );
            default.max_concurrent_users
        } else {
            max_concurrent_users
        };

        Self {
            batch_size,
            max_concurrent_users,
        }
    }
}

/// Multi-threaded replay, batch by batch
#[derive(Debug, Clone)]
pub struct AsyncReplayStrategy {
    config: ReplayConfig,
}

impl AsyncReplayStrategy {
    pub fn new(config: ReplayConfig) -> Self {
        Self { config }
    }
}

impl ReplayStrategy for AsyncReplayStrategy {
    fn replay(
        &self,
        input_path: &Path,
        service: &LedgerService,
        output: &mut dyn Write,
    ) -> Result<(), LedgerError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.max_concurrent_users)
            .max_blocking_threads(self.config.max_concurrent_users)
            .build()
            .map_err(|e| LedgerError::IoError {
                message: format!("Failed to create tokio runtime: {}", e),
            })?;

        let usernames = runtime.block_on(async {
            let processor = BatchProcessor::new(service.clone());

            let file = tokio::fs::File::open(input_path)
                .await
                .map_err(|e| LedgerError::IoError {
                    message: format!("Failed to open file '{}': {}", input_path.display(), e),
                })?;
            let mut reader = AsyncReader::new(file.compat());

            let mut usernames = BTreeSet::new();
            loop {
                let batch = reader.read_batch(self.config.batch_size).await;
                if batch.is_empty() {
                    break;
                }

                usernames.extend(batch.iter().map(|op| op.username().to_string()));
                let results = processor.process_batch(batch).await;
                debug!(
                    applied = results.iter().filter(|r| r.result.is_ok()).count(),
                    total = results.len(),
                    "batch replayed"
                );

                // rejections were logged by the service; failures end the replay
                if let Some(failure) = results
                    .into_iter()
                    .filter_map(|r| r.result.err())
                    .find(|e| !e.is_rejection())
                {
                    return Err(failure);
                }
            }

            Ok::<_, LedgerError>(usernames)
        })?;

        write_summaries(service, usernames, output)
    }
}
