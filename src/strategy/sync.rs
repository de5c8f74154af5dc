//! Synchronous replay strategy
//!
//! Streams the input with [`SyncReader`] and applies each operation in file
//! order on the calling thread. Memory use is one record plus the ledger
//! state itself. The first storage failure ends the replay.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;

use tracing::warn;

use crate::core::LedgerService;
use crate::io::SyncReader;
use crate::strategy::{write_summaries, ReplayStrategy};
use crate::types::LedgerError;

/// Single-threaded replay in file order
#[derive(Debug, Clone, Copy)]
pub struct SyncReplayStrategy;

impl ReplayStrategy for SyncReplayStrategy {
    fn replay(
        &self,
        input_path: &Path,
        service: &LedgerService,
        output: &mut dyn Write,
    ) -> Result<(), LedgerError> {
        let reader = SyncReader::new(input_path)?;
        let mut usernames = BTreeSet::new();

        for result in reader {
            match result {
                Ok(operation) => {
                    usernames.insert(operation.username().to_string());
                    // rejections are logged by the service
                    match service.apply(operation) {
                        Err(e) if !e.is_rejection() => return Err(e),
                        _ => {}
                    }
                }
                Err(e) => warn!(error = %e, "skipping invalid record"),
            }
        }

        write_summaries(service, usernames, output)
    }
}
