//! Replay strategies
//!
//! A replay reads a file of operation records, applies each one through the
//! [`LedgerService`] and writes a per-user summary. The strategy decides how
//! the file is read and how much work runs concurrently; the results are the
//! same either way.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;

use crate::cli::StrategyType;
use crate::core::LedgerService;
use crate::io::{write_summaries_csv, UserSummary};
use crate::types::LedgerError;

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncReplayStrategy, ReplayConfig};
pub use sync::SyncReplayStrategy;

/// A complete replay pipeline: read, apply, summarize
pub trait ReplayStrategy: Send + Sync {
    /// Replay `input_path` against `service` and write summaries to `output`
    ///
    /// Rejected records are logged and skipped. Storage failures stop the
    /// replay and are returned, as are failures to read the input or write
    /// the output.
    fn replay(
        &self,
        input_path: &Path,
        service: &LedgerService,
        output: &mut dyn Write,
    ) -> Result<(), LedgerError>;
}

/// Build the strategy selected on the command line
///
/// `config` only affects the async strategy; `None` means defaults.
pub fn create_strategy(
    strategy_type: StrategyType,
    config: Option<ReplayConfig>,
) -> Box<dyn ReplayStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncReplayStrategy),
        StrategyType::Async => Box::new(AsyncReplayStrategy::new(config.unwrap_or_default())),
    }
}

/// Write summaries for every named user that exists
///
/// Names that never got registered are left out.
pub(crate) fn write_summaries(
    service: &LedgerService,
    usernames: BTreeSet<String>,
    output: &mut dyn Write,
) -> Result<(), LedgerError> {
    let mut summaries = Vec::with_capacity(usernames.len());
    for username in usernames {
        match service.statement(&username) {
            Ok(statement) => summaries.push(UserSummary::from(&statement)),
            Err(LedgerError::UserNotFound { .. }) => {}
            Err(e) => return Err(e),
        }
    }

    write_summaries_csv(&summaries, output)
}
