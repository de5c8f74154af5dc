//! End-to-end replay tests
//!
//! Each fixture under tests/fixtures/<name>/ holds an `input.csv` of
//! operations and the `expected.csv` summary. Every fixture is replayed with
//! both strategies against a fresh in-memory store.

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use std::fs;
    use std::io::Write;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::NamedTempFile;
    use undo_ledger::cli::StrategyType;
    use undo_ledger::strategy::{create_strategy, ReplayConfig};
    use undo_ledger::{LedgerService, MemoryStore, SessionRegistry};

    fn normalize(text: &str) -> String {
        text.replace("\r\n", "\n")
    }

    /// Replay `tests/fixtures/{fixture_name}/input.csv` and compare the summary
    fn run_test_fixture(fixture_name: &str, strategy_type: StrategyType, config: ReplayConfig) {
        let fixture_dir = format!("tests/fixtures/{}", fixture_name);
        let input_path = format!("{}/input.csv", fixture_dir);
        let expected_path = format!("{}/expected.csv", fixture_dir);

        assert!(
            Path::new(&input_path).exists(),
            "Input file not found: {}",
            input_path
        );

        let service = LedgerService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(SessionRegistry::new()),
        );
        let strategy = create_strategy(strategy_type, Some(config));
        let mut temp_output = NamedTempFile::new().unwrap();

        strategy
            .replay(Path::new(&input_path), &service, &mut temp_output)
            .unwrap_or_else(|e| panic!("Failed to replay operations: {}", e));
        temp_output.flush().unwrap();

        let actual_output = normalize(&fs::read_to_string(temp_output.path()).unwrap());
        let expected_output = normalize(
            &fs::read_to_string(&expected_path)
                .unwrap_or_else(|e| panic!("Failed to read expected file {}: {}", expected_path, e)),
        );

        assert_eq!(
            actual_output, expected_output,
            "\n\nOutput mismatch for fixture: {} (strategy: {:?})\n\nActual output:\n{}\n\nExpected output:\n{}\n",
            fixture_name, strategy_type, actual_output, expected_output
        );
    }

    #[rstest]
    #[case("happy_path")]
    #[case("undo_redo")]
    #[case("insufficient_funds")]
    #[case("insert_after_undo")]
    #[case("multiple_users_and_invalid_records")]
    #[case("login_reload")]
    fn test_fixtures(
        #[case] fixture: &str,
        #[values(StrategyType::Sync, StrategyType::Async)] strategy: StrategyType,
    ) {
        run_test_fixture(fixture, strategy, ReplayConfig::default());
    }

    /// Small batches split one user's operations across several batches
    #[rstest]
    #[case("undo_redo")]
    #[case("insert_after_undo")]
    #[case("multiple_users_and_invalid_records")]
    fn test_fixtures_with_tiny_batches(#[case] fixture: &str) {
        run_test_fixture(fixture, StrategyType::Async, ReplayConfig::new(2, 4));
    }
}
