use crate::engine::pool::ExecutionPool;
use crate::model::TestCase;
use crate::report::RunSummary;
use crate::storage::{InsertStatus, Store};

/// Drives a pool over a set of test cases and persists each outcome as it
/// arrives.
pub struct Runner {
    pub store: Store,
    pub pool: ExecutionPool,
}

impl Runner {
    pub fn new(store: Store, pool: ExecutionPool) -> Self {
        Self { store, pool }
    }

    pub async fn run_cases(&self, cases: Vec<TestCase>) -> anyhow::Result<RunSummary> {
        let cases = self.pool.select(cases);
        let mut summary = RunSummary {
            submitted: cases.len(),
            ..RunSummary::default()
        };

        tracing::info!(
            event = "dispatch_start",
            test_cases = cases.len(),
            workers = self.pool.parallelism()
        );

        let store = &self.store;
        let delivered = self
            .pool
            .execute(cases, |outcome| {
                let status = store.insert_if_absent(&outcome)?;
                if status == InsertStatus::Duplicate {
                    tracing::info!(
                        event = "duplicate_skipped",
                        id = %outcome.test_case_id,
                        file = %outcome.file_path
                    );
                }
                summary.record(&outcome, status);
                Ok(())
            })
            .await?;

        tracing::info!(
            event = "dispatch_complete",
            outcomes = delivered,
            inserted = summary.inserted,
            duplicates = summary.duplicates
        );
        Ok(summary)
    }
}
