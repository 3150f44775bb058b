use crate::config::HarnessConfig;
use crate::errors::HarnessError;
use crate::model::{ExecutionOutcome, TestCase};
use crate::tools::{RunnerSet, ToolRunner};
use anyhow::Context;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

/// Bounded fan-out of test cases to their tool runners.
///
/// Every submitted test case yields exactly one outcome on the stream, in
/// completion order. Runner failures and worker panics become
/// `Classification::Error` outcomes rather than disappearing.
pub struct ExecutionPool {
    runners: RunnerSet,
    parallelism: usize,
}

impl ExecutionPool {
    pub fn new(runners: RunnerSet, parallelism: usize) -> Self {
        Self {
            runners,
            parallelism: parallelism.max(1),
        }
    }

    pub fn from_config(cfg: &HarnessConfig) -> Result<Self, HarnessError> {
        Ok(Self::new(RunnerSet::from_config(cfg)?, cfg.parallelism))
    }

    pub fn parallelism(&self) -> usize {
        self.parallelism
    }

    /// Keeps the test cases whose tool has a runner in this pool.
    pub fn select(&self, cases: Vec<TestCase>) -> Vec<TestCase> {
        let tools = self.runners.tools();
        cases.into_iter().filter(|tc| tools.contains(&tc.tool)).collect()
    }

    /// Dispatches all cases and hands each outcome to `sink` as it completes.
    /// Returns the number of outcomes delivered.
    ///
    /// If `sink` fails, every in-flight case is cancelled (its process group
    /// killed) before the error is returned.
    pub async fn execute<F>(&self, cases: Vec<TestCase>, mut sink: F) -> anyhow::Result<usize>
    where
        F: FnMut(ExecutionOutcome) -> anyhow::Result<()>,
    {
        let (tx, mut rx) = mpsc::channel(self.parallelism * 2);
        let dispatcher = tokio::spawn(dispatch(
            self.runners.clone(),
            self.parallelism,
            cases,
            tx,
        ));

        let mut delivered = 0;
        while let Some(outcome) = rx.recv().await {
            if let Err(e) = sink(outcome) {
                drop(rx);
                if let Err(join) = dispatcher.await {
                    tracing::warn!(event = "dispatcher_failed", error = %join);
                }
                return Err(e);
            }
            delivered += 1;
        }
        dispatcher.await.context("dispatcher task failed")?;
        Ok(delivered)
    }
}

/// Keeps at most `parallelism` cases running and forwards outcomes in
/// completion order. Returns early, cancelling everything still running,
/// once the receiver is gone.
async fn dispatch(
    runners: RunnerSet,
    parallelism: usize,
    cases: Vec<TestCase>,
    tx: mpsc::Sender<ExecutionOutcome>,
) {
    let mut queue = cases.into_iter().enumerate();
    let mut pending: HashMap<usize, TestCase> = HashMap::new();
    let mut running = JoinSet::new();

    loop {
        while running.len() < parallelism {
            let Some((idx, tc)) = queue.next() else {
                break;
            };
            let runner = runners.get(tc.tool);
            pending.insert(idx, tc.clone());
            running.spawn(async move { (idx, run_one(runner, tc).await) });
        }

        let joined = tokio::select! {
            joined = running.join_next() => joined,
            _ = tx.closed() => {
                running.shutdown().await;
                return;
            }
        };
        let outcome = match joined {
            None => break,
            Some(Ok((idx, outcome))) => {
                pending.remove(&idx);
                outcome
            }
            Some(Err(e)) => {
                tracing::warn!(event = "worker_panic", error = %e);
                continue;
            }
        };
        if tx.send(outcome).await.is_err() {
            running.shutdown().await;
            return;
        }
    }

    // Whatever is left had its worker die before reporting.
    for tc in pending.into_values() {
        let outcome = ExecutionOutcome::harness_error(&tc, "worker panicked");
        if tx.send(outcome).await.is_err() {
            return;
        }
    }
}

async fn run_one(runner: Option<Arc<dyn ToolRunner>>, tc: TestCase) -> ExecutionOutcome {
    let Some(runner) = runner else {
        return ExecutionOutcome::harness_error(
            &tc,
            &format!("no runner configured for tool {}", tc.tool),
        );
    };

    match runner.run(&tc).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::warn!(event = "harness_error", id = %tc.id, file = %tc.file_path.display(), error = %format!("{:#}", e));
            ExecutionOutcome::harness_error(&tc, &format!("{:#}", e))
        }
    }
}
