use crate::config::HarnessConfig;
use crate::errors::HarnessError;
use crate::model::{ExecutionOutcome, TestCase, Tool};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

pub mod emulator;
pub mod native;
pub mod process;

pub use emulator::EmulatorRunner;
pub use native::NativeSanitizerRunner;
pub use process::{invoke, Invocation, ProcessReport};

/// Executes one test case under a specific detector.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    fn tool(&self) -> Tool;

    fn timeout(&self) -> Duration;

    /// Program, arguments and extra environment for this test case.
    fn invocation(&self, tc: &TestCase) -> Invocation;

    /// Runs the test case. `Err` means the harness could not execute it at all;
    /// exit codes, crashes and timeouts are all reported as `Ok` outcomes.
    async fn run(&self, tc: &TestCase) -> anyhow::Result<ExecutionOutcome> {
        let inv = self.invocation(tc);
        let report = invoke(&inv, self.timeout()).await?;
        let outcome = ExecutionOutcome::from_exit(tc, report.exit, report.output);
        tracing::debug!(
            event = "run_complete",
            tool = %tc.tool,
            id = %tc.id,
            ret_code = outcome.return_code,
            status = %outcome.classification,
            elapsed_ms = report.elapsed.as_millis() as u64
        );
        Ok(outcome)
    }
}

/// The runners selected for a run, keyed by tool.
#[derive(Clone, Default)]
pub struct RunnerSet {
    runners: BTreeMap<Tool, Arc<dyn ToolRunner>>,
}

impl RunnerSet {
    /// Builds one runner per tool in the configured suite. Missing emulator
    /// binaries or libraries fail here, before anything is dispatched.
    pub fn from_config(cfg: &HarnessConfig) -> Result<Self, HarnessError> {
        let mut set = Self::default();
        for tool in cfg.suite.tools() {
            let runner: Arc<dyn ToolRunner> = match tool {
                Tool::Qte => Arc::new(EmulatorRunner::taint_engine(cfg.qte.clone(), cfg.timeout)?),
                Tool::Qasan => Arc::new(EmulatorRunner::sanitizer_emulator(
                    cfg.qasan.clone(),
                    cfg.timeout,
                )?),
                Tool::Asan => Arc::new(NativeSanitizerRunner::new(cfg.timeout)),
            };
            set.insert(runner);
        }
        Ok(set)
    }

    pub fn insert(&mut self, runner: Arc<dyn ToolRunner>) {
        self.runners.insert(runner.tool(), runner);
    }

    pub fn get(&self, tool: Tool) -> Option<Arc<dyn ToolRunner>> {
        self.runners.get(&tool).cloned()
    }

    pub fn tools(&self) -> Vec<Tool> {
        self.runners.keys().copied().collect()
    }
}
