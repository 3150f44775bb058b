use super::{Invocation, ToolRunner};
use crate::model::{TestCase, Tool};
use std::time::Duration;

/// Leak reports are not part of the corpus ground truth.
pub const ASAN_OPTIONS: (&str, &str) = ("ASAN_OPTIONS", "detect_leaks=0");

/// Executes a natively sanitizer-instrumented artifact directly.
#[derive(Debug, Clone)]
pub struct NativeSanitizerRunner {
    timeout: Duration,
}

impl NativeSanitizerRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl ToolRunner for NativeSanitizerRunner {
    fn tool(&self) -> Tool {
        Tool::Asan
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn invocation(&self, tc: &TestCase) -> Invocation {
        Invocation {
            program: tc.file_path.clone(),
            args: Vec::new(),
            env: vec![(ASAN_OPTIONS.0.to_string(), ASAN_OPTIONS.1.to_string())],
        }
    }
}
