use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Detector under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    /// Memory-taint instrumentation engine running inside the patched emulator.
    Qte,
    /// Address-sanitizer-backed emulator.
    Qasan,
    /// Natively compiled sanitizer build; the artifact is executed directly.
    Asan,
}

impl Tool {
    pub const ALL: [Tool; 3] = [Tool::Qte, Tool::Qasan, Tool::Asan];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tool::Qte => "qte",
            Tool::Qasan => "qasan",
            Tool::Asan => "asan",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tool {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "qte" => Ok(Tool::Qte),
            "qasan" => Ok(Tool::Qasan),
            "asan" => Ok(Tool::Asan),
            other => Err(format!("unknown tool '{}' (expected qte|qasan|asan)", other)),
        }
    }
}

/// Known answer for a corpus artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroundTruth {
    Good,
    Bad,
}

impl GroundTruth {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroundTruth::Good => "good",
            GroundTruth::Bad => "bad",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "good" => Some(GroundTruth::Good),
            "bad" => Some(GroundTruth::Bad),
            _ => None,
        }
    }
}

impl fmt::Display for GroundTruth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The harness verdict on a single run. Derived from process exit behaviour only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Clean exit: the tool did not flag a defect.
    Good,
    /// Non-zero exit or signal: the tool flagged (or crashed on) a defect.
    Bad,
    /// Exceeded the wall-clock budget.
    TimedOut,
    /// The harness itself failed to execute the run (spawn failure, worker panic).
    Error,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Good => "good",
            Classification::Bad => "bad",
            Classification::TimedOut => "timedout",
            Classification::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "good" => Some(Classification::Good),
            "bad" => Some(Classification::Bad),
            "timedout" => Some(Classification::TimedOut),
            "error" => Some(Classification::Error),
            _ => None,
        }
    }

    /// Pure mapping from process exit to verdict. Never looks at ground truth.
    pub fn from_exit(exit: &ProcessExit) -> Self {
        match exit {
            ProcessExit::Completed(0) => Classification::Good,
            ProcessExit::Completed(_) => Classification::Bad,
            ProcessExit::TimedOut => Classification::TimedOut,
        }
    }

    /// Whether a row with this verdict belongs to the scored population.
    pub fn is_scored(&self) -> bool {
        matches!(self, Classification::Good | Classification::Bad)
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a tool process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessExit {
    /// Exit status, or `-signal` when the process was killed by a signal.
    Completed(i32),
    TimedOut,
}

/// Return code recorded for timed-out runs.
pub const TIMEOUT_RETURN_CODE: i32 = 1;
/// Return code recorded for harness errors.
pub const HARNESS_ERROR_RETURN_CODE: i32 = -1;

impl ProcessExit {
    pub fn return_code(&self) -> i32 {
        match self {
            ProcessExit::Completed(code) => *code,
            ProcessExit::TimedOut => TIMEOUT_RETURN_CODE,
        }
    }
}

/// Operator choice of which tool(s) to exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestSuite {
    #[default]
    All,
    Only(Tool),
}

impl TestSuite {
    pub fn includes(&self, tool: Tool) -> bool {
        match self {
            TestSuite::All => true,
            TestSuite::Only(t) => *t == tool,
        }
    }

    pub fn tools(&self) -> Vec<Tool> {
        Tool::ALL.into_iter().filter(|t| self.includes(*t)).collect()
    }
}

impl FromStr for TestSuite {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            return Ok(TestSuite::All);
        }
        s.parse::<Tool>().map(TestSuite::Only)
    }
}

/// One corpus artifact paired with the tool it targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub id: String,
    pub file_path: PathBuf,
    pub tool: Tool,
    pub ground_truth: GroundTruth,
    pub bug_class: String,
}

impl TestCase {
    pub fn new(file_path: PathBuf, tool: Tool, ground_truth: GroundTruth, bug_class: String) -> Self {
        let id = crate::fingerprint::test_case_id(&file_path.to_string_lossy(), tool, ground_truth);
        Self {
            id,
            file_path,
            tool,
            ground_truth,
            bug_class,
        }
    }
}

/// Result of running one [`TestCase`] against its tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub test_case_id: String,
    pub file_path: String,
    pub tool: Tool,
    pub ground_truth: GroundTruth,
    pub bug_class: String,
    pub return_code: i32,
    #[serde(skip)]
    pub raw_output: Vec<u8>,
    pub classification: Classification,
}

impl ExecutionOutcome {
    pub fn from_exit(tc: &TestCase, exit: ProcessExit, raw_output: Vec<u8>) -> Self {
        Self::with_verdict(
            tc,
            exit.return_code(),
            raw_output,
            Classification::from_exit(&exit),
        )
    }

    pub fn harness_error(tc: &TestCase, message: &str) -> Self {
        Self::with_verdict(
            tc,
            HARNESS_ERROR_RETURN_CODE,
            message.as_bytes().to_vec(),
            Classification::Error,
        )
    }

    fn with_verdict(
        tc: &TestCase,
        return_code: i32,
        raw_output: Vec<u8>,
        classification: Classification,
    ) -> Self {
        Self {
            test_case_id: tc.id.clone(),
            file_path: tc.file_path.to_string_lossy().into_owned(),
            tool: tc.tool,
            ground_truth: tc.ground_truth,
            bug_class: tc.bug_class.clone(),
            return_code,
            raw_output,
            classification,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_ignores_everything_but_exit() {
        assert_eq!(
            Classification::from_exit(&ProcessExit::Completed(0)),
            Classification::Good
        );
        assert_eq!(
            Classification::from_exit(&ProcessExit::Completed(1)),
            Classification::Bad
        );
        assert_eq!(
            Classification::from_exit(&ProcessExit::Completed(-11)),
            Classification::Bad
        );
        assert_eq!(
            Classification::from_exit(&ProcessExit::TimedOut),
            Classification::TimedOut
        );
    }

    #[test]
    fn timeout_uses_sentinel_code() {
        assert_eq!(ProcessExit::TimedOut.return_code(), TIMEOUT_RETURN_CODE);
        assert_eq!(ProcessExit::Completed(42).return_code(), 42);
    }

    #[test]
    fn suite_parsing() {
        assert_eq!("all".parse::<TestSuite>().unwrap(), TestSuite::All);
        assert_eq!(
            "qasan".parse::<TestSuite>().unwrap(),
            TestSuite::Only(Tool::Qasan)
        );
        assert!("valgrind".parse::<TestSuite>().is_err());
        assert_eq!(TestSuite::Only(Tool::Asan).tools(), vec![Tool::Asan]);
        assert_eq!(TestSuite::All.tools().len(), 3);
    }

    #[test]
    fn classification_round_trips_through_column_text() {
        for c in [
            Classification::Good,
            Classification::Bad,
            Classification::TimedOut,
            Classification::Error,
        ] {
            assert_eq!(Classification::parse(c.as_str()), Some(c));
        }
    }
}
