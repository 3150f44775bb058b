use crate::errors::{ArtifactKind, HarnessError};
use crate::model::{TestSuite, Tool};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_DATABASE: &str = "collect.db";
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Binary + companion intercept library of an emulator-hosted tool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmulatorArtifacts {
    pub binary: PathBuf,
    pub library: PathBuf,
}

impl EmulatorArtifacts {
    pub fn new(binary: impl Into<PathBuf>, library: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            library: library.into(),
        }
    }

    /// Both files must be present before any test case is dispatched.
    pub fn verify(&self, tool: Tool) -> Result<(), HarnessError> {
        for (kind, path) in [
            (ArtifactKind::Binary, &self.binary),
            (ArtifactKind::Library, &self.library),
        ] {
            if !path.is_file() {
                return Err(HarnessError::MissingToolArtifact {
                    tool,
                    kind,
                    path: path.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Immutable run configuration, built once at startup and handed to the
/// pool and every tool runner.
#[derive(Clone, Debug)]
pub struct HarnessConfig {
    pub corpus_root: PathBuf,
    pub db_path: PathBuf,
    pub suite: TestSuite,
    pub timeout: Duration,
    pub parallelism: usize,
    pub qte: EmulatorArtifacts,
    pub qasan: EmulatorArtifacts,
}

impl HarnessConfig {
    pub fn new(qte: EmulatorArtifacts, qasan: EmulatorArtifacts) -> Self {
        Self {
            corpus_root: PathBuf::from("."),
            db_path: PathBuf::from(DEFAULT_DATABASE),
            suite: TestSuite::All,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            parallelism: default_parallelism(),
            qte,
            qasan,
        }
    }

    /// Applies `JULIET_TIMEOUT_SECS` / `JULIET_PARALLEL` when set and parseable.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("JULIET_TIMEOUT_SECS") {
            if let Ok(n) = v.parse::<u64>() {
                if n > 0 {
                    self.timeout = Duration::from_secs(n);
                }
            }
        }
        if let Ok(v) = env::var("JULIET_PARALLEL") {
            if let Ok(n) = v.parse::<usize>() {
                self.parallelism = n.max(1);
            }
        }
        self
    }

    pub fn artifacts(&self, tool: Tool) -> Option<&EmulatorArtifacts> {
        match tool {
            Tool::Qte => Some(&self.qte),
            Tool::Qasan => Some(&self.qasan),
            Tool::Asan => None,
        }
    }

    pub fn validate(&self) -> Result<(), HarnessError> {
        if self.timeout.is_zero() {
            return Err(HarnessError::Config("timeout must be greater than zero".into()));
        }
        if self.parallelism == 0 {
            return Err(HarnessError::Config("parallelism must be at least 1".into()));
        }
        if !self.corpus_root.is_dir() {
            return Err(HarnessError::Config(format!(
                "corpus root is not a directory: {}",
                self.corpus_root.display()
            )));
        }
        Ok(())
    }

    pub fn db_exists(&self) -> bool {
        Path::new(&self.db_path).exists()
    }
}

/// One worker per logical core, minus one for the orchestrator and store writer.
pub fn default_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get().saturating_sub(1))
        .unwrap_or(1)
        .max(1)
}
