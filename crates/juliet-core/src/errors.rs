use crate::model::Tool;
use std::path::PathBuf;
use thiserror::Error;

/// Setup and classification failures. These halt the pipeline; tool behaviour
/// during execution never does.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("malformed corpus path {}: {reason}", path.display())]
    MalformedCorpusPath { path: PathBuf, reason: String },

    #[error("{tool} {kind} doesn't exist: {}", path.display())]
    MissingToolArtifact {
        tool: Tool,
        kind: ArtifactKind,
        path: PathBuf,
    },

    #[error("database file doesn't exist: {}", path.display())]
    MissingDatabase { path: PathBuf },

    #[error("failed to read corpus entry under {}: {source}", root.display())]
    CorpusWalk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("config error: {0}")]
    Config(String),
}

impl HarnessError {
    pub fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        HarnessError::MalformedCorpusPath {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Binary,
    Library,
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtifactKind::Binary => f.write_str("binary"),
            ArtifactKind::Library => f.write_str("intercept library"),
        }
    }
}
