use crate::errors::HarnessError;
use crate::model::{GroundTruth, TestCase, Tool};
use anyhow::Context;
use regex::Regex;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;
use walkdir::WalkDir;

/// Suffix of compiled corpus binaries.
pub const ARTIFACT_SUFFIX: &str = ".out";

const TESTS_SUFFIX: &str = "_tests";

fn artifact_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^CWE.*__.*_.*\.out$").expect("static regex"))
}

/// Walks a corpus tree and turns every `.out` artifact into a classified [`TestCase`].
pub struct CorpusScanner {
    root: PathBuf,
}

impl CorpusScanner {
    pub fn new(root: &Path) -> anyhow::Result<Self> {
        let root = std::fs::canonicalize(root)
            .with_context(|| format!("corpus root not accessible: {}", root.display()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lazily yields one item per candidate artifact. Order follows the
    /// directory walk and must not be relied upon.
    pub fn scan(&self) -> impl Iterator<Item = Result<TestCase, HarnessError>> + '_ {
        WalkDir::new(&self.root)
            .follow_links(true)
            .into_iter()
            .filter_map(move |entry| match entry {
                Err(source) => Some(Err(HarnessError::CorpusWalk {
                    root: self.root.clone(),
                    source,
                })),
                Ok(entry) => {
                    let is_artifact = entry.file_type().is_file()
                        && entry
                            .file_name()
                            .to_str()
                            .is_some_and(|n| n.ends_with(ARTIFACT_SUFFIX));
                    is_artifact.then(|| classify_path(entry.path()))
                }
            })
    }

    /// Scans the whole tree, stopping at the first malformed entry.
    pub fn collect(&self) -> Result<Vec<TestCase>, HarnessError> {
        self.scan().collect()
    }
}

/// Classifies a single artifact path of the form
/// `.../<tool>_[label_]tests/.../<CWE class>/<grouping...>/<CWE...__..._....out>`.
pub fn classify_path(path: &Path) -> Result<TestCase, HarnessError> {
    let mut comps = Vec::new();
    for c in path.components() {
        if let Component::Normal(os) = c {
            let s = os
                .to_str()
                .ok_or_else(|| HarnessError::malformed(path, "path is not valid UTF-8"))?;
            comps.push(s);
        }
    }

    let Some((file_name, dirs)) = comps.split_last() else {
        return Err(HarnessError::malformed(path, "empty path"));
    };

    if !artifact_name_re().is_match(file_name) {
        return Err(HarnessError::malformed(
            path,
            format!("artifact name '{}' is not of the form CWE...__..._....out", file_name),
        ));
    }

    let tests_idx = dirs
        .iter()
        .rposition(|c| c.ends_with(TESTS_SUFFIX))
        .ok_or_else(|| HarnessError::malformed(path, "no '<tool>_tests' directory"))?;

    let tool_segment = dirs[tests_idx];
    let tool_name = tool_segment.split('_').next().unwrap_or_default();
    let tool: Tool = tool_name.parse().map_err(|e: String| {
        HarnessError::malformed(path, format!("directory '{}': {}", tool_segment, e))
    })?;

    let below = &dirs[tests_idx + 1..];
    let class_idx = below
        .iter()
        .enumerate()
        .rev()
        .skip(1)
        .find(|(_, c)| c.starts_with("CWE"))
        .map(|(i, _)| i)
        .ok_or_else(|| {
            HarnessError::malformed(
                path,
                "no CWE class directory followed by a good/bad directory",
            )
        })?;

    let bug_class = below[class_idx].to_string();
    let grouping = below[class_idx + 1..].join("/");

    let truth = if grouping.contains("bad") {
        GroundTruth::Bad
    } else if grouping.contains("good") {
        GroundTruth::Good
    } else {
        return Err(HarnessError::malformed(
            path,
            format!("grouping '{}' names neither good nor bad", grouping),
        ));
    };

    Ok(TestCase::new(path.to_path_buf(), tool, truth, bug_class))
}
