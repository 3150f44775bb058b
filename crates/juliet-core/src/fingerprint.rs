use crate::model::{GroundTruth, Tool};
use sha2::{Digest, Sha256};

pub fn sha256_hex(s: &str) -> String {
    let mut h = Sha256::new();
    h.update(s.as_bytes());
    hex::encode(h.finalize())
}

/// Content-addressed identifier of a test case: `sha256(file_path || tool || truth)`.
///
/// The parts are concatenated without separators so that ids stay compatible
/// with databases produced by earlier collection runs.
pub fn test_case_id(file_path: &str, tool: Tool, truth: GroundTruth) -> String {
    let raw = format!("{}{}{}", file_path, tool.as_str(), truth.as_str());
    sha256_hex(&raw)
}
