use serde::{Deserialize, Serialize};

/// Ground truth against harness verdict for one (tool, class) pair.
///
/// A run counts as "positive" when the tool let a known-good artifact pass:
/// `tp` = good/good, `tn` = bad/bad, `fp` = bad truth classified good,
/// `fn_` = good truth classified bad. Timed-out and harness-error rows are
/// in none of the cells.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub tp: u64,
    pub tn: u64,
    pub fp: u64,
    #[serde(rename = "fn")]
    pub fn_: u64,
}

impl ConfusionMatrix {
    pub fn new(tp: u64, tn: u64, fp: u64, fn_: u64) -> Self {
        Self { tp, tn, fp, fn_ }
    }

    /// Scored ground-truth-good rows.
    pub fn good_rows(&self) -> u64 {
        self.tp + self.fn_
    }

    /// Scored ground-truth-bad rows.
    pub fn bad_rows(&self) -> u64 {
        self.tn + self.fp
    }

    pub fn is_empty(&self) -> bool {
        self.good_rows() + self.bad_rows() == 0
    }
}
