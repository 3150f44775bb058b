use crate::category::Category;
use crate::confusion::ConfusionMatrix;
use crate::diagnostics::DiagnosticRatios;
use juliet_core::model::{Classification, GroundTruth, Tool};
use juliet_core::storage::Store;
use serde::{Deserialize, Serialize};

/// Per (tool, class) statistics. Derived on demand, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatSummary {
    pub tool: String,
    pub bug_class: String,
    /// Twice the scored ground-truth-good count: the corpus ships matched
    /// good/bad pairs.
    pub total: u64,
    #[serde(flatten)]
    pub matrix: ConfusionMatrix,
    pub timed_out: u64,
    pub errors: u64,
    /// `None` reads as "no data".
    pub ratios: Option<DiagnosticRatios>,
}

impl StatSummary {
    pub fn has_data(&self) -> bool {
        self.ratios.is_some()
    }
}

/// Stateless view over a [`Store`]; every figure is recomputed from rows.
pub struct StatisticsEngine<'a> {
    store: &'a Store,
}

impl<'a> StatisticsEngine<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    pub fn confusion(&self, tool: &str, class: &str) -> anyhow::Result<ConfusionMatrix> {
        let s = self.store;
        Ok(ConfusionMatrix {
            tp: s.count_verdicts(tool, class, GroundTruth::Good, Classification::Good)?,
            tn: s.count_verdicts(tool, class, GroundTruth::Bad, Classification::Bad)?,
            fp: s.count_verdicts(tool, class, GroundTruth::Bad, Classification::Good)?,
            fn_: s.count_verdicts(tool, class, GroundTruth::Good, Classification::Bad)?,
        })
    }

    pub fn summarize(&self, tool: &str, class: &str) -> anyhow::Result<StatSummary> {
        let total = 2 * self.store.count_population(tool, class, GroundTruth::Good)?;
        let matrix = self.confusion(tool, class)?;
        let ratios = DiagnosticRatios::compute(&matrix, total);
        if ratios.is_none() {
            tracing::debug!(event = "no_data", tool, class);
        }
        Ok(StatSummary {
            tool: tool.to_string(),
            bug_class: class.to_string(),
            total,
            matrix,
            timed_out: self.store.count_status(tool, class, Classification::TimedOut)?,
            errors: self.store.count_status(tool, class, Classification::Error)?,
            ratios,
        })
    }

    /// Summaries for every stored (tool, class) pair in `category`, optionally
    /// restricted to one tool. A short id or class name with no stored rows
    /// still yields a "no data" summary per requested tool.
    pub fn summarize_category(
        &self,
        category: &Category,
        tool: Option<Tool>,
    ) -> anyhow::Result<Vec<StatSummary>> {
        let pairs: Vec<(String, String)> = self
            .store
            .pairs()?
            .into_iter()
            .filter(|(t, c)| category.matches(c) && tool.map_or(true, |want| want.as_str() == t))
            .collect();

        if pairs.is_empty() {
            return match category {
                Category::All => Ok(Vec::new()),
                Category::Cwe(class) => {
                    let tools = tool.map(|t| vec![t]).unwrap_or_else(|| Tool::ALL.to_vec());
                    tools
                        .into_iter()
                        .map(|t| self.summarize(t.as_str(), class))
                        .collect()
                }
            };
        }

        pairs
            .iter()
            .map(|(t, c)| self.summarize(t, c))
            .collect()
    }
}
