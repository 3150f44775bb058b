use crate::model::{Classification, ExecutionOutcome, Tool};
use crate::storage::InsertStatus;
use std::collections::BTreeMap;

/// Tallies of one collection run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub submitted: usize,
    pub good: usize,
    pub bad: usize,
    pub timed_out: usize,
    pub errors: usize,
    pub inserted: usize,
    pub duplicates: usize,
    pub per_tool: BTreeMap<Tool, usize>,
}

impl RunSummary {
    pub fn record(&mut self, outcome: &ExecutionOutcome, status: InsertStatus) {
        match outcome.classification {
            Classification::Good => self.good += 1,
            Classification::Bad => self.bad += 1,
            Classification::TimedOut => self.timed_out += 1,
            Classification::Error => self.errors += 1,
        }
        match status {
            InsertStatus::Inserted => self.inserted += 1,
            InsertStatus::Duplicate => self.duplicates += 1,
        }
        *self.per_tool.entry(outcome.tool).or_default() += 1;
    }

    pub fn completed(&self) -> usize {
        self.good + self.bad + self.timed_out + self.errors
    }
}

pub fn print_summary(s: &RunSummary) {
    eprintln!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for (tool, n) in &s.per_tool {
        eprintln!("{:<6} {} test cases", tool.as_str(), n);
    }
    eprintln!(
        "Summary: {} of {} completed: {} good, {} bad, {} timedout, {} error",
        s.completed(),
        s.submitted,
        s.good,
        s.bad,
        s.timed_out,
        s.errors
    );
    let dup_hint = if s.duplicates > 0 {
        " (already in database, kept existing rows)"
    } else {
        ""
    };
    eprintln!(
        "Stored: {} new, {} duplicates skipped{}",
        s.inserted, s.duplicates, dup_hint
    );
}
