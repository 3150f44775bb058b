use crate::engine::StatSummary;
use serde::Serialize;
use std::fmt::Write as _;

#[derive(Debug, Clone, Serialize)]
pub struct StatReport {
    pub schema_version: u32,
    pub generated_at: String,
    pub database: String,
    pub category: String,
    pub summaries: Vec<StatSummary>,
}

impl StatReport {
    pub fn new(database: &str, category: &str, summaries: Vec<StatSummary>) -> Self {
        Self {
            schema_version: 1,
            generated_at: chrono::Utc::now().to_rfc3339(),
            database: database.to_string(),
            category: category.to_string(),
            summaries,
        }
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        if self.summaries.is_empty() {
            let _ = writeln!(out, "No results for category '{}'.", self.category);
            return out;
        }
        for (i, s) in self.summaries.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            render_summary(&mut out, s);
        }
        out
    }
}

fn render_summary(out: &mut String, s: &StatSummary) {
    let m = &s.matrix;
    let _ = writeln!(out, "{} / {}", s.tool.to_uppercase(), s.bug_class);
    let _ = writeln!(
        out,
        "  total: {:<6} TP: {:<5} TN: {:<5} FP: {:<5} FN: {:<5}",
        s.total, m.tp, m.tn, m.fp, m.fn_
    );
    if s.timed_out > 0 || s.errors > 0 {
        let _ = writeln!(
            out,
            "  excluded: {} timedout, {} error",
            s.timed_out, s.errors
        );
    }

    let Some(r) = &s.ratios else {
        let _ = writeln!(out, "  no data");
        return;
    };
    for (label, v) in [
        ("sensitivity", r.sensitivity),
        ("specificity", r.specificity),
        ("prevalence", r.prevalence),
        ("PPV", r.ppv),
        ("NPV", r.npv),
        ("odds ratio", r.odds_ratio),
        ("relative risk", r.relative_risk),
    ] {
        let _ = writeln!(out, "  {:<14} {:.4}", label, v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confusion::ConfusionMatrix;
    use crate::diagnostics::DiagnosticRatios;

    fn summary(matrix: ConfusionMatrix, total: u64) -> StatSummary {
        StatSummary {
            tool: "asan".into(),
            bug_class: "CWE121_Stack_Based_Buffer_Overflow".into(),
            total,
            matrix,
            timed_out: 0,
            errors: 0,
            ratios: DiagnosticRatios::compute(&matrix, total),
        }
    }

    #[test]
    fn text_shows_ratio_block() {
        let r = StatReport::new("collect.db", "CWE121", vec![summary(ConfusionMatrix::new(8, 9, 1, 2), 20)]);
        let text = r.to_text();
        assert!(text.starts_with("ASAN / CWE121_Stack_Based_Buffer_Overflow"));
        assert!(text.contains("sensitivity    0.8000"));
        assert!(text.contains("odds ratio     36.0000"));
        assert!(!text.contains("no data"));
    }

    #[test]
    fn text_reports_no_data_without_ratios() {
        let r = StatReport::new("collect.db", "CWE121", vec![summary(ConfusionMatrix::default(), 0)]);
        let text = r.to_text();
        assert!(text.contains("no data"));
        assert!(!text.contains("sensitivity"));
    }

    #[test]
    fn json_has_null_ratios_for_no_data() -> anyhow::Result<()> {
        let r = StatReport::new("collect.db", "all", vec![summary(ConfusionMatrix::new(0, 1, 0, 0), 0)]);
        let v: serde_json::Value = serde_json::from_str(&r.to_json()?)?;
        let s = &v["summaries"][0];
        assert_eq!(s["tn"], 1);
        assert_eq!(s["fn"], 0);
        assert!(s["ratios"].is_null());
        assert_eq!(v["schema_version"], 1);
        Ok(())
    }
}
