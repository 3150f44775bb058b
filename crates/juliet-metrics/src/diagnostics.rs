use crate::confusion::ConfusionMatrix;
use serde::{Deserialize, Serialize};

/// Division that yields 0.0 for a zero denominator.
pub fn safe_div(n: f64, d: f64) -> f64 {
    if d == 0.0 {
        0.0
    } else {
        n / d
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticRatios {
    pub sensitivity: f64,
    pub specificity: f64,
    pub prevalence: f64,
    pub ppv: f64,
    pub npv: f64,
    pub odds_ratio: f64,
    pub relative_risk: f64,
}

impl DiagnosticRatios {
    /// `None` when `total` is zero: the population is statistically undefined
    /// and no division is attempted.
    pub fn compute(m: &ConfusionMatrix, total: u64) -> Option<Self> {
        if total == 0 {
            return None;
        }
        let (tp, tn, fp, fn_) = (m.tp as f64, m.tn as f64, m.fp as f64, m.fn_ as f64);

        let ppv = safe_div(tp, tp + fp);
        let npv = safe_div(tn, tn + fn_);
        Some(Self {
            sensitivity: safe_div(tp, tp + fn_),
            specificity: safe_div(tn, tn + fp),
            prevalence: safe_div(tp + fn_, total as f64),
            ppv,
            npv,
            odds_ratio: safe_div(tp * tn, fp * fn_),
            relative_risk: safe_div(ppv, npv),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn reference_population() {
        let m = ConfusionMatrix::new(8, 9, 1, 2);
        let r = DiagnosticRatios::compute(&m, 20).unwrap();
        assert!(close(r.sensitivity, 0.80));
        assert!(close(r.specificity, 0.90));
        assert!(close(r.ppv, 8.0 / 9.0));
        assert!(close(r.npv, 9.0 / 11.0));
        assert!(close(r.odds_ratio, 36.0));
        assert!(close(r.relative_risk, 1.086));
        assert!(close(r.prevalence, 0.5));
    }

    #[test]
    fn zero_denominators_become_zero() {
        // Perfect detector: no FP, no FN.
        let m = ConfusionMatrix::new(5, 5, 0, 0);
        let r = DiagnosticRatios::compute(&m, 10).unwrap();
        assert_eq!(r.sensitivity, 1.0);
        assert_eq!(r.odds_ratio, 0.0);
        assert!(r.odds_ratio.is_finite());

        let m = ConfusionMatrix::new(0, 3, 0, 0);
        let r = DiagnosticRatios::compute(&m, 2).unwrap();
        assert_eq!(r.sensitivity, 0.0);
        assert_eq!(r.ppv, 0.0);
        assert_eq!(r.relative_risk, 0.0);
    }

    #[test]
    fn no_total_no_ratios() {
        assert!(DiagnosticRatios::compute(&ConfusionMatrix::new(0, 1, 0, 0), 0).is_none());
        assert!(DiagnosticRatios::compute(&ConfusionMatrix::default(), 0).is_none());
    }

    #[test]
    fn sensitivity_complements_to_one() {
        let m = ConfusionMatrix::new(3, 0, 0, 7);
        let r = DiagnosticRatios::compute(&m, 20).unwrap();
        assert!(close(r.sensitivity + (1.0 - r.sensitivity), 1.0));
        assert!(close(1.0 - r.sensitivity, 0.7));
    }
}
