//! Evaluation metrics
//!
//! Accuracy alone hides how the minority emotion clusters fare, so the
//! report always carries per-class precision/recall/F1 along with macro and
//! support-weighted averages.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Precision, recall and F1 for one class
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub class: usize,
    pub precision: f32,
    pub recall: f32,
    pub f1: f32,
    /// Number of true samples of this class
    pub support: usize,
}

/// Averaged precision, recall and F1
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AverageMetrics {
    pub precision: f32,
    pub recall: f32,
    pub f1: f32,
}

/// Per-class and averaged classification metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f32,
    pub macro_avg: AverageMetrics,
    pub weighted_avg: AverageMetrics,
    pub total_support: usize,
}

fn ratio(numerator: usize, denominator: usize) -> f32 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f32 / denominator as f32
    }
}

fn f1(precision: f32, recall: f32) -> f32 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

fn support_weighted(classes: &[ClassMetrics], total: usize, metric: impl Fn(&ClassMetrics) -> f32) -> f32 {
    classes
        .iter()
        .map(|c| metric(c) * c.support as f32)
        .sum::<f32>()
        / total as f32
}

impl ClassificationReport {
    /// Compute the report for paired true/predicted labels
    ///
    /// Classes appearing in either `y_true` or `y_pred` are reported.
    /// Undefined ratios (no predictions, no support) count as zero.
    pub fn compute(y_true: &[usize], y_pred: &[usize]) -> Self {
        let n = y_true.len().min(y_pred.len());
        let labels: BTreeSet<usize> = y_true[..n].iter().chain(&y_pred[..n]).copied().collect();

        let classes: Vec<ClassMetrics> = labels
            .into_iter()
            .map(|class| {
                let mut tp = 0;
                let mut predicted = 0;
                let mut support = 0;
                for (&t, &p) in y_true[..n].iter().zip(&y_pred[..n]) {
                    if p == class {
                        predicted += 1;
                    }
                    if t == class {
                        support += 1;
                        if p == class {
                            tp += 1;
                        }
                    }
                }
                let precision = ratio(tp, predicted);
                let recall = ratio(tp, support);
                ClassMetrics {
                    class,
                    precision,
                    recall,
                    f1: f1(precision, recall),
                    support,
                }
            })
            .collect();

        let correct = y_true[..n]
            .iter()
            .zip(&y_pred[..n])
            .filter(|(t, p)| t == p)
            .count();

        let macro_avg = if classes.is_empty() {
            AverageMetrics::default()
        } else {
            let k = classes.len() as f32;
            AverageMetrics {
                precision: classes.iter().map(|c| c.precision).sum::<f32>() / k,
                recall: classes.iter().map(|c| c.recall).sum::<f32>() / k,
                f1: classes.iter().map(|c| c.f1).sum::<f32>() / k,
            }
        };

        let weighted_avg = if n == 0 {
            AverageMetrics::default()
        } else {
            AverageMetrics {
                precision: support_weighted(&classes, n, |c| c.precision),
                recall: support_weighted(&classes, n, |c| c.recall),
                f1: support_weighted(&classes, n, |c| c.f1),
            }
        };

        Self {
            classes,
            accuracy: ratio(correct, n),
            macro_avg,
            weighted_avg,
            total_support: n,
        }
    }

    #[inline]
    pub fn macro_f1(&self) -> f32 {
        self.macro_avg.f1
    }

    #[inline]
    pub fn weighted_f1(&self) -> f32 {
        self.weighted_avg.f1
    }

    pub fn class(&self, class: usize) -> Option<&ClassMetrics> {
        self.classes.iter().find(|c| c.class == class)
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>12} {:>9} {:>9} {:>9} {:>9}", "", "precision", "recall", "f1-score", "support")?;
        writeln!(f)?;
        for c in &self.classes {
            writeln!(
                f,
                "{:>12} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                c.class, c.precision, c.recall, c.f1, c.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>12} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.total_support
        )?;
        for (label, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>12} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                label, avg.precision, avg.recall, avg.f1, self.total_support
            )?;
        }
        Ok(())
    }
}
