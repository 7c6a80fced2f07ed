//! Validation metrics: ROC AUC and the thresholded classification report.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::scoring::ConfusionCounts;

/// Rank-based ROC AUC (Mann-Whitney U), with average ranks for tied
/// probabilities.
///
/// Fails when either class is absent; an AUC over a single class is
/// undefined and must not be reported as a number.
pub fn roc_auc(labels: &[bool], probabilities: &[f64]) -> Result<f64> {
    if labels.len() != probabilities.len() {
        bail!(
            "labels and probabilities differ in length ({} vs {})",
            labels.len(),
            probabilities.len()
        );
    }
    let n_pos = labels.iter().filter(|&&l| l).count();
    let n_neg = labels.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        bail!("AUC undefined: validation labels contain a single class");
    }

    let mut order: Vec<usize> = (0..labels.len()).collect();
    order.sort_by(|&a, &b| {
        probabilities[a]
            .partial_cmp(&probabilities[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    // Assign average ranks to ties, then sum positive-class ranks.
    let mut rank_sum_pos = 0.0;
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len()
            && probabilities[order[j + 1]] == probabilities[order[i]]
        {
            j += 1;
        }
        // Ranks are 1-based; ties share the mean rank of their run.
        let avg_rank = (i + j + 2) as f64 / 2.0;
        for &idx in &order[i..=j] {
            if labels[idx] {
                rank_sum_pos += avg_rank;
            }
        }
        i = j + 1;
    }

    let u = rank_sum_pos - (n_pos * (n_pos + 1)) as f64 / 2.0;
    Ok(u / (n_pos * n_neg) as f64)
}

/// Precision/recall summary for the positive (default) class at a fixed
/// threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub accuracy: f64,
    /// Actual defaulters in the evaluated set
    pub support_positive: usize,
    /// Actual non-defaulters in the evaluated set
    pub support_negative: usize,
}

impl ClassificationReport {
    /// Build the report from confusion counts.
    ///
    /// Precision/recall degenerate to 0 when their denominators are
    /// empty (no predicted or no actual positives).
    pub fn from_counts(counts: &ConfusionCounts) -> Self {
        let tp = counts.true_positives as f64;
        let fp = counts.false_positives as f64;
        let fn_ = counts.false_negatives as f64;
        let tn = counts.true_negatives as f64;

        let precision = if tp + fp > 0.0 { tp / (tp + fp) } else { 0.0 };
        let recall = if tp + fn_ > 0.0 { tp / (tp + fn_) } else { 0.0 };
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        let accuracy = (tp + tn) / counts.total() as f64;

        Self {
            precision,
            recall,
            f1,
            accuracy,
            support_positive: counts.true_positives + counts.false_negatives,
            support_negative: counts.true_negatives + counts.false_positives,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auc_perfect_ranking() {
        let labels = [false, false, true, true];
        let probas = [0.1, 0.2, 0.8, 0.9];
        assert_eq!(roc_auc(&labels, &probas).unwrap(), 1.0);
    }

    #[test]
    fn test_auc_inverted_ranking() {
        let labels = [true, true, false, false];
        let probas = [0.1, 0.2, 0.8, 0.9];
        assert_eq!(roc_auc(&labels, &probas).unwrap(), 0.0);
    }

    #[test]
    fn test_auc_with_ties_is_half_credit() {
        // All probabilities equal: AUC must come out at exactly 0.5.
        let labels = [true, false, true, false];
        let probas = [0.4, 0.4, 0.4, 0.4];
        assert!((roc_auc(&labels, &probas).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_auc_single_class_rejected() {
        let labels = [true, true];
        let probas = [0.3, 0.7];
        assert!(roc_auc(&labels, &probas).is_err());
    }

    #[test]
    fn test_report_from_counts() {
        let counts = ConfusionCounts {
            true_negatives: 5,
            false_positives: 1,
            false_negatives: 2,
            true_positives: 2,
        };
        let report = ClassificationReport::from_counts(&counts);

        assert!((report.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((report.recall - 0.5).abs() < 1e-12);
        assert!((report.accuracy - 0.7).abs() < 1e-12);
        assert_eq!(report.support_positive, 4);
        assert_eq!(report.support_negative, 6);
    }

    #[test]
    fn test_report_without_predicted_positives() {
        let counts = ConfusionCounts {
            true_negatives: 8,
            false_positives: 0,
            false_negatives: 2,
            true_positives: 0,
        };
        let report = ClassificationReport::from_counts(&counts);
        assert_eq!(report.precision, 0.0);
        assert_eq!(report.recall, 0.0);
        assert_eq!(report.f1, 0.0);
    }
}
