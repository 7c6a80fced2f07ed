//! Cost model: confusion counts and the normalized business cost score.

use serde::{Deserialize, Serialize};

use super::InvalidInputError;

/// Asymmetric misclassification costs.
///
/// `fn_cost` is the cost of a missed defaulter, `fp_cost` the cost of a
/// wrongly denied client. The defaults (10:1) reflect typical credit risk
/// asymmetry, but the ordering is caller-supplied and not enforced.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CostConfig {
    pub fn_cost: f64,
    pub fp_cost: f64,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            fn_cost: 10.0,
            fp_cost: 1.0,
        }
    }
}

/// Four-way breakdown of binary predictions against ground truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfusionCounts {
    pub true_negatives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub true_positives: usize,
}

impl ConfusionCounts {
    /// Count confusion cells from aligned label/prediction slices.
    ///
    /// `true` means default (positive class). Fails on mismatched lengths
    /// or empty input.
    pub fn from_predictions(
        labels: &[bool],
        predictions: &[bool],
    ) -> Result<Self, InvalidInputError> {
        if labels.len() != predictions.len() {
            return Err(InvalidInputError::LengthMismatch {
                labels: labels.len(),
                predictions: predictions.len(),
            });
        }
        if labels.is_empty() {
            return Err(InvalidInputError::Empty);
        }

        let mut counts = Self {
            true_negatives: 0,
            false_positives: 0,
            false_negatives: 0,
            true_positives: 0,
        };

        for (&label, &pred) in labels.iter().zip(predictions) {
            match (label, pred) {
                (false, false) => counts.true_negatives += 1,
                (false, true) => counts.false_positives += 1,
                (true, false) => counts.false_negatives += 1,
                (true, true) => counts.true_positives += 1,
            }
        }

        Ok(counts)
    }

    /// Total number of cases (the four cells always sum to the input length).
    pub fn total(&self) -> usize {
        self.true_negatives + self.false_positives + self.false_negatives + self.true_positives
    }

    /// Business cost score for these counts.
    ///
    /// `score = 1 - total_cost / max_cost` where `max_cost` prices every
    /// actual defaulter as a false negative and every actual non-defaulter
    /// as a false positive. This normalization is intentionally kept as-is
    /// for parity with previously calibrated threshold artifacts.
    pub fn business_cost_score(&self, costs: &CostConfig) -> Result<f64, InvalidInputError> {
        let fn_count = self.false_negatives as f64;
        let fp_count = self.false_positives as f64;
        let positives = (self.false_negatives + self.true_positives) as f64;
        let negatives = (self.false_positives + self.true_negatives) as f64;

        let total_cost = fn_count * costs.fn_cost + fp_count * costs.fp_cost;
        let max_cost = positives * costs.fn_cost + negatives * costs.fp_cost;

        if max_cost == 0.0 {
            return Err(InvalidInputError::ZeroMaxCost);
        }

        Ok(1.0 - total_cost / max_cost)
    }
}

/// Normalized business benefit of a binary prediction vector.
///
/// Returns a value in (-inf, 1]; exactly 1.0 only for perfect
/// classification. Pure function of its inputs.
pub fn business_cost_score(
    labels: &[bool],
    predictions: &[bool],
    costs: &CostConfig,
) -> Result<f64, InvalidInputError> {
    ConfusionCounts::from_predictions(labels, predictions)?.business_cost_score(costs)
}
