//! Business-cost scoring and decision threshold selection.
//!
//! The decision threshold is not chosen by a generic statistical metric:
//! a missed defaulter (false negative) costs the business far more than a
//! wrongly denied client (false positive), so the threshold maximizes a
//! normalized cost score with asymmetric penalties.

pub mod cost;
pub mod threshold;

pub use cost::{business_cost_score, ConfusionCounts, CostConfig};
pub use threshold::{
    default_grid, optimal_threshold, ThresholdSearch, DEFAULT_GRID_POINTS, DEFAULT_GRID_START,
    DEFAULT_GRID_STOP,
};

use thiserror::Error;

/// Rejected input to the cost model or threshold search.
///
/// These are raised immediately and never swallowed: a wrong threshold has
/// direct business consequences, so degenerate inputs must surface to the
/// caller instead of producing NaN/Inf scores.
#[derive(Debug, Error, PartialEq)]
pub enum InvalidInputError {
    #[error("labels and predictions differ in length ({labels} vs {predictions})")]
    LengthMismatch { labels: usize, predictions: usize },

    #[error("label and prediction vectors must be non-empty")]
    Empty,

    #[error("threshold grid is empty")]
    EmptyGrid,

    #[error("worst-case cost is zero, business cost score is undefined")]
    ZeroMaxCost,
}
