//! Grid search for the cost-optimal decision threshold.

use tracing::debug;

use super::cost::{business_cost_score, CostConfig};
use super::InvalidInputError;

/// Default candidate grid bounds: 50 evenly spaced points in [0.05, 0.95].
pub const DEFAULT_GRID_START: f64 = 0.05;
pub const DEFAULT_GRID_STOP: f64 = 0.95;
pub const DEFAULT_GRID_POINTS: usize = 50;

/// Winning threshold and the score it achieved on the candidate grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdSearch {
    pub threshold: f64,
    pub score: f64,
}

/// Evenly spaced candidate thresholds, endpoints inclusive.
pub fn default_grid() -> Vec<f64> {
    linspace(DEFAULT_GRID_START, DEFAULT_GRID_STOP, DEFAULT_GRID_POINTS)
}

fn linspace(start: f64, stop: f64, points: usize) -> Vec<f64> {
    if points < 2 {
        return vec![start];
    }
    let step = (stop - start) / (points - 1) as f64;
    (0..points).map(|i| start + step * i as f64).collect()
}

/// Search the candidate grid for the threshold maximizing the business
/// cost score of `probability >= threshold` binarization.
///
/// The grid is walked in the order supplied (ascending for the default
/// grid) and the incumbent is replaced only on a strictly greater score.
/// On ties the first-seen candidate wins, which deterministically prefers
/// the lowest threshold among equals; a looser boundary denies fewer
/// clients. Do not relax the comparison to `>=`: that would silently move
/// production decision boundaries.
///
/// The returned threshold is always an element of the grid. Deterministic
/// and pure; each grid point is one full confusion-matrix pass.
pub fn optimal_threshold(
    labels: &[bool],
    probabilities: &[f64],
    grid: Option<&[f64]>,
    costs: &CostConfig,
) -> Result<ThresholdSearch, InvalidInputError> {
    if labels.len() != probabilities.len() {
        return Err(InvalidInputError::LengthMismatch {
            labels: labels.len(),
            predictions: probabilities.len(),
        });
    }
    if labels.is_empty() {
        return Err(InvalidInputError::Empty);
    }

    let default_candidates;
    let candidates = match grid {
        Some(g) => g,
        None => {
            default_candidates = default_grid();
            &default_candidates[..]
        }
    };
    if candidates.is_empty() {
        return Err(InvalidInputError::EmptyGrid);
    }

    // The incumbent score is -inf, so the first grid evaluation always
    // replaces the placeholder threshold.
    let mut best = ThresholdSearch {
        threshold: 0.5,
        score: f64::NEG_INFINITY,
    };

    for &candidate in candidates {
        let predictions: Vec<bool> = probabilities.iter().map(|&p| p >= candidate).collect();
        let score = business_cost_score(labels, &predictions, costs)?;
        if score > best.score {
            best = ThresholdSearch {
                threshold: candidate,
                score,
            };
        }
    }

    debug!(
        threshold = best.threshold,
        score = best.score,
        grid_points = candidates.len(),
        cases = labels.len(),
        "threshold search complete"
    );

    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_bools(v: &[u8]) -> Vec<bool> {
        v.iter().map(|&x| x != 0).collect()
    }

    #[test]
    fn test_default_grid_shape() {
        let grid = default_grid();
        assert_eq!(grid.len(), DEFAULT_GRID_POINTS);
        assert!((grid[0] - DEFAULT_GRID_START).abs() < 1e-12);
        assert!((grid[grid.len() - 1] - DEFAULT_GRID_STOP).abs() < 1e-12);
        assert!(grid.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_perfectly_separable_probabilities() {
        let labels = as_bools(&[0, 0, 0, 1, 1, 1]);
        let probas = [0.1, 0.2, 0.4, 0.6, 0.7, 0.9];

        let best =
            optimal_threshold(&labels, &probas, None, &CostConfig::default()).unwrap();

        assert_eq!(best.score, 1.0);
        // Every grid point in (0.4, 0.6] separates the classes perfectly;
        // first-seen-wins must return the lowest of them.
        assert!(best.threshold > 0.4 && best.threshold <= 0.6);
        let grid = default_grid();
        let first_separating = grid
            .iter()
            .copied()
            .find(|&t| t > 0.4 && t <= 0.6)
            .unwrap();
        assert!((best.threshold - first_separating).abs() < 1e-12);
    }

    #[test]
    fn test_returned_threshold_is_grid_member() {
        let labels = as_bools(&[0, 1, 0, 1, 1, 0, 1, 0]);
        let probas = [0.3, 0.8, 0.2, 0.55, 0.9, 0.45, 0.7, 0.1];

        let best =
            optimal_threshold(&labels, &probas, None, &CostConfig::default()).unwrap();
        assert!(default_grid().iter().any(|&t| t == best.threshold));

        let custom = [0.25, 0.5, 0.75];
        let best = optimal_threshold(&labels, &probas, Some(&custom), &CostConfig::default())
            .unwrap();
        assert!(custom.contains(&best.threshold));
    }

    #[test]
    fn test_tie_break_prefers_lowest_threshold() {
        // Probabilities cluster at the extremes, so every candidate in the
        // gap yields identical (perfect) confusion counts.
        let labels = as_bools(&[0, 1]);
        let probas = [0.1, 0.9];
        let grid = [0.2, 0.5, 0.8];

        let best =
            optimal_threshold(&labels, &probas, Some(&grid), &CostConfig::default()).unwrap();
        assert_eq!(best.threshold, 0.2);
        assert_eq!(best.score, 1.0);
    }

    #[test]
    fn test_deterministic_across_calls() {
        let labels = as_bools(&[0, 1, 1, 0, 1, 0, 0, 1, 1, 0]);
        let probas = [0.15, 0.85, 0.6, 0.4, 0.75, 0.3, 0.5, 0.65, 0.9, 0.2];

        let a = optimal_threshold(&labels, &probas, None, &CostConfig::default()).unwrap();
        let b = optimal_threshold(&labels, &probas, None, &CostConfig::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_grid_rejected() {
        let labels = as_bools(&[0, 1]);
        let probas = [0.2, 0.8];

        let err = optimal_threshold(&labels, &probas, Some(&[]), &CostConfig::default());
        assert_eq!(err, Err(InvalidInputError::EmptyGrid));
    }

    #[test]
    fn test_degenerate_cost_config_propagates() {
        let costs = CostConfig {
            fn_cost: 0.0,
            fp_cost: 0.0,
        };
        let labels = as_bools(&[0, 1]);
        let probas = [0.2, 0.8];

        let err = optimal_threshold(&labels, &probas, None, &costs);
        assert_eq!(err, Err(InvalidInputError::ZeroMaxCost));
    }

    #[test]
    fn test_mismatched_inputs_rejected() {
        let err = optimal_threshold(&[true], &[0.5, 0.6], None, &CostConfig::default());
        assert_eq!(
            err,
            Err(InvalidInputError::LengthMismatch {
                labels: 1,
                predictions: 2
            })
        );
    }
}
