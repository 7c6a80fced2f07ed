//! Training-side orchestration: threshold calibration against validation
//! predictions and persistence of the resulting artifact.
//!
//! Model fitting itself happens elsewhere (models arrive as ONNX
//! exports); this module owns everything between "we have validation
//! probabilities" and "a threshold artifact is deployed".

pub mod report;

pub use report::{roc_auc, ClassificationReport};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::artifacts::{ArtifactStore, ThresholdArtifact};
use crate::scoring::{business_cost_score, optimal_threshold, ConfusionCounts, CostConfig};

/// Anything that maps a feature vector to a default probability.
///
/// Seam between calibration and the ONNX engine, so calibration logic is
/// testable with a stub model.
pub trait ProbabilityModel {
    fn predict_proba(&self, features: &[f32]) -> Result<f64>;
}

/// Everything a calibration run produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationOutcome {
    /// Chosen decision threshold (always a grid member)
    pub threshold: f64,
    /// Business cost score at that threshold on validation data
    pub business_cost_score: f64,
    /// Validation ROC AUC
    pub valid_auc: f64,
    /// Classification report at the chosen threshold
    pub report: ClassificationReport,
}

/// Calibrates and persists the decision threshold for a trained model.
pub struct Calibrator<'a> {
    store: &'a dyn ArtifactStore,
    costs: CostConfig,
    grid: Option<Vec<f64>>,
}

impl<'a> Calibrator<'a> {
    pub fn new(store: &'a dyn ArtifactStore, costs: CostConfig) -> Self {
        Self {
            store,
            costs,
            grid: None,
        }
    }

    /// Override the default candidate grid.
    pub fn with_grid(mut self, grid: Vec<f64>) -> Self {
        self.grid = Some(grid);
        self
    }

    /// Run the model over validation features and calibrate from its
    /// probabilities.
    pub fn calibrate_model(
        &self,
        model: &dyn ProbabilityModel,
        features: &[Vec<f32>],
        labels: &[bool],
    ) -> Result<CalibrationOutcome> {
        let probabilities: Vec<f64> = features
            .iter()
            .map(|f| model.predict_proba(f))
            .collect::<Result<_>>()
            .context("Model inference failed during calibration")?;
        self.calibrate(labels, &probabilities)
    }

    /// Calibrate the threshold from validation labels and probabilities,
    /// persist the artifact, and return the full outcome.
    ///
    /// Any scoring error aborts the run; a threshold is never silently
    /// substituted.
    pub fn calibrate(&self, labels: &[bool], probabilities: &[f64]) -> Result<CalibrationOutcome> {
        let valid_auc = roc_auc(labels, probabilities)?;

        let search = optimal_threshold(
            labels,
            probabilities,
            self.grid.as_deref(),
            &self.costs,
        )
        .context("Threshold search failed")?;

        let predictions: Vec<bool> = probabilities
            .iter()
            .map(|&p| p >= search.threshold)
            .collect();
        let counts = ConfusionCounts::from_predictions(labels, &predictions)?;
        let report = ClassificationReport::from_counts(&counts);

        self.store
            .save_threshold(&ThresholdArtifact {
                threshold: search.threshold,
            })
            .context("Failed to persist threshold artifact")?;

        info!(
            threshold = search.threshold,
            business_cost_score = search.score,
            valid_auc = valid_auc,
            recall = report.recall,
            precision = report.precision,
            "Calibration complete"
        );

        Ok(CalibrationOutcome {
            threshold: search.threshold,
            business_cost_score: search.score,
            valid_auc,
            report,
        })
    }

    /// Business cost score of a model on held-out data at a fixed
    /// (already calibrated) threshold.
    pub fn evaluate_holdout(
        &self,
        labels: &[bool],
        probabilities: &[f64],
        threshold: f64,
    ) -> Result<f64> {
        let predictions: Vec<bool> = probabilities.iter().map(|&p| p >= threshold).collect();
        let score = business_cost_score(labels, &predictions, &self.costs)?;
        info!(
            threshold = threshold,
            business_cost_holdout = score,
            cases = labels.len(),
            "Holdout evaluation complete"
        );
        Ok(score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::FsArtifactStore;
    use crate::scoring::default_grid;

    struct StubModel;

    impl ProbabilityModel for StubModel {
        fn predict_proba(&self, features: &[f32]) -> Result<f64> {
            // First feature is already a probability.
            Ok(features[0] as f64)
        }
    }

    fn store_in(dir: &tempfile::TempDir) -> FsArtifactStore {
        FsArtifactStore::new(dir.path().join("threshold.json"))
    }

    #[test]
    fn test_calibration_persists_grid_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let calibrator = Calibrator::new(&store, CostConfig::default());

        let labels = [false, false, false, true, true, true];
        let probas = [0.1, 0.2, 0.4, 0.6, 0.7, 0.9];

        let outcome = calibrator.calibrate(&labels, &probas).unwrap();

        assert_eq!(outcome.business_cost_score, 1.0);
        assert_eq!(outcome.valid_auc, 1.0);
        assert_eq!(outcome.report.recall, 1.0);
        assert!(default_grid().contains(&outcome.threshold));

        // The artifact on disk matches what the run reported.
        let saved = store.load_threshold().unwrap();
        assert_eq!(saved.threshold, outcome.threshold);
    }

    #[test]
    fn test_calibration_through_model_seam() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let calibrator = Calibrator::new(&store, CostConfig::default());

        let features: Vec<Vec<f32>> =
            [0.1, 0.3, 0.8, 0.9].iter().map(|&p| vec![p, 0.0]).collect();
        let labels = [false, false, true, true];

        let outcome = calibrator
            .calibrate_model(&StubModel, &features, &labels)
            .unwrap();
        assert_eq!(outcome.business_cost_score, 1.0);
    }

    #[test]
    fn test_custom_grid_is_respected() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let grid = vec![0.25, 0.5, 0.75];
        let calibrator =
            Calibrator::new(&store, CostConfig::default()).with_grid(grid.clone());

        let labels = [false, true, false, true];
        let probas = [0.2, 0.8, 0.3, 0.9];

        let outcome = calibrator.calibrate(&labels, &probas).unwrap();
        assert!(grid.contains(&outcome.threshold));
    }

    #[test]
    fn test_single_class_validation_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let calibrator = Calibrator::new(&store, CostConfig::default());

        let labels = [true, true, true];
        let probas = [0.5, 0.6, 0.7];

        assert!(calibrator.calibrate(&labels, &probas).is_err());
        // Nothing persisted on an aborted run.
        assert!(store.load_threshold().is_err());
    }

    #[test]
    fn test_holdout_uses_fixed_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let calibrator = Calibrator::new(&store, CostConfig::default());

        let labels = [true, true, false, false];
        let probas = [0.1, 0.2, 0.05, 0.15];

        // Threshold 0.5 misses both defaulters: tn=2 fp=0 fn=2 tp=0.
        let score = calibrator.evaluate_holdout(&labels, &probas, 0.5).unwrap();
        assert!((score - (1.0 - 20.0 / 22.0)).abs() < 1e-12);
    }
}
