//! Production data drift monitoring.
//!
//! Compares the distribution of incoming feature matrices against the
//! reference (validation-time) distribution using the population
//! stability index per feature, and raises an alert when too large a
//! share of features has drifted.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Histogram bins used for PSI.
const PSI_BINS: usize = 10;

/// Smoothing floor so empty bins never produce infinite PSI terms.
const PSI_EPSILON: f64 = 1e-4;

/// Drift verdict for a single feature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureDrift {
    pub feature: String,
    pub psi: f64,
    pub drifted: bool,
}

/// Full drift report over a feature matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriftReport {
    pub features: Vec<FeatureDrift>,
    /// Fraction of features flagged as drifted
    pub drift_share: f64,
    /// True when drift_share reached the alert threshold
    pub alert: bool,
}

impl DriftReport {
    /// Persist the report as JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write drift report to {}", path.display()))?;
        info!(path = %path.display(), "Saved drift report");
        Ok(())
    }
}

/// PSI-based drift monitor with configurable sensitivity.
pub struct DriftMonitor {
    /// PSI above which a single feature counts as drifted
    psi_threshold: f64,
    /// Drifted-feature share at which the report raises an alert
    alert_share: f64,
}

impl DriftMonitor {
    pub fn new(psi_threshold: f64, alert_share: f64) -> Self {
        Self {
            psi_threshold,
            alert_share,
        }
    }

    /// Compare `current` rows against `reference` rows, column by column.
    ///
    /// Both matrices are row-major with one column per entry in
    /// `feature_names`.
    pub fn report(
        &self,
        feature_names: &[String],
        reference: &[Vec<f32>],
        current: &[Vec<f32>],
    ) -> Result<DriftReport> {
        if reference.is_empty() || current.is_empty() {
            bail!("Drift comparison needs non-empty reference and current sets");
        }
        let width = feature_names.len();
        if reference.iter().chain(current).any(|row| row.len() != width) {
            bail!("Row width does not match feature name count ({width})");
        }

        let mut features = Vec::with_capacity(width);
        let mut drifted_count = 0;

        for (col, name) in feature_names.iter().enumerate() {
            let ref_col: Vec<f64> = reference.iter().map(|r| r[col] as f64).collect();
            let cur_col: Vec<f64> = current.iter().map(|r| r[col] as f64).collect();

            let psi = population_stability_index(&ref_col, &cur_col);
            let drifted = psi >= self.psi_threshold;
            if drifted {
                drifted_count += 1;
                warn!(feature = %name, psi = psi, "Feature drifted");
            }

            features.push(FeatureDrift {
                feature: name.clone(),
                psi,
                drifted,
            });
        }

        let drift_share = drifted_count as f64 / width as f64;
        let alert = drift_share >= self.alert_share;

        if alert {
            warn!(
                drift_share = drift_share,
                threshold = self.alert_share,
                "ALERT: drift share exceeds acceptable range"
            );
        } else {
            info!(drift_share = drift_share, "Drift share within acceptable range");
        }

        Ok(DriftReport {
            features,
            drift_share,
            alert,
        })
    }
}

impl Default for DriftMonitor {
    fn default() -> Self {
        // PSI >= 0.2 is the conventional "significant shift" cutoff; the
        // 0.3 alert share mirrors the monitoring job this replaces.
        Self::new(0.2, 0.3)
    }
}

/// PSI between two samples of one feature.
///
/// Bins are equal-width over the reference range; everything outside the
/// range falls into the edge bins. A constant reference feature compares
/// by exact equality instead.
fn population_stability_index(reference: &[f64], current: &[f64]) -> f64 {
    let min = reference.iter().copied().fold(f64::INFINITY, f64::min);
    let max = reference.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if min == max {
        // Degenerate reference: any deviation from the constant is drift.
        let moved = current.iter().filter(|&&v| v != min).count();
        let moved_frac = moved as f64 / current.len() as f64;
        return if moved_frac == 0.0 {
            0.0
        } else {
            // Two-bucket PSI of (1, 0) vs (1 - moved_frac, moved_frac).
            psi_terms(&[1.0, 0.0], &[1.0 - moved_frac, moved_frac])
        };
    }

    let bin_width = (max - min) / PSI_BINS as f64;
    let bin_of = |v: f64| -> usize {
        let idx = ((v - min) / bin_width) as isize;
        idx.clamp(0, PSI_BINS as isize - 1) as usize
    };

    let mut ref_counts = [0u64; PSI_BINS];
    let mut cur_counts = [0u64; PSI_BINS];
    for &v in reference {
        ref_counts[bin_of(v)] += 1;
    }
    for &v in current {
        cur_counts[bin_of(v)] += 1;
    }

    let ref_fracs: Vec<f64> = ref_counts
        .iter()
        .map(|&c| c as f64 / reference.len() as f64)
        .collect();
    let cur_fracs: Vec<f64> = cur_counts
        .iter()
        .map(|&c| c as f64 / current.len() as f64)
        .collect();

    psi_terms(&ref_fracs, &cur_fracs)
}

fn psi_terms(reference: &[f64], current: &[f64]) -> f64 {
    reference
        .iter()
        .zip(current)
        .map(|(&r, &c)| {
            let r = r.max(PSI_EPSILON);
            let c = c.max(PSI_EPSILON);
            (c - r) * (c / r).ln()
        })
        .sum()
}
