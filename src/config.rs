//! Configuration management for the credit scoring pipeline

use crate::scoring::{CostConfig, DEFAULT_GRID_POINTS, DEFAULT_GRID_START, DEFAULT_GRID_STOP};
use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub nats: NatsConfig,
    pub model: ModelConfig,
    pub artifacts: ArtifactsConfig,
    pub scoring: ScoringConfig,
    pub pipeline: PipelineConfig,
    pub monitoring: MonitoringConfig,
    pub logging: LoggingConfig,
}

/// NATS connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    /// NATS server URL
    pub url: String,
    /// Subject for incoming scoring requests
    pub request_subject: String,
    /// Subject for outgoing decisions
    pub decision_subject: String,
}

/// ONNX model configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Path to the exported classifier
    pub model_path: String,
    /// Product categories the feature extractor was trained with
    pub categories: Vec<String>,
    /// Number of threads for ONNX inference (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
}

/// Artifact persistence configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactsConfig {
    /// Where the calibrated threshold lives
    pub threshold_path: String,
    /// Threshold used when no artifact has been calibrated yet
    #[serde(default = "default_threshold")]
    pub default_threshold: f64,
}

/// Cost model and grid-search configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    /// Cost of a missed defaulter
    #[serde(default = "default_fn_cost")]
    pub fn_cost: f64,
    /// Cost of a wrongly denied client
    #[serde(default = "default_fp_cost")]
    pub fp_cost: f64,
    /// Candidate grid lower bound
    #[serde(default = "default_grid_start")]
    pub grid_start: f64,
    /// Candidate grid upper bound
    #[serde(default = "default_grid_stop")]
    pub grid_stop: f64,
    /// Number of grid points
    #[serde(default = "default_grid_points")]
    pub grid_points: usize,
}

impl ScoringConfig {
    pub fn cost_config(&self) -> CostConfig {
        CostConfig {
            fn_cost: self.fn_cost,
            fp_cost: self.fp_cost,
        }
    }

    /// Candidate grid described by this config, ascending.
    pub fn grid(&self) -> Vec<f64> {
        if self.grid_points < 2 {
            return vec![self.grid_start];
        }
        let step = (self.grid_stop - self.grid_start) / (self.grid_points - 1) as f64;
        (0..self.grid_points)
            .map(|i| self.grid_start + step * i as f64)
            .collect()
    }
}

/// Serving pipeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Number of concurrent scoring workers
    pub workers: usize,
}

/// Drift monitoring configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    /// Per-feature PSI drift cutoff
    #[serde(default = "default_psi_threshold")]
    pub psi_threshold: f64,
    /// Drifted-feature share that raises an alert
    #[serde(default = "default_alert_share")]
    pub alert_share: f64,
    /// Where drift reports are written
    pub report_path: String,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

fn default_onnx_threads() -> usize {
    1
}

fn default_threshold() -> f64 {
    0.5
}

fn default_fn_cost() -> f64 {
    10.0
}

fn default_fp_cost() -> f64 {
    1.0
}

fn default_grid_start() -> f64 {
    DEFAULT_GRID_START
}

fn default_grid_stop() -> f64 {
    DEFAULT_GRID_STOP
}

fn default_grid_points() -> usize {
    DEFAULT_GRID_POINTS
}

fn default_psi_threshold() -> f64 {
    0.2
}

fn default_alert_share() -> f64 {
    0.3
}

impl AppConfig {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            nats: NatsConfig {
                url: "nats://localhost:4222".to_string(),
                request_subject: "scoring.requests".to_string(),
                decision_subject: "scoring.decisions".to_string(),
            },
            model: ModelConfig {
                model_path: "models/gradient_boosting.onnx".to_string(),
                categories: vec![
                    "card".to_string(),
                    "loan".to_string(),
                    "mortgage".to_string(),
                ],
                onnx_threads: 1,
            },
            artifacts: ArtifactsConfig {
                threshold_path: "artifacts/models/threshold.json".to_string(),
                default_threshold: 0.5,
            },
            scoring: ScoringConfig {
                fn_cost: 10.0,
                fp_cost: 1.0,
                grid_start: DEFAULT_GRID_START,
                grid_stop: DEFAULT_GRID_STOP,
                grid_points: DEFAULT_GRID_POINTS,
            },
            pipeline: PipelineConfig { workers: 4 },
            monitoring: MonitoringConfig {
                psi_threshold: 0.2,
                alert_share: 0.3,
                report_path: "monitoring/reports/data_drift_report.json".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "json".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.nats.url, "nats://localhost:4222");
        assert_eq!(config.artifacts.default_threshold, 0.5);
        assert_eq!(config.scoring.fn_cost, 10.0);
        assert_eq!(config.scoring.fp_cost, 1.0);
        assert_eq!(config.pipeline.workers, 4);
    }

    #[test]
    fn test_scoring_grid_matches_defaults() {
        let config = AppConfig::default();
        let grid = config.scoring.grid();
        assert_eq!(grid.len(), DEFAULT_GRID_POINTS);
        assert!((grid[0] - DEFAULT_GRID_START).abs() < 1e-12);
        assert!((grid[grid.len() - 1] - DEFAULT_GRID_STOP).abs() < 1e-12);
    }

    #[test]
    fn test_cost_config_conversion() {
        let config = AppConfig::default();
        let costs = config.scoring.cost_config();
        assert_eq!(costs.fn_cost, 10.0);
        assert_eq!(costs.fp_cost, 1.0);
    }
}
