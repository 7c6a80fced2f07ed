//! Credit Scoring Pipeline Library
//!
//! Scores credit default risk with a cost-optimized decision threshold:
//! joins raw extracts, engineers features, calibrates the threshold on
//! validation probabilities, serves decisions over NATS, and monitors
//! production feature drift.

pub mod artifacts;
pub mod config;
pub mod consumer;
pub mod feature_extractor;
pub mod metrics;
pub mod models;
pub mod monitoring;
pub mod pipeline;
pub mod producer;
pub mod scoring;
pub mod training;
pub mod types;

pub use artifacts::{ArtifactStore, FsArtifactStore, ThresholdArtifact};
pub use config::AppConfig;
pub use consumer::RequestConsumer;
pub use feature_extractor::FeatureExtractor;
pub use models::ScoringEngine;
pub use producer::DecisionProducer;
pub use scoring::{business_cost_score, optimal_threshold, CostConfig, InvalidInputError};
pub use types::{ClientProfile, Decision, ScoringDecision, ScoringRequest};
