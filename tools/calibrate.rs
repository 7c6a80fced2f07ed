//! Threshold Calibration Run
//!
//! Joins the raw extracts, splits them, scores the validation set through
//! the exported classifier, calibrates the cost-optimal decision
//! threshold, persists the artifact, and writes a drift report comparing
//! validation against the held-out test features.

use anyhow::{Context, Result};
use credit_scoring_pipeline::{
    artifacts::FsArtifactStore,
    config::AppConfig,
    feature_extractor::FeatureExtractor,
    models::ScoringEngine,
    monitoring::DriftMonitor,
    pipeline::{assemble_dataset, load_sources, split_dataset},
    pipeline::split::SPLIT_SEED,
    training::Calibrator,
    types::ClientProfile,
};
use tracing::info;

fn labels_of(profiles: &[ClientProfile]) -> Vec<bool> {
    profiles.iter().filter_map(|p| p.label()).collect()
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("calibrate=info".parse()?)
                .add_directive("credit_scoring_pipeline=info".parse()?),
        )
        .init();

    info!("Starting threshold calibration");

    let args: Vec<String> = std::env::args().collect();
    let config_path = args.get(1).map(|s| s.as_str()).unwrap_or("config/config.toml");
    let data_dir = args.get(2).map(|s| s.as_str()).unwrap_or("data/samples");

    let config = AppConfig::load_from_path(config_path)?;

    // Join and split the labeled extracts.
    let sources = load_sources(data_dir)?;
    let dataset = assemble_dataset(&sources);
    let splits = split_dataset(&dataset, SPLIT_SEED)?;

    let extractor = FeatureExtractor::new(config.model.categories.clone());
    let engine = ScoringEngine::new(
        &config.model.model_path,
        extractor.feature_names(),
        config.model.onnx_threads,
    )
    .context("Failed to load the exported classifier")?;

    // Calibrate on validation predictions.
    let valid_features = extractor.extract_matrix(&splits.valid);
    let valid_labels = labels_of(&splits.valid);

    let store = FsArtifactStore::new(&config.artifacts.threshold_path);
    let calibrator = Calibrator::new(&store, config.scoring.cost_config())
        .with_grid(config.scoring.grid());

    let outcome = calibrator.calibrate_model(&engine, &valid_features, &valid_labels)?;
    info!(
        threshold = outcome.threshold,
        business_cost_score = outcome.business_cost_score,
        valid_auc = outcome.valid_auc,
        "Threshold calibrated and persisted"
    );

    // Holdout evaluation at the calibrated threshold.
    let test_features = extractor.extract_matrix(&splits.test);
    let test_labels = labels_of(&splits.test);
    let test_probas = engine.predict_batch(&test_features)?;
    let holdout_score =
        calibrator.evaluate_holdout(&test_labels, &test_probas, outcome.threshold)?;
    info!(business_cost_holdout = holdout_score, "Holdout evaluated");

    // Drift report: test features against the validation reference.
    let monitor = DriftMonitor::new(
        config.monitoring.psi_threshold,
        config.monitoring.alert_share,
    );
    let report = monitor.report(&extractor.feature_names(), &valid_features, &test_features)?;
    report.save(&config.monitoring.report_path)?;
    info!(
        drift_share = report.drift_share,
        alert = report.alert,
        "Drift report written"
    );

    Ok(())
}
