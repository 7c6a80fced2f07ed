//! Credit Scoring Service - Main Entry Point
//!
//! Consumes scoring requests from NATS, applies the deployed model and
//! calibrated decision threshold, and publishes credit decisions.
//! Supports parallel request processing for high throughput.

use anyhow::Result;
use credit_scoring_pipeline::{
    artifacts::{load_threshold_or, FsArtifactStore},
    config::AppConfig,
    consumer::RequestConsumer,
    feature_extractor::FeatureExtractor,
    metrics::{MetricsReporter, ServiceMetrics},
    models::ScoringEngine,
    producer::DecisionProducer,
    types::{ScoringDecision, ScoringRequest},
};
use futures::StreamExt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("credit_scoring_pipeline=info".parse()?),
        )
        .init();

    info!("Starting Credit Scoring Service");

    // Load configuration
    let config = AppConfig::load()?;
    info!("Configuration loaded successfully");

    // Load the calibrated threshold; a fresh deployment without a
    // calibration run falls back to the configured default.
    let store = FsArtifactStore::new(&config.artifacts.threshold_path);
    let threshold = load_threshold_or(&store, config.artifacts.default_threshold)?;
    info!(threshold = threshold, "Decision threshold loaded");

    // Initialize metrics
    let metrics = Arc::new(ServiceMetrics::new());

    // Initialize components
    let feature_extractor = Arc::new(FeatureExtractor::new(config.model.categories.clone()));
    info!(
        "Feature extractor initialized ({} features)",
        feature_extractor.feature_count()
    );

    let engine = Arc::new(ScoringEngine::new(
        &config.model.model_path,
        feature_extractor.feature_names(),
        config.model.onnx_threads,
    )?);
    info!("Scoring engine initialized");

    // Connect to NATS
    let client = async_nats::connect(&config.nats.url).await?;
    info!("Connected to NATS at {}", config.nats.url);

    // Initialize consumer and producer
    let consumer = RequestConsumer::new(client.clone(), &config.nats.request_subject);
    let producer = Arc::new(DecisionProducer::new(
        client.clone(),
        &config.nats.decision_subject,
    ));

    let num_workers = config.pipeline.workers;
    info!(
        "Starting request processing loop with {} parallel workers",
        num_workers
    );
    info!("Listening on subject: {}", config.nats.request_subject);
    info!("Publishing decisions to: {}", config.nats.decision_subject);

    // Semaphore to limit concurrent processing
    let semaphore = Arc::new(Semaphore::new(num_workers));
    let processed_count = Arc::new(AtomicU64::new(0));

    // Start metrics reporter (prints summary every 30 seconds)
    let metrics_clone = metrics.clone();
    tokio::spawn(async move {
        let reporter = MetricsReporter::new(metrics_clone, 30);
        reporter.start().await;
    });

    // Process requests in parallel
    let mut subscription = consumer.subscribe().await?;

    while let Some(message) = subscription.next().await {
        // Acquire permit (limits concurrent tasks)
        let permit = semaphore.clone().acquire_owned().await?;

        // Clone shared resources for the spawned task
        let feature_extractor = feature_extractor.clone();
        let engine = engine.clone();
        let producer = producer.clone();
        let metrics = metrics.clone();
        let processed_count = processed_count.clone();

        tokio::spawn(async move {
            let start_time = Instant::now();

            match serde_json::from_slice::<ScoringRequest>(&message.payload) {
                Ok(request) => {
                    let client_id = request.client.client_id;
                    let features = feature_extractor.extract(&request.client);

                    match engine.predict_proba(&features) {
                        Ok(probability) => {
                            let mut decision =
                                ScoringDecision::new(client_id, probability, threshold);

                            if request.explain {
                                match engine.explain(&features) {
                                    Ok(explanation) => {
                                        decision = decision.with_explanation(explanation);
                                    }
                                    Err(e) => {
                                        warn!(
                                            client_id = client_id,
                                            error = %e,
                                            "Attribution failed, publishing decision without it"
                                        );
                                    }
                                }
                            }

                            let processing_time = start_time.elapsed();
                            metrics.record_decision(
                                processing_time,
                                probability,
                                decision.decision,
                            );

                            if let Err(e) = producer.publish(&decision).await {
                                error!(
                                    client_id = client_id,
                                    error = %e,
                                    "Failed to publish decision"
                                );
                            } else {
                                debug!(
                                    client_id = client_id,
                                    probability = probability,
                                    decision = ?decision.decision,
                                    processing_time_us = processing_time.as_micros(),
                                    "Decision published"
                                );
                            }

                            let count = processed_count.fetch_add(1, Ordering::Relaxed) + 1;

                            // Log progress every 100 requests
                            if count % 100 == 0 {
                                let throughput = metrics.get_throughput();
                                let processing_stats = metrics.get_processing_stats();
                                info!(
                                    processed = count,
                                    throughput = format!("{:.1} req/s", throughput),
                                    avg_latency_us = processing_stats.mean_us,
                                    "Processing milestone"
                                );
                            }
                        }
                        Err(e) => {
                            error!(
                                client_id = client_id,
                                error = %e,
                                "Inference failed"
                            );
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Failed to deserialize scoring request");
                }
            }

            // Release permit when done
            drop(permit);
        });
    }

    info!("Service shutting down...");
    metrics.print_summary();

    Ok(())
}
