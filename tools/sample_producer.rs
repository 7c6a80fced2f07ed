//! Sample Scoring Request Producer
//!
//! Generates and publishes synthetic scoring requests to NATS for
//! end-to-end service testing.

use chrono::Utc;
use credit_scoring_pipeline::types::{ClientProfile, ClientRow, ScoringRequest};
use rand::Rng;
use std::time::Duration;
use tracing::{info, warn};

/// Synthetic client generator for testing
struct ClientGenerator {
    rng: rand::rngs::ThreadRng,
    client_counter: u64,
}

impl ClientGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            client_counter: 0,
        }
    }

    /// Generate a low-risk client profile
    fn generate_solvent(&mut self) -> ClientProfile {
        self.client_counter += 1;
        let row = ClientRow {
            client_id: self.client_counter,
            gender: self.random_choice(&["F", "M"]).to_string(),
            age: self.rng.gen_range(30..60),
            income: self.rng.gen_range(45_000.0..120_000.0),
            target: None,
        };

        let mut profile = ClientProfile::inactive(&row);
        profile.n_transactions = self.rng.gen_range(10..60);
        profile.avg_ticket = self.rng.gen_range(50.0..300.0);
        profile.total_spent = profile.avg_ticket * profile.n_transactions as f64;
        profile.days_since_last = self.rng.gen_range(1..20);
        profile.avg_interest_rate = self.rng.gen_range(0.03..0.08);
        profile.max_tenor = self.rng.gen_range(12..48);
        profile
            .spent_by_category
            .insert("card".to_string(), profile.total_spent * 0.7);
        profile
            .spent_by_category
            .insert("loan".to_string(), profile.total_spent * 0.3);
        profile
    }

    /// Generate a risky client profile
    fn generate_risky(&mut self) -> ClientProfile {
        self.client_counter += 1;
        let row = ClientRow {
            client_id: self.client_counter,
            gender: self.random_choice(&["F", "M"]).to_string(),
            age: self.rng.gen_range(20..30),
            income: self.rng.gen_range(8_000.0..25_000.0), // Low income
            target: None,
        };

        let mut profile = ClientProfile::inactive(&row);
        profile.n_transactions = self.rng.gen_range(1..5); // Thin file
        profile.avg_ticket = self.rng.gen_range(400.0..2_000.0); // Large tickets
        profile.total_spent = profile.avg_ticket * profile.n_transactions as f64;
        profile.days_since_last = self.rng.gen_range(90..400); // Dormant
        profile.avg_interest_rate = self.rng.gen_range(0.15..0.30); // Expensive credit
        profile.max_tenor = self.rng.gen_range(48..120);
        profile
            .spent_by_category
            .insert("loan".to_string(), profile.total_spent);
        profile
    }

    fn random_choice<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sample_producer=info".parse()?),
        )
        .init();

    info!("Starting Sample Scoring Request Producer");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let nats_url = args
        .get(1)
        .map(|s| s.as_str())
        .unwrap_or("nats://localhost:4222");
    let subject = args.get(2).map(|s| s.as_str()).unwrap_or("scoring.requests");
    let count: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(100);
    let risky_rate: f64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(0.2);
    let delay_ms: u64 = args.get(5).and_then(|s| s.parse().ok()).unwrap_or(100);

    info!(
        nats_url = %nats_url,
        subject = %subject,
        count = count,
        risky_rate = risky_rate,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    // Connect to NATS
    let client = match async_nats::connect(nats_url).await {
        Ok(c) => {
            info!("Connected to NATS");
            c
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to NATS. Running in dry-run mode.");
            return run_dry_mode(count, risky_rate, delay_ms).await;
        }
    };

    let mut generator = ClientGenerator::new();
    let mut rng = rand::thread_rng();

    info!("Starting to publish {} scoring requests...", count);

    let mut solvent_count = 0;
    let mut risky_count = 0;

    for i in 0..count {
        let profile = if rng.gen_bool(risky_rate) {
            risky_count += 1;
            generator.generate_risky()
        } else {
            solvent_count += 1;
            generator.generate_solvent()
        };

        let request = ScoringRequest {
            client: profile,
            // Ask for attribution on a small sample of requests.
            explain: rng.gen_bool(0.05),
        };

        let payload = serde_json::to_vec(&request)?;
        client.publish(subject.to_string(), payload.into()).await?;

        if (i + 1) % 10 == 0 {
            info!(
                "Published {}/{} requests ({} solvent, {} risky) at {}",
                i + 1,
                count,
                solvent_count,
                risky_count,
                Utc::now().format("%H:%M:%S")
            );
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    info!(
        "Completed! Published {} requests ({} solvent, {} risky)",
        count, solvent_count, risky_count
    );

    Ok(())
}

async fn run_dry_mode(count: u64, risky_rate: f64, delay_ms: u64) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no NATS connection)");

    let mut generator = ClientGenerator::new();
    let mut rng = rand::thread_rng();

    for i in 0..count {
        let profile = if rng.gen_bool(risky_rate) {
            generator.generate_risky()
        } else {
            generator.generate_solvent()
        };

        let request = ScoringRequest {
            client: profile,
            explain: false,
        };
        let json = serde_json::to_string_pretty(&request)?;

        if (i + 1) % 10 == 0 || i == 0 {
            info!("Sample request {}:\n{}", i + 1, json);
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    Ok(())
}
