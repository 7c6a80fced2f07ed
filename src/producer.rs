//! NATS message producer for scoring decisions

use crate::types::decision::ScoringDecision;
use anyhow::Result;
use async_nats::Client;
use tracing::{debug, error};

/// Producer for publishing scoring decisions to NATS
#[derive(Clone)]
pub struct DecisionProducer {
    client: Client,
    subject: String,
}

impl DecisionProducer {
    /// Create a new decision producer
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
        }
    }

    /// Publish a scoring decision
    pub async fn publish(&self, decision: &ScoringDecision) -> Result<()> {
        let payload = serde_json::to_vec(decision)?;

        self.client
            .publish(self.subject.clone(), payload.into())
            .await?;

        debug!(
            decision_id = %decision.decision_id,
            client_id = decision.client_id,
            probability = decision.probability,
            decision = ?decision.decision,
            "Published scoring decision"
        );

        Ok(())
    }

    /// Publish multiple decisions in batch
    pub async fn publish_batch(&self, decisions: &[ScoringDecision]) -> Result<()> {
        for decision in decisions {
            if let Err(e) = self.publish(decision).await {
                error!(
                    decision_id = %decision.decision_id,
                    error = %e,
                    "Failed to publish decision"
                );
            }
        }
        Ok(())
    }

    /// Get the subject name
    pub fn subject(&self) -> &str {
        &self.subject
    }
}
