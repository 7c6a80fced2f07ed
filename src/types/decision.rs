//! Scoring request and decision payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::client::ClientProfile;

/// Binary credit decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// Default probability below threshold, credit granted
    Approve,
    /// Default probability at or above threshold, credit denied
    Deny,
}

impl Decision {
    /// Apply the decision rule: deny iff `probability >= threshold`.
    ///
    /// This is the same `>=` binarization used when the threshold was
    /// calibrated; the two must never diverge or reported validation
    /// metrics stop describing production behavior.
    pub fn from_probability(probability: f64, threshold: f64) -> Self {
        if probability >= threshold {
            Decision::Deny
        } else {
            Decision::Approve
        }
    }

    /// Positive-class flag (1 = predicted default).
    pub fn as_flag(&self) -> u8 {
        match self {
            Decision::Approve => 0,
            Decision::Deny => 1,
        }
    }
}

/// Incoming scoring request: a joined client profile to evaluate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringRequest {
    pub client: ClientProfile,

    /// Ask for per-feature attribution alongside the decision
    #[serde(default)]
    pub explain: bool,
}

/// Per-feature attribution for one scored client.
///
/// Single explicit shape regardless of how the underlying attribution is
/// produced; `values` is aligned with `feature_names`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explanation {
    pub values: Vec<f64>,
    pub base_value: f64,
    pub feature_names: Vec<String>,
}

/// Outgoing decision for one scoring request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringDecision {
    /// Unique decision identifier
    pub decision_id: String,

    pub client_id: u64,

    /// Model default probability in [0, 1]
    pub probability: f64,

    /// Decision threshold in force for the deployed model version
    pub threshold: f64,

    pub decision: Decision,

    /// Attribution, present when the request asked for it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<Explanation>,

    pub timestamp: DateTime<Utc>,
}

impl ScoringDecision {
    pub fn new(client_id: u64, probability: f64, threshold: f64) -> Self {
        Self {
            decision_id: uuid::Uuid::new_v4().to_string(),
            client_id,
            probability,
            threshold,
            decision: Decision::from_probability(probability, threshold),
            explanation: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_explanation(mut self, explanation: Explanation) -> Self {
        self.explanation = Some(explanation);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_rule_is_inclusive_at_threshold() {
        assert_eq!(Decision::from_probability(0.6, 0.6), Decision::Deny);
        assert_eq!(Decision::from_probability(0.59999, 0.6), Decision::Approve);
        assert_eq!(Decision::Deny.as_flag(), 1);
        assert_eq!(Decision::Approve.as_flag(), 0);
    }

    #[test]
    fn test_decision_serialization() {
        let decision = ScoringDecision::new(9, 0.72, 0.6);
        assert_eq!(decision.decision, Decision::Deny);

        let json = serde_json::to_string(&decision).unwrap();
        // No explanation requested, so the field is omitted entirely.
        assert!(!json.contains("explanation"));

        let back: ScoringDecision = serde_json::from_str(&json).unwrap();
        assert_eq!(back.client_id, 9);
        assert_eq!(back.decision, Decision::Deny);
        assert_eq!(back.threshold, 0.6);
    }
}
