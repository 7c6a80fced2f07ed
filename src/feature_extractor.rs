//! Feature extraction for credit default scoring.
//!
//! Turns a joined [`ClientProfile`] into the fixed-order numeric vector the
//! ONNX model expects. The same extractor instance is used when calibrating
//! the decision threshold and when serving, so feature order can never
//! drift between the two.

use crate::types::client::ClientProfile;

/// Base numeric features before the per-category spend columns.
const BASE_FEATURES: [&str; 8] = [
    "age",
    "income",
    "n_transactions",
    "total_spent",
    "avg_ticket",
    "days_since_last",
    "avg_interest_rate",
    "max_tenor",
];

/// Feature extractor over a fixed product-category vocabulary.
///
/// Categories are sorted at construction; a profile's spend in a category
/// outside the vocabulary is ignored, and missing categories contribute 0.
pub struct FeatureExtractor {
    categories: Vec<String>,
}

impl FeatureExtractor {
    /// Create an extractor for the given category vocabulary.
    pub fn new(mut categories: Vec<String>) -> Self {
        categories.sort();
        categories.dedup();
        Self { categories }
    }

    /// Extract the model input vector from a client profile.
    ///
    /// Order: base numerics, spend per known category, gender code.
    pub fn extract(&self, client: &ClientProfile) -> Vec<f32> {
        let mut features = Vec::with_capacity(self.feature_count());

        features.push(client.age as f32);
        features.push(client.income as f32);
        features.push(client.n_transactions as f32);
        features.push(client.total_spent as f32);
        features.push(client.avg_ticket as f32);
        features.push(client.days_since_last as f32);
        features.push(client.avg_interest_rate as f32);
        features.push(client.max_tenor as f32);

        for category in &self.categories {
            let spent = client
                .spent_by_category
                .get(category)
                .copied()
                .unwrap_or(0.0);
            features.push(spent as f32);
        }

        features.push(gender_code(&client.gender));

        features
    }

    /// Number of features produced.
    pub fn feature_count(&self) -> usize {
        BASE_FEATURES.len() + self.categories.len() + 1
    }

    /// Feature names in extraction order.
    pub fn feature_names(&self) -> Vec<String> {
        let mut names: Vec<String> = BASE_FEATURES.iter().map(|s| s.to_string()).collect();
        names.extend(self.categories.iter().map(|c| format!("spent_{c}")));
        names.push("gender_code".to_string());
        names
    }

    /// Extract a whole dataset into a row-major matrix.
    pub fn extract_matrix(&self, clients: &[ClientProfile]) -> Vec<Vec<f32>> {
        clients.iter().map(|c| self.extract(c)).collect()
    }
}

fn gender_code(gender: &str) -> f32 {
    match gender {
        "F" | "f" => 0.0,
        "M" | "m" => 1.0,
        _ => 2.0,
    }
}
