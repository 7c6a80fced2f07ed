//! Raw source rows and the joined per-client profile

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One row from the clients extract
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientRow {
    pub client_id: u64,

    /// Gender code ("F", "M", or other)
    pub gender: String,

    /// Age in years
    pub age: i32,

    /// Declared yearly income
    pub income: f64,

    /// Ground-truth default flag (1 = defaulted); absent for unlabeled
    /// production records
    #[serde(default)]
    pub target: Option<u8>,
}

/// One row from the transactions extract
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRow {
    pub transaction_id: u64,
    pub client_id: u64,
    pub product_id: u64,

    /// Transaction amount
    pub amount: f64,

    /// Days elapsed since the transaction
    pub days_since: i64,
}

/// One row from the products extract
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRow {
    pub product_id: u64,

    /// Product category label (e.g. "loan", "card")
    pub category: String,

    /// Yearly interest rate
    pub interest_rate: f64,

    /// Contract length in months
    pub tenor_months: i64,
}

/// Fully joined per-client record: client attributes plus transaction
/// aggregates and product mix. This is the unit the feature extractor
/// consumes, both at calibration time and inside scoring requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientProfile {
    pub client_id: u64,
    pub gender: String,
    pub age: i32,
    pub income: f64,

    /// Number of transactions on record
    pub n_transactions: u64,

    /// Sum of transaction amounts
    pub total_spent: f64,

    /// Mean transaction amount
    pub avg_ticket: f64,

    /// Days since the most recent transaction (999 when none)
    pub days_since_last: i64,

    /// Spend per product category; BTreeMap keeps category order stable
    /// across serialization
    #[serde(default)]
    pub spent_by_category: BTreeMap<String, f64>,

    /// Mean interest rate across the client's products
    pub avg_interest_rate: f64,

    /// Longest contract tenor in months
    pub max_tenor: i64,

    /// Ground-truth default flag, when known
    #[serde(default)]
    pub target: Option<u8>,
}

impl ClientProfile {
    /// Profile for a client with no transaction history.
    pub fn inactive(client: &ClientRow) -> Self {
        Self {
            client_id: client.client_id,
            gender: client.gender.clone(),
            age: client.age,
            income: client.income,
            n_transactions: 0,
            total_spent: 0.0,
            avg_ticket: 0.0,
            days_since_last: 999,
            spent_by_category: BTreeMap::new(),
            avg_interest_rate: 0.0,
            max_tenor: 0,
            target: client.target,
        }
    }

    /// Ground-truth label as a bool, when present.
    pub fn label(&self) -> Option<bool> {
        self.target.map(|t| t != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_serialization_round_trip() {
        let mut spent = BTreeMap::new();
        spent.insert("card".to_string(), 120.0);
        spent.insert("loan".to_string(), 4000.0);

        let profile = ClientProfile {
            client_id: 42,
            gender: "F".to_string(),
            age: 37,
            income: 54_000.0,
            n_transactions: 12,
            total_spent: 4120.0,
            avg_ticket: 343.3,
            days_since_last: 4,
            spent_by_category: spent,
            avg_interest_rate: 0.07,
            max_tenor: 48,
            target: Some(0),
        };

        let json = serde_json::to_string(&profile).unwrap();
        let back: ClientProfile = serde_json::from_str(&json).unwrap();

        assert_eq!(back.client_id, profile.client_id);
        assert_eq!(back.n_transactions, profile.n_transactions);
        assert_eq!(back.spent_by_category, profile.spent_by_category);
        assert_eq!(back.label(), Some(false));
    }

    #[test]
    fn test_inactive_profile_defaults() {
        let client = ClientRow {
            client_id: 7,
            gender: "M".to_string(),
            age: 51,
            income: 31_000.0,
            target: None,
        };

        let profile = ClientProfile::inactive(&client);
        assert_eq!(profile.n_transactions, 0);
        assert_eq!(profile.days_since_last, 999);
        assert_eq!(profile.label(), None);
    }
}
