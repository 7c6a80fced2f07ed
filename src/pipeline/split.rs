//! Deterministic stratified train/valid/test split.

use anyhow::{bail, Result};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::info;

use crate::types::client::ClientProfile;

/// Fixed seed so every calibration run sees the same split.
pub const SPLIT_SEED: u64 = 42;

const VALID_FRACTION: f64 = 0.15;
const TEST_FRACTION: f64 = 0.15;

/// The three labeled partitions of the joined dataset.
pub struct DatasetSplits {
    pub train: Vec<ClientProfile>,
    pub valid: Vec<ClientProfile>,
    pub test: Vec<ClientProfile>,
}

/// Split labeled profiles 70/15/15, stratified by the default flag.
///
/// Each class is shuffled with a seeded RNG and partitioned separately,
/// so class balance is preserved across partitions and repeated runs
/// produce identical splits. Unlabeled profiles are rejected.
pub fn split_dataset(dataset: &[ClientProfile], seed: u64) -> Result<DatasetSplits> {
    if dataset.is_empty() {
        bail!("Cannot split an empty dataset");
    }
    if dataset.iter().any(|p| p.target.is_none()) {
        bail!("Dataset contains unlabeled profiles; splits need ground truth");
    }

    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);

    let mut splits = DatasetSplits {
        train: Vec::new(),
        valid: Vec::new(),
        test: Vec::new(),
    };

    for class in [false, true] {
        let mut members: Vec<ClientProfile> = dataset
            .iter()
            .filter(|p| p.label() == Some(class))
            .cloned()
            .collect();
        members.shuffle(&mut rng);

        let n = members.len();
        let n_test = (n as f64 * TEST_FRACTION).round() as usize;
        let n_valid = (n as f64 * VALID_FRACTION).round() as usize;

        splits.test.extend(members.drain(..n_test));
        splits.valid.extend(members.drain(..n_valid));
        splits.train.extend(members);
    }

    info!(
        train = splits.train.len(),
        valid = splits.valid.len(),
        test = splits.test.len(),
        "Split dataset"
    );

    Ok(splits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::client::ClientRow;

    fn labeled_dataset(n: usize) -> Vec<ClientProfile> {
        (0..n)
            .map(|i| {
                let client = ClientRow {
                    client_id: i as u64,
                    gender: "F".to_string(),
                    age: 30 + (i % 40) as i32,
                    income: 20_000.0 + i as f64,
                    // Roughly 1-in-4 defaulters.
                    target: Some(u8::from(i % 4 == 0)),
                };
                ClientProfile::inactive(&client)
            })
            .collect()
    }

    #[test]
    fn test_split_is_deterministic() {
        let dataset = labeled_dataset(100);

        let a = split_dataset(&dataset, SPLIT_SEED).unwrap();
        let b = split_dataset(&dataset, SPLIT_SEED).unwrap();

        let ids = |part: &[ClientProfile]| -> Vec<u64> {
            part.iter().map(|p| p.client_id).collect()
        };
        assert_eq!(ids(&a.train), ids(&b.train));
        assert_eq!(ids(&a.valid), ids(&b.valid));
        assert_eq!(ids(&a.test), ids(&b.test));
    }

    #[test]
    fn test_split_partitions_everything_once() {
        let dataset = labeled_dataset(100);
        let splits = split_dataset(&dataset, SPLIT_SEED).unwrap();

        let total = splits.train.len() + splits.valid.len() + splits.test.len();
        assert_eq!(total, dataset.len());

        let mut ids: Vec<u64> = splits
            .train
            .iter()
            .chain(&splits.valid)
            .chain(&splits.test)
            .map(|p| p.client_id)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), dataset.len());
    }

    #[test]
    fn test_split_preserves_class_balance() {
        let dataset = labeled_dataset(200);
        let splits = split_dataset(&dataset, SPLIT_SEED).unwrap();

        let positives = |part: &[ClientProfile]| {
            part.iter().filter(|p| p.label() == Some(true)).count() as f64 / part.len() as f64
        };

        // 25% positives overall; each partition should stay close.
        assert!((positives(&splits.train) - 0.25).abs() < 0.05);
        assert!((positives(&splits.valid) - 0.25).abs() < 0.05);
        assert!((positives(&splits.test) - 0.25).abs() < 0.05);
    }

    #[test]
    fn test_unlabeled_dataset_rejected() {
        let client = ClientRow {
            client_id: 1,
            gender: "F".to_string(),
            age: 30,
            income: 1000.0,
            target: None,
        };
        let dataset = vec![ClientProfile::inactive(&client)];
        assert!(split_dataset(&dataset, SPLIT_SEED).is_err());
    }
}
