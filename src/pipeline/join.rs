//! Joins the raw client/transaction/product extracts into per-client
//! profiles ready for feature extraction.

use anyhow::{Context, Result};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

use crate::types::client::{ClientProfile, ClientRow, ProductRow, TransactionRow};

/// The three raw extracts, loaded into memory.
pub struct RawSources {
    pub clients: Vec<ClientRow>,
    pub transactions: Vec<TransactionRow>,
    pub products: Vec<ProductRow>,
}

/// Load the raw extracts from JSON array files in `dir`
/// (`clients.json`, `transactions.json`, `products.json`).
pub fn load_sources<P: AsRef<Path>>(dir: P) -> Result<RawSources> {
    let dir = dir.as_ref();

    let clients: Vec<ClientRow> = read_json(&dir.join("clients.json"))?;
    let transactions: Vec<TransactionRow> = read_json(&dir.join("transactions.json"))?;
    let products: Vec<ProductRow> = read_json(&dir.join("products.json"))?;

    info!(
        clients = clients.len(),
        transactions = transactions.len(),
        products = products.len(),
        "Loaded raw extracts"
    );

    Ok(RawSources {
        clients,
        transactions,
        products,
    })
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse {}", path.display()))
}

#[derive(Default)]
struct TxSummary {
    count: u64,
    total: f64,
    min_days_since: Option<i64>,
}

#[derive(Default)]
struct ProductMix {
    spent_by_category: BTreeMap<String, f64>,
    interest_sum: f64,
    interest_count: u64,
    max_tenor: i64,
}

/// Join the three extracts into one profile per client.
///
/// Clients with no transactions keep zeroed aggregates and
/// `days_since_last = 999`. Transactions referencing unknown products
/// still count toward the spend aggregates but not the product mix.
pub fn assemble_dataset(sources: &RawSources) -> Vec<ClientProfile> {
    let products: HashMap<u64, &ProductRow> = sources
        .products
        .iter()
        .map(|p| (p.product_id, p))
        .collect();

    let mut summaries: HashMap<u64, TxSummary> = HashMap::new();
    let mut mixes: HashMap<u64, ProductMix> = HashMap::new();

    for tx in &sources.transactions {
        let summary = summaries.entry(tx.client_id).or_default();
        summary.count += 1;
        summary.total += tx.amount;
        summary.min_days_since = Some(match summary.min_days_since {
            Some(d) => d.min(tx.days_since),
            None => tx.days_since,
        });

        if let Some(product) = products.get(&tx.product_id) {
            let mix = mixes.entry(tx.client_id).or_default();
            *mix.spent_by_category
                .entry(product.category.clone())
                .or_insert(0.0) += tx.amount;
            mix.interest_sum += product.interest_rate;
            mix.interest_count += 1;
            mix.max_tenor = mix.max_tenor.max(product.tenor_months);
        }
    }

    let dataset: Vec<ClientProfile> = sources
        .clients
        .iter()
        .map(|client| {
            let mut profile = ClientProfile::inactive(client);

            if let Some(summary) = summaries.get(&client.client_id) {
                profile.n_transactions = summary.count;
                profile.total_spent = summary.total;
                profile.avg_ticket = summary.total / summary.count as f64;
                profile.days_since_last = summary.min_days_since.unwrap_or(999);
            }

            if let Some(mix) = mixes.get(&client.client_id) {
                profile.spent_by_category = mix.spent_by_category.clone();
                if mix.interest_count > 0 {
                    profile.avg_interest_rate = mix.interest_sum / mix.interest_count as f64;
                }
                profile.max_tenor = mix.max_tenor;
            }

            profile
        })
        .collect();

    info!(profiles = dataset.len(), "Assembled joined dataset");

    dataset
}

/// Distinct product categories present in the extracts, for building the
/// feature extractor vocabulary.
pub fn category_vocabulary(products: &[ProductRow]) -> Vec<String> {
    let mut categories: Vec<String> = products.iter().map(|p| p.category.clone()).collect();
    categories.sort();
    categories.dedup();
    categories
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sources() -> RawSources {
        RawSources {
            clients: vec![
                ClientRow {
                    client_id: 1,
                    gender: "F".to_string(),
                    age: 30,
                    income: 40_000.0,
                    target: Some(0),
                },
                ClientRow {
                    client_id: 2,
                    gender: "M".to_string(),
                    age: 55,
                    income: 25_000.0,
                    target: Some(1),
                },
            ],
            transactions: vec![
                TransactionRow {
                    transaction_id: 10,
                    client_id: 1,
                    product_id: 100,
                    amount: 200.0,
                    days_since: 5,
                },
                TransactionRow {
                    transaction_id: 11,
                    client_id: 1,
                    product_id: 101,
                    amount: 400.0,
                    days_since: 30,
                },
            ],
            products: vec![
                ProductRow {
                    product_id: 100,
                    category: "card".to_string(),
                    interest_rate: 0.18,
                    tenor_months: 12,
                },
                ProductRow {
                    product_id: 101,
                    category: "loan".to_string(),
                    interest_rate: 0.06,
                    tenor_months: 48,
                },
            ],
        }
    }

    #[test]
    fn test_transaction_aggregates() {
        let dataset = assemble_dataset(&sources());
        let active = dataset.iter().find(|p| p.client_id == 1).unwrap();

        assert_eq!(active.n_transactions, 2);
        assert_eq!(active.total_spent, 600.0);
        assert_eq!(active.avg_ticket, 300.0);
        assert_eq!(active.days_since_last, 5);
        assert_eq!(active.spent_by_category.get("card"), Some(&200.0));
        assert_eq!(active.spent_by_category.get("loan"), Some(&400.0));
        assert!((active.avg_interest_rate - 0.12).abs() < 1e-12);
        assert_eq!(active.max_tenor, 48);
    }

    #[test]
    fn test_client_without_transactions_gets_defaults() {
        let dataset = assemble_dataset(&sources());
        let inactive = dataset.iter().find(|p| p.client_id == 2).unwrap();

        assert_eq!(inactive.n_transactions, 0);
        assert_eq!(inactive.days_since_last, 999);
        assert!(inactive.spent_by_category.is_empty());
    }

    #[test]
    fn test_no_missing_targets_in_labeled_extract() {
        let dataset = assemble_dataset(&sources());
        assert!(dataset.iter().all(|p| p.target.is_some()));
    }

    #[test]
    fn test_category_vocabulary() {
        let vocab = category_vocabulary(&sources().products);
        assert_eq!(vocab, vec!["card".to_string(), "loan".to_string()]);
    }
}
