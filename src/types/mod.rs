//! Type definitions for the credit scoring pipeline

pub mod client;
pub mod decision;

pub use client::{ClientProfile, ClientRow, ProductRow, TransactionRow};
pub use decision::{Decision, Explanation, ScoringDecision, ScoringRequest};
