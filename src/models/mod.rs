//! ONNX model loading and scoring

pub mod inference;
pub mod loader;

pub use inference::ScoringEngine;
pub use loader::{LoadedModel, ModelLoader};
