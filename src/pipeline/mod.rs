//! Offline data pipeline: source joining and dataset splitting

pub mod join;
pub mod split;

pub use join::{assemble_dataset, category_vocabulary, load_sources, RawSources};
pub use split::{split_dataset, DatasetSplits};
