//! Anomaly scoring.
//!
//! - `forest` - isolation forest fitted fresh per batch
//! - `cache` - fingerprint-keyed label cache
//! - `scorer` - cache-aware scoring entry point

pub mod cache;
pub mod forest;
pub mod scorer;

pub use cache::LabelCache;
pub use forest::{ForestConfig, IsolationForest};
pub use scorer::{AnomalyScorer, ScoredBatch};
