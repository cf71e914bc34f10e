//! Per-row explanations for flagged anomalies.

pub mod engine;
pub mod types;

pub use engine::explain_rows;
pub use types::FeatureDeviation;
