use serde::{Deserialize, Serialize};

/// One feature's robust deviation for a flagged row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureDeviation {
    pub name: String,
    pub value: f64,
    pub median: f64,
    pub mad: f64,
    /// |value - median| / (mad + epsilon)
    pub deviation: f64,
}
