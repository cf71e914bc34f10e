//! Analyzer configuration.
//!
//! Contamination is a global default rather than a per-request knob; the web
//! layer does not currently expose it to callers.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::logic::model::forest::ForestConfig;

/// Application data directory name
const APP_DIR: &str = "pattern-analyzer";

/// Database file name
const DB_FILE: &str = "analyzer.db";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Expected anomaly fraction, hint for the outlier model (0.0 - 1.0)
    pub contamination: f64,

    /// Isolation score cut for anomaly candidates (0.0 - 1.0)
    pub score_threshold: f64,

    /// Isolation forest parameters
    pub forest: ForestConfig,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            contamination: 0.05,
            score_threshold: 0.6,
            forest: ForestConfig::default(),
        }
    }
}

impl AnalyzerConfig {
    pub fn with_contamination(contamination: f64) -> Self {
        Self {
            contamination,
            ..Default::default()
        }
    }
}

/// Get the application data directory
pub fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Default path of the SQLite database
pub fn default_db_path() -> PathBuf {
    data_dir().join(DB_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.contamination, 0.05);
        assert_eq!(config.score_threshold, 0.6);
    }

    #[test]
    fn test_default_db_path_under_data_dir() {
        let path = default_db_path();
        assert!(path.ends_with("pattern-analyzer/analyzer.db"));
    }
}
