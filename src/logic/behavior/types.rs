use serde::{Deserialize, Serialize};

/// Per-user behavior aggregates for one batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorFeatures {
    pub user_id: String,

    /// Mean hour-of-day of the batch timestamps (0-23)
    pub avg_login_hour: f64,

    /// Mean records per calendar date
    pub avg_files_accessed: f64,

    /// Mean of per-session summed durations
    pub avg_session_duration: f64,

    /// Up to 3 file extensions by descending frequency
    pub common_file_types: Vec<String>,

    /// Up to 3 access regions by descending frequency
    pub frequent_regions: Vec<String>,

    /// Up to 3 weekdays by descending frequency, Monday = 0
    pub weekdays_active: Vec<u8>,
}
