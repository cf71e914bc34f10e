//! Behavioral profiling.
//!
//! Aggregates a submitted batch into per-user summary statistics: login
//! timing, access volume, session length, and top file types / regions /
//! weekdays. Features are computed fresh from each batch; merging across
//! batches happens at the profile store.

pub mod extract;
pub mod types;

pub use extract::{extract_behavior_features, BehaviorError};
pub use types::BehaviorFeatures;
