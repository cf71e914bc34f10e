//! SQLite persistence.
//!
//! Two tables: `analysis_results` (append-only, one row per pipeline run)
//! and `user_behavior_profiles` (one row per user, overwritten in place).
//! The host persistence layer is assumed transactional at the single-row
//! level; both stores issue single statements.

pub mod db;
pub mod profile;
pub mod results;

pub use db::Database;
pub use profile::StoredProfile;
pub use results::{AnalysisRecord, HistoryFilter};
