//! User Pattern Analyzer - Analysis Pipeline Core
//!
//! Ingests tabular event logs for a user, flags statistically anomalous
//! rows with an isolation forest, explains each flag, and maintains a
//! per-user behavioral profile from the same data. The web transport that
//! feeds uploads in and serves results out is an external collaborator;
//! this crate is the pipeline it calls into.
//!
//! ```no_run
//! use std::sync::Arc;
//! use pattern_analyzer_core::{Analyzer, AnalyzerConfig, parse_upload};
//! use pattern_analyzer_core::storage::Database;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Arc::new(Database::open_in_memory()?);
//! let analyzer = Analyzer::new(AnalyzerConfig::default(), db);
//!
//! let table = parse_upload(b"x,y\n1,2\n3,4\n", "clicks.csv")?;
//! let outcome = analyzer.analyze(&table, "user-1", "clicks.csv")?;
//! println!("{} anomalies", outcome.summary.anomalies);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod logic;
pub mod storage;

pub use config::AnalyzerConfig;
pub use error::{InputError, StorageError};
pub use logic::analyzer::{
    AnalysisOutcome, AnalysisSummary, Analyzer, SecondaryOutcome, SecondaryStage,
};
pub use logic::behavior::BehaviorFeatures;
pub use logic::table::parse::parse_upload;
pub use logic::table::{Cell, Table};
