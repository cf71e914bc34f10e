//! Logic Module - Analysis Pipeline Stages
//!
//! - `table/` - tabular batch model and CSV/JSON ingest
//! - `validate` - schema validation to a numeric matrix
//! - `fingerprint` - content hashing for the label cache
//! - `model/` - isolation forest, label cache, scorer
//! - `explain/` - per-row anomaly reasons
//! - `behavior/` - per-user behavior aggregation
//! - `analyzer` - pipeline orchestration

pub mod analyzer;
pub mod behavior;
pub mod explain;
pub mod fingerprint;
pub mod model;
pub mod table;
pub mod validate;
