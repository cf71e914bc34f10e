//! Pipeline orchestration.
//!
//! One `Analyzer` per service instance: it owns the scorer (and with it
//! the label cache), the flagged-row store, and the database handle. The
//! primary path (validate, score, explain) either returns a full result or
//! an `InputError`; the secondary path (summary row, behavior profile)
//! runs afterwards and can only ever degrade to a logged, typed failure.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AnalyzerConfig;
use crate::error::InputError;
use crate::storage::{AnalysisRecord, Database, HistoryFilter, StoredProfile};

use super::behavior::extract_behavior_features;
use super::explain::explain_rows;
use super::model::cache::CacheStats;
use super::model::scorer::AnomalyScorer;
use super::table::{Cell, Table};
use super::validate::validate_schema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub total: usize,
    pub anomalies: usize,
    pub normal: usize,
}

/// What happened on the secondary path. Failures here never affect the
/// primary anomaly result; they surface for callers and tests that want
/// to observe them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SecondaryOutcome {
    Completed,
    Failed {
        stage: SecondaryStage,
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecondaryStage {
    SummaryAppend,
    BehaviorExtraction,
    ProfileUpsert,
}

/// Full result of one pipeline run.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub summary: AnalysisSummary,
    /// Per-row labels, 0 = normal, 1 = anomalous
    pub labels: Vec<u8>,
    /// Per-row reasons, empty string for normal rows
    pub reasons: Vec<String>,
    /// Input rows with `anomaly` and `anomaly_reason` columns attached
    pub table: Table,
    /// Handle for retrieving the flagged rows as CSV later
    pub file_id: String,
    pub cache_hit: bool,
    pub secondary: SecondaryOutcome,
}

pub struct Analyzer {
    config: AnalyzerConfig,
    scorer: AnomalyScorer,
    db: Arc<Database>,
    /// file_id -> flagged rows of that run, kept for CSV retrieval
    flagged: RwLock<HashMap<String, Table>>,
}

impl Analyzer {
    pub fn new(config: AnalyzerConfig, db: Arc<Database>) -> Self {
        let scorer = AnomalyScorer::new(config.forest.clone(), config.score_threshold);
        Self {
            config,
            scorer,
            db,
            flagged: RwLock::new(HashMap::new()),
        }
    }

    /// Run the full pipeline on one uploaded batch.
    pub fn analyze(
        &self,
        table: &Table,
        user_id: &str,
        file_name: &str,
    ) -> Result<AnalysisOutcome, InputError> {
        let matrix = validate_schema(table)?;
        let scored = self.scorer.score(&matrix, self.config.contamination);
        let reasons = explain_rows(&matrix, &scored.labels);

        for (row, (label, reason)) in scored.labels.iter().zip(&reasons).enumerate() {
            if *label == 1 {
                if let Some(cells) = table.rows().nth(row) {
                    log::info!("Anomaly at row {} | {} | {:?}", row, reason, cells);
                }
            }
        }

        let mut out = table.clone();
        out.push_column(
            "anomaly",
            scored.labels.iter().map(|l| Cell::Num(*l as f64)).collect(),
        );
        out.push_column(
            "anomaly_reason",
            reasons.iter().map(|r| Cell::Text(r.clone())).collect(),
        );

        let anomalies = scored.labels.iter().filter(|l| **l == 1).count();
        let summary = AnalysisSummary {
            total: scored.labels.len(),
            anomalies,
            normal: scored.labels.len() - anomalies,
        };

        let file_id = Uuid::new_v4().to_string();
        let mask: Vec<bool> = scored.labels.iter().map(|l| *l == 1).collect();
        self.flagged
            .write()
            .insert(file_id.clone(), out.select_rows(&mask));

        let secondary = self.run_secondary(&out, user_id, file_name, &file_id, &summary);

        log::info!(
            "Analyzed '{}' for user {}: {} rows, {} anomalies (cache {})",
            file_name,
            user_id,
            summary.total,
            summary.anomalies,
            if scored.cache_hit { "hit" } else { "miss" }
        );

        Ok(AnalysisOutcome {
            summary,
            labels: scored.labels.as_ref().clone(),
            reasons,
            table: out,
            file_id,
            cache_hit: scored.cache_hit,
            secondary,
        })
    }

    /// Summary row plus behavior profile. Failures are logged and reported
    /// through the outcome, never propagated.
    fn run_secondary(
        &self,
        table: &Table,
        user_id: &str,
        file_name: &str,
        file_id: &str,
        summary: &AnalysisSummary,
    ) -> SecondaryOutcome {
        let mut failure: Option<(SecondaryStage, String)> = None;

        let record = AnalysisRecord {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            file_id: file_id.to_string(),
            file_name: file_name.to_string(),
            total_records: summary.total as u64,
            anomaly_count: summary.anomalies as u64,
            created_at: Utc::now(),
        };
        if let Err(e) = AnalysisRecord::append(&self.db, &record) {
            log::error!("Analysis summary append failed: {}", e);
            failure = Some((SecondaryStage::SummaryAppend, e.to_string()));
        }

        match extract_behavior_features(table, user_id) {
            Ok(features) => {
                if let Err(e) = StoredProfile::upsert(&self.db, &features) {
                    log::error!("Behavior profile update failed: {}", e);
                    failure.get_or_insert((SecondaryStage::ProfileUpsert, e.to_string()));
                }
            }
            Err(e) => {
                log::error!("Behavior extraction failed for user {}: {}", user_id, e);
                failure.get_or_insert((SecondaryStage::BehaviorExtraction, e.to_string()));
            }
        }

        match failure {
            None => SecondaryOutcome::Completed,
            Some((stage, message)) => SecondaryOutcome::Failed { stage, message },
        }
    }

    /// Flagged rows of a past run, if the handle is still alive.
    pub fn flagged_rows(&self, file_id: &str) -> Option<Table> {
        self.flagged.read().get(file_id).cloned()
    }

    /// Flagged rows of a past run serialized as CSV.
    pub fn flagged_csv(&self, file_id: &str) -> Option<String> {
        self.flagged.read().get(file_id).map(|t| t.to_csv_string())
    }

    pub fn history(
        &self,
        user_id: &str,
        filter: &HistoryFilter,
    ) -> Result<Vec<AnalysisRecord>, crate::error::StorageError> {
        AnalysisRecord::history(&self.db, user_id, filter)
    }

    pub fn profile(
        &self,
        user_id: &str,
    ) -> Result<Option<StoredProfile>, crate::error::StorageError> {
        StoredProfile::find_by_user(&self.db, user_id)
    }

    /// Forest fits so far; at most one per distinct batch fingerprint.
    pub fn fit_count(&self) -> u64 {
        self.scorer.fit_count()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.scorer.cache_stats()
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }
}
