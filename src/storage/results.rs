//! Analysis-result history.
//!
//! Append-only store: one row per pipeline invocation, never updated or
//! deleted by the pipeline. History reads are scoped per user with
//! optional inclusive date-range and filename-substring filters.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params_from_iter, types::Type};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

use super::db::Database;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: String,
    pub user_id: String,
    /// Handle for retrieving the flagged-row CSV of this run
    pub file_id: String,
    pub file_name: String,
    pub total_records: u64,
    pub anomaly_count: u64,
    pub created_at: DateTime<Utc>,
}

/// Optional history filters. Dates are inclusive on both ends.
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    /// Case-insensitive substring match on the uploaded file name
    pub file_name: Option<String>,
}

impl AnalysisRecord {
    /// Append one summary row.
    pub fn append(db: &Database, record: &AnalysisRecord) -> Result<(), StorageError> {
        db.conn().execute(
            "INSERT INTO analysis_results
                 (id, user_id, file_id, file_name, total_records, anomaly_count, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                record.id,
                record.user_id,
                record.file_id,
                record.file_name,
                record.total_records as i64,
                record.anomaly_count as i64,
                record.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// All runs for a user, newest first.
    pub fn history(
        db: &Database,
        user_id: &str,
        filter: &HistoryFilter,
    ) -> Result<Vec<AnalysisRecord>, StorageError> {
        let mut sql = String::from(
            "SELECT id, user_id, file_id, file_name, total_records, anomaly_count, created_at
             FROM analysis_results WHERE user_id = ?1",
        );
        let mut values: Vec<String> = vec![user_id.to_string()];

        if let Some(name) = &filter.file_name {
            values.push(format!("%{}%", name));
            sql.push_str(&format!(" AND file_name LIKE ?{}", values.len()));
        }
        if let Some(start) = filter.start {
            values.push(day_bound(start));
            sql.push_str(&format!(" AND created_at >= ?{}", values.len()));
        }
        if let Some(end) = filter.end {
            // Inclusive end: everything before the next day's midnight
            values.push(day_bound(end + chrono::Duration::days(1)));
            sql.push_str(&format!(" AND created_at < ?{}", values.len()));
        }
        sql.push_str(" ORDER BY created_at DESC");

        let conn = db.conn();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), |row| {
            let created_at: String = row.get(6)?;
            Ok(AnalysisRecord {
                id: row.get(0)?,
                user_id: row.get(1)?,
                file_id: row.get(2)?,
                file_name: row.get(3)?,
                total_records: row.get::<_, i64>(4)? as u64,
                anomaly_count: row.get::<_, i64>(5)? as u64,
                created_at: DateTime::parse_from_rfc3339(&created_at)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e))
                    })?,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }
}

/// RFC 3339 UTC midnight of a date, for lexicographic range bounds.
fn day_bound(date: NaiveDate) -> String {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().to_rfc3339())
        .unwrap_or_default()
}
