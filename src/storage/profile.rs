//! Behavior profile store.
//!
//! One row per user, overwritten wholesale on every successful extraction.
//! The write is a single atomic upsert statement, so concurrent writers
//! cannot interleave a read-modify-write; last write wins with no merge.
//! Reads are open to external collaborators, writes go through here.

use chrono::{DateTime, Utc};
use rusqlite::{params, types::Type, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::logic::behavior::BehaviorFeatures;

use super::db::Database;

/// Persisted per-user profile row. List-valued aggregates are stored
/// comma-separated, e.g. "pdf,csv,docx".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredProfile {
    pub user_id: String,
    pub avg_login_hour: f64,
    pub avg_files_accessed: f64,
    pub avg_session_duration: f64,
    pub common_file_types: String,
    pub frequent_regions: String,
    pub weekdays_active: String,
    pub last_updated: DateTime<Utc>,
}

impl StoredProfile {
    /// Create or overwrite the profile row for a user.
    pub fn upsert(db: &Database, features: &BehaviorFeatures) -> Result<(), StorageError> {
        let weekdays: Vec<String> = features
            .weekdays_active
            .iter()
            .map(|d| d.to_string())
            .collect();

        db.conn().execute(
            "INSERT INTO user_behavior_profiles
                 (user_id, avg_login_hour, avg_files_accessed, avg_session_duration,
                  common_file_types, frequent_regions, weekdays_active, last_updated)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(user_id) DO UPDATE SET
                 avg_login_hour = excluded.avg_login_hour,
                 avg_files_accessed = excluded.avg_files_accessed,
                 avg_session_duration = excluded.avg_session_duration,
                 common_file_types = excluded.common_file_types,
                 frequent_regions = excluded.frequent_regions,
                 weekdays_active = excluded.weekdays_active,
                 last_updated = excluded.last_updated",
            params![
                features.user_id,
                features.avg_login_hour,
                features.avg_files_accessed,
                features.avg_session_duration,
                features.common_file_types.join(","),
                features.frequent_regions.join(","),
                weekdays.join(","),
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Current profile for a user, if one has been extracted yet.
    pub fn find_by_user(db: &Database, user_id: &str) -> Result<Option<Self>, StorageError> {
        let found = db
            .conn()
            .query_row(
                "SELECT user_id, avg_login_hour, avg_files_accessed, avg_session_duration,
                        common_file_types, frequent_regions, weekdays_active, last_updated
                 FROM user_behavior_profiles WHERE user_id = ?1",
                params![user_id],
                |row| {
                    let last_updated: String = row.get(7)?;
                    Ok(StoredProfile {
                        user_id: row.get(0)?,
                        avg_login_hour: row.get(1)?,
                        avg_files_accessed: row.get(2)?,
                        avg_session_duration: row.get(3)?,
                        common_file_types: row.get(4)?,
                        frequent_regions: row.get(5)?,
                        weekdays_active: row.get(6)?,
                        last_updated: DateTime::parse_from_rfc3339(&last_updated)
                            .map(|dt| dt.with_timezone(&Utc))
                            .map_err(|e| {
                                rusqlite::Error::FromSqlConversionFailure(
                                    7,
                                    Type::Text,
                                    Box::new(e),
                                )
                            })?,
                    })
                },
            )
            .optional()?;
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(user: &str, login_hour: f64) -> BehaviorFeatures {
        BehaviorFeatures {
            user_id: user.to_string(),
            avg_login_hour: login_hour,
            avg_files_accessed: 4.0,
            avg_session_duration: 25.0,
            common_file_types: vec!["pdf".into(), "csv".into()],
            frequent_regions: vec!["EU".into()],
            weekdays_active: vec![0, 2, 4],
        }
    }

    #[test]
    fn test_upsert_creates_row() {
        let db = Database::open_in_memory().unwrap();
        StoredProfile::upsert(&db, &features("u1", 9.0)).unwrap();

        let profile = StoredProfile::find_by_user(&db, "u1").unwrap().unwrap();
        assert_eq!(profile.avg_login_hour, 9.0);
        assert_eq!(profile.common_file_types, "pdf,csv");
        assert_eq!(profile.weekdays_active, "0,2,4");
    }

    #[test]
    fn test_upsert_overwrites_in_place() {
        let db = Database::open_in_memory().unwrap();
        StoredProfile::upsert(&db, &features("u1", 9.0)).unwrap();
        StoredProfile::upsert(&db, &features("u1", 21.0)).unwrap();

        let profile = StoredProfile::find_by_user(&db, "u1").unwrap().unwrap();
        assert_eq!(profile.avg_login_hour, 21.0);

        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM user_behavior_profiles", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_find_missing_profile() {
        let db = Database::open_in_memory().unwrap();
        assert!(StoredProfile::find_by_user(&db, "nobody").unwrap().is_none());
    }
}
