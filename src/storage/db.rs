//! Database handle - SQLite connection and schema

use std::path::Path;

use parking_lot::{Mutex, MutexGuard};
use rusqlite::Connection;

use crate::error::StorageError;

/// Database schema SQL
const SCHEMA_SQL: &str = r#"
-- Per-analysis run summary (append-only)
CREATE TABLE IF NOT EXISTS analysis_results (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    file_id TEXT NOT NULL UNIQUE,
    file_name TEXT NOT NULL,
    total_records INTEGER NOT NULL,
    anomaly_count INTEGER NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_analysis_results_user
    ON analysis_results(user_id, created_at);

-- Aggregated behavior statistics (one row per user)
CREATE TABLE IF NOT EXISTS user_behavior_profiles (
    user_id TEXT PRIMARY KEY,
    avg_login_hour REAL NOT NULL,
    avg_files_accessed REAL NOT NULL,
    avg_session_duration REAL NOT NULL,
    common_file_types TEXT NOT NULL,
    frequent_regions TEXT NOT NULL,
    weekdays_active TEXT NOT NULL,
    last_updated TEXT NOT NULL
);
"#;

/// Shared SQLite handle. One connection behind a mutex; statements are
/// single-row and short-lived.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (creating directories and schema as needed).
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// In-memory database, for tests and throwaway runs.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(SCHEMA_SQL)?;
        log::info!("Database schema applied");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub(crate) fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock()
    }
}
