//! Behavior feature extraction.
//!
//! Timestamps are coerced leniently; rows whose timestamp cannot be parsed
//! are dropped. Optional columns (file_name, session_id, duration,
//! ip_region) degrade to defaults instead of failing the batch.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::logic::table::{Cell, Table};

use super::types::BehaviorFeatures;

/// Entries kept per top-frequency aggregate.
const TOP_N: usize = 3;

static FILE_EXT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.(\w+)$").expect("hardcoded pattern"));

/// Text timestamp formats tried in order, after RFC 3339.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug)]
pub enum BehaviorError {
    /// Every row's timestamp failed to parse; no aggregate is meaningful.
    NoValidTimestamps,
}

impl fmt::Display for BehaviorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BehaviorError::NoValidTimestamps => {
                write!(f, "No parseable timestamps in batch")
            }
        }
    }
}

impl std::error::Error for BehaviorError {}

/// Aggregate a batch into per-user behavior features.
pub fn extract_behavior_features(
    table: &Table,
    user_id: &str,
) -> Result<BehaviorFeatures, BehaviorError> {
    let timestamps = table.column_values("timestamp");
    let total_rows = table.row_count();

    // Row indices with a parseable timestamp; everything else is dropped
    let mut valid: Vec<(usize, NaiveDateTime)> = Vec::new();
    for (row, cell) in timestamps.into_iter().enumerate() {
        if let Some(dt) = parse_timestamp(cell) {
            valid.push((row, dt));
        }
    }

    if valid.is_empty() {
        return Err(BehaviorError::NoValidTimestamps);
    }
    if valid.len() < total_rows {
        log::warn!(
            "Dropped {} of {} rows with unparseable timestamps for user {}",
            total_rows - valid.len(),
            total_rows,
            user_id
        );
    }

    let avg_login_hour =
        valid.iter().map(|(_, dt)| dt.hour() as f64).sum::<f64>() / valid.len() as f64;

    // Mean records per calendar date
    let mut per_day: HashMap<NaiveDate, u64> = HashMap::new();
    for (_, dt) in &valid {
        *per_day.entry(dt.date()).or_insert(0) += 1;
    }
    let avg_files_accessed = valid.len() as f64 / per_day.len() as f64;

    // Duration summed per session, then meaned across sessions. Rows
    // without a session id contribute to no session.
    let mut session_durations: HashMap<String, f64> = HashMap::new();
    for (row, _) in &valid {
        let Some(session) = session_key(table.value(*row, "session_id")) else {
            continue;
        };
        let duration = table
            .value(*row, "duration")
            .and_then(|c| c.as_num())
            .unwrap_or(0.0);
        *session_durations.entry(session).or_insert(0.0) += duration;
    }
    let avg_session_duration = if session_durations.is_empty() {
        0.0
    } else {
        session_durations.values().sum::<f64>() / session_durations.len() as f64
    };

    let common_file_types = top_by_frequency(
        valid
            .iter()
            .map(|(row, _)| file_extension(table.value(*row, "file_name"))),
    );

    let frequent_regions = top_by_frequency(
        valid
            .iter()
            .filter_map(|(row, _)| region_key(table.value(*row, "ip_region"))),
    );

    let weekdays_active = top_by_frequency(
        valid
            .iter()
            .map(|(_, dt)| dt.weekday().num_days_from_monday() as u8),
    );

    Ok(BehaviorFeatures {
        user_id: user_id.to_string(),
        avg_login_hour,
        avg_files_accessed,
        avg_session_duration,
        common_file_types,
        frequent_regions,
        weekdays_active,
    })
}

/// Coerce one timestamp cell. Numbers are epoch seconds, or epoch
/// milliseconds when too large for seconds.
fn parse_timestamp(cell: &Cell) -> Option<NaiveDateTime> {
    match cell {
        Cell::Num(n) => {
            if !n.is_finite() {
                return None;
            }
            let n = *n;
            if n.abs() >= 1e11 {
                DateTime::from_timestamp_millis(n as i64).map(|dt| dt.naive_utc())
            } else {
                DateTime::from_timestamp(n as i64, 0).map(|dt| dt.naive_utc())
            }
        }
        Cell::Text(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.naive_utc());
            }
            for format in TIMESTAMP_FORMATS {
                if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
                    return Some(dt);
                }
            }
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        }
        Cell::Null => None,
    }
}

/// Extension of a file name, `"unknown"` when absent or unmatched.
fn file_extension(cell: Option<&Cell>) -> String {
    let name = match cell {
        Some(Cell::Text(s)) => s.as_str(),
        _ => return "unknown".to_string(),
    };
    FILE_EXT_RE
        .captures(name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn session_key(cell: Option<&Cell>) -> Option<String> {
    match cell {
        Some(Cell::Text(s)) => Some(s.clone()),
        Some(Cell::Num(_)) => cell.map(|c| c.to_string()),
        _ => None,
    }
}

fn region_key(cell: Option<&Cell>) -> Option<String> {
    match cell {
        Some(Cell::Text(s)) => Some(s.clone()),
        Some(Cell::Num(_)) => cell.map(|c| c.to_string()),
        _ => None,
    }
}

/// Top entries by descending frequency; ties keep first-encountered order.
fn top_by_frequency<T: Eq + Hash + Clone>(items: impl Iterator<Item = T>) -> Vec<T> {
    let mut counts: HashMap<T, (usize, usize)> = HashMap::new();
    for (idx, item) in items.enumerate() {
        let entry = counts.entry(item).or_insert((0, idx));
        entry.0 += 1;
    }

    let mut ranked: Vec<(T, (usize, usize))> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));
    ranked.into_iter().take(TOP_N).map(|(item, _)| item).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn behavior_table(rows: &[(&str, &str, &str, f64, &str)]) -> Table {
        let mut t = Table::new(vec![
            "timestamp".into(),
            "file_name".into(),
            "session_id".into(),
            "duration".into(),
            "ip_region".into(),
        ]);
        for (ts, file, session, duration, region) in rows {
            t.push_row(vec![
                Cell::Text((*ts).into()),
                Cell::Text((*file).into()),
                Cell::Text((*session).into()),
                Cell::Num(*duration),
                Cell::Text((*region).into()),
            ]);
        }
        t
    }

    #[test]
    fn test_two_day_batch_aggregates() {
        let t = behavior_table(&[
            ("2024-01-01T09:00", "report.pdf", "s1", 30.0, "EU"),
            ("2024-01-02T22:00", "data.csv", "s2", 30.0, "EU"),
        ]);
        let features = extract_behavior_features(&t, "u1").unwrap();

        assert_eq!(features.avg_login_hour, 15.5);
        assert_eq!(features.avg_files_accessed, 1.0);
        assert_eq!(features.avg_session_duration, 30.0);
        // 2024-01-01 is a Monday
        assert!(features.weekdays_active.contains(&0));
        assert!(features.weekdays_active.contains(&1));
        assert_eq!(features.frequent_regions, vec!["EU".to_string()]);
    }

    #[test]
    fn test_session_durations_sum_within_session() {
        let t = behavior_table(&[
            ("2024-01-01T08:00", "a.txt", "s1", 10.0, "EU"),
            ("2024-01-01T09:00", "b.txt", "s1", 20.0, "EU"),
            ("2024-01-01T10:00", "c.txt", "s2", 60.0, "US"),
        ]);
        let features = extract_behavior_features(&t, "u1").unwrap();
        // s1 = 30, s2 = 60
        assert_eq!(features.avg_session_duration, 45.0);
    }

    #[test]
    fn test_unparseable_rows_dropped() {
        let t = behavior_table(&[
            ("2024-01-01T09:00", "a.txt", "s1", 5.0, "EU"),
            ("not-a-date", "b.txt", "s2", 5.0, "US"),
        ]);
        let features = extract_behavior_features(&t, "u1").unwrap();
        assert_eq!(features.avg_login_hour, 9.0);
        assert_eq!(features.frequent_regions, vec!["EU".to_string()]);
    }

    #[test]
    fn test_all_timestamps_invalid_is_an_error() {
        let t = behavior_table(&[("garbage", "a.txt", "s1", 5.0, "EU")]);
        assert!(matches!(
            extract_behavior_features(&t, "u1"),
            Err(BehaviorError::NoValidTimestamps)
        ));
    }

    #[test]
    fn test_missing_region_column_yields_empty_list() {
        let mut t = Table::new(vec!["timestamp".into()]);
        t.push_row(vec![Cell::Text("2024-01-01T09:00".into())]);
        let features = extract_behavior_features(&t, "u1").unwrap();
        assert!(features.frequent_regions.is_empty());
        assert_eq!(features.common_file_types, vec!["unknown".to_string()]);
        assert_eq!(features.avg_session_duration, 0.0);
    }

    #[test]
    fn test_file_extension_default() {
        assert_eq!(file_extension(Some(&Cell::Text("a.CSV".into()))), "CSV");
        assert_eq!(file_extension(Some(&Cell::Text("Makefile".into()))), "unknown");
        assert_eq!(file_extension(Some(&Cell::Null)), "unknown");
        assert_eq!(file_extension(None), "unknown");
    }

    #[test]
    fn test_top_by_frequency_ties_keep_first_seen() {
        let items = ["b", "a", "b", "a", "c", "d"].into_iter();
        assert_eq!(top_by_frequency(items), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_epoch_timestamps() {
        // 2024-01-01T00:00:00Z as seconds and as milliseconds
        assert!(parse_timestamp(&Cell::Num(1_704_067_200.0)).is_some());
        assert!(parse_timestamp(&Cell::Num(1_704_067_200_000.0)).is_some());
        assert!(parse_timestamp(&Cell::Null).is_none());
    }
}
