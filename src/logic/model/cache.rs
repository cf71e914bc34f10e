//! Label cache.
//!
//! Fingerprint -> per-row label sequence, owned by the scorer instance and
//! injected through it rather than living in module-level state. Entries
//! survive for the process lifetime; nothing is ever evicted or
//! invalidated, so the map grows with the number of distinct batches seen.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::logic::fingerprint::Fingerprint;

pub struct LabelCache {
    entries: Mutex<HashMap<Fingerprint, Arc<Vec<u8>>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

impl LabelCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn get(&self, fingerprint: &Fingerprint) -> Option<Arc<Vec<u8>>> {
        let found = self.entries.lock().get(fingerprint).cloned();
        match &found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        found
    }

    /// Insert labels for a fingerprint. If another request raced us here,
    /// its entry wins and is returned; both were computed from identical
    /// input, so the results are equivalent.
    pub fn put(&self, fingerprint: Fingerprint, labels: Vec<u8>) -> Arc<Vec<u8>> {
        let mut entries = self.entries.lock();
        entries
            .entry(fingerprint)
            .or_insert_with(|| Arc::new(labels))
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl Default for LabelCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::fingerprint::fingerprint_matrix;
    use crate::logic::table::{Cell, Table};
    use crate::logic::validate::validate_schema;

    fn some_fingerprint(seed: f64) -> Fingerprint {
        let mut t = Table::new(vec!["x".into()]);
        t.push_row(vec![Cell::Num(seed)]);
        fingerprint_matrix(&validate_schema(&t).unwrap())
    }

    #[test]
    fn test_get_put_roundtrip() {
        let cache = LabelCache::new();
        let fp = some_fingerprint(1.0);
        assert!(cache.get(&fp).is_none());

        cache.put(fp, vec![0, 1, 0]);
        assert_eq!(cache.get(&fp).unwrap().as_ref(), &vec![0, 1, 0]);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_first_put_wins() {
        let cache = LabelCache::new();
        let fp = some_fingerprint(2.0);
        cache.put(fp, vec![1]);
        let kept = cache.put(fp, vec![0]);
        assert_eq!(kept.as_ref(), &vec![1]);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_stats_track_hits_and_misses() {
        let cache = LabelCache::new();
        let fp = some_fingerprint(3.0);
        cache.get(&fp);
        cache.put(fp, vec![0]);
        cache.get(&fp);

        let stats = cache.stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }
}
