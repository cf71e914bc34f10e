//! Cache-aware anomaly scoring.
//!
//! The scorer owns the label cache: one fit per distinct fingerprint for
//! the process lifetime. A cache hit returns the stored labels unchanged
//! even if the contamination hint differs from the original call. The
//! cache is an at-most-once-compute optimization keyed on content only;
//! contamination is a fixed global default rather than a per-request
//! parameter.

use std::cmp::Ordering;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

use crate::logic::fingerprint::{fingerprint_matrix, Fingerprint};
use crate::logic::validate::NumericMatrix;

use super::cache::{CacheStats, LabelCache};
use super::forest::{ForestConfig, IsolationForest};

/// Labels for one scored batch, 0 = normal, 1 = anomalous.
pub struct ScoredBatch {
    pub fingerprint: Fingerprint,
    pub labels: Arc<Vec<u8>>,
    pub cache_hit: bool,
}

pub struct AnomalyScorer {
    forest_config: ForestConfig,
    score_threshold: f64,
    cache: LabelCache,
    fits: AtomicU64,
}

impl AnomalyScorer {
    pub fn new(forest_config: ForestConfig, score_threshold: f64) -> Self {
        Self {
            forest_config,
            score_threshold,
            cache: LabelCache::new(),
            fits: AtomicU64::new(0),
        }
    }

    /// Score a validated batch, fitting a fresh forest on cache miss.
    pub fn score(&self, matrix: &NumericMatrix, contamination: f64) -> ScoredBatch {
        let fingerprint = fingerprint_matrix(matrix);

        if let Some(labels) = self.cache.get(&fingerprint) {
            log::debug!("Label cache hit for {}", fingerprint);
            return ScoredBatch {
                fingerprint,
                labels,
                cache_hit: true,
            };
        }

        log::debug!(
            "Label cache miss for {}, fitting forest on {} rows x {} features",
            fingerprint,
            matrix.row_count(),
            matrix.feature_count()
        );
        let forest = IsolationForest::fit(matrix.values(), &self.forest_config);
        self.fits.fetch_add(1, AtomicOrdering::Relaxed);

        let scores = forest.score_all(matrix.values());
        let labels = label_scores(&scores, contamination, self.score_threshold);
        let labels = self.cache.put(fingerprint, labels);

        ScoredBatch {
            fingerprint,
            labels,
            cache_hit: false,
        }
    }

    /// Number of forest fits so far. At most one per distinct fingerprint.
    pub fn fit_count(&self) -> u64 {
        self.fits.load(AtomicOrdering::Relaxed)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

/// Convert scores to labels. Contamination bounds how many rows may be
/// flagged (top `ceil(contamination * n)` scores are candidates); only
/// candidates above the isolation midpoint threshold are actually labeled
/// 1, so a clean batch yields no anomalies regardless of the hint.
pub fn label_scores(scores: &[f64], contamination: f64, threshold: f64) -> Vec<u8> {
    let n = scores.len();
    let k = ((contamination * n as f64).ceil() as usize).min(n);

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(Ordering::Equal)
    });

    let mut labels = vec![0u8; n];
    for &idx in order.iter().take(k) {
        if scores[idx] > threshold {
            labels[idx] = 1;
        }
    }
    labels
}
