//! Reason generation.
//!
//! Ranks per-feature deviation with median/MAD computed over the batch
//! being analyzed right now, not whichever batch originally produced the
//! cached labels. A cache hit implies the matrices are identical, so the
//! recomputation stays consistent with the labels.

use crate::logic::validate::NumericMatrix;

use super::types::FeatureDeviation;

/// Guards the MAD denominator against constant features.
const MAD_EPSILON: f64 = 1e-9;

/// Features named per reason string.
const TOP_FEATURES: usize = 3;

/// One explanation per row: empty for label 0, a ranked top-3 feature list
/// for label 1.
pub fn explain_rows(matrix: &NumericMatrix, labels: &[u8]) -> Vec<String> {
    let medians = column_medians(matrix);
    let mads = column_mads(matrix, &medians);

    labels
        .iter()
        .enumerate()
        .map(|(row, label)| {
            if *label == 0 {
                return String::new();
            }
            let ranked = rank_row(matrix, row, &medians, &mads);
            let names: Vec<&str> = ranked
                .iter()
                .take(TOP_FEATURES)
                .map(|d| d.name.as_str())
                .collect();
            format!("High deviation in {}", names.join(", "))
        })
        .collect()
}

/// Deviations for one row, sorted by descending magnitude. Ties keep
/// column order.
pub fn rank_row(
    matrix: &NumericMatrix,
    row: usize,
    medians: &[f64],
    mads: &[f64],
) -> Vec<FeatureDeviation> {
    let mut deviations: Vec<FeatureDeviation> = matrix
        .columns()
        .iter()
        .enumerate()
        .map(|(col, name)| {
            let value = matrix.values()[[row, col]];
            let deviation = (value - medians[col]).abs() / (mads[col] + MAD_EPSILON);
            FeatureDeviation {
                name: name.clone(),
                value,
                median: medians[col],
                mad: mads[col],
                deviation,
            }
        })
        .collect();

    deviations.sort_by(|a, b| {
        b.deviation
            .partial_cmp(&a.deviation)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    deviations
}

pub fn column_medians(matrix: &NumericMatrix) -> Vec<f64> {
    (0..matrix.feature_count())
        .map(|col| median(matrix.values().column(col).iter().copied()))
        .collect()
}

pub fn column_mads(matrix: &NumericMatrix, medians: &[f64]) -> Vec<f64> {
    (0..matrix.feature_count())
        .map(|col| {
            median(
                matrix
                    .values()
                    .column(col)
                    .iter()
                    .map(|v| (v - medians[col]).abs()),
            )
        })
        .collect()
}

fn median(values: impl Iterator<Item = f64>) -> f64 {
    let mut sorted: Vec<f64> = values.collect();
    if sorted.is_empty() {
        return 0.0;
    }
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
