//! Batch fingerprinting.
//!
//! A fingerprint is a SHA-256 digest over a validated matrix's shape,
//! column names, and every cell in row order. It keys the label cache:
//! identical values in identical order hash identically, any cell or
//! ordering change produces a different digest. Collisions are accepted as
//! identical-input reuse.

use std::fmt;

use sha2::{Digest, Sha256};

use super::validate::NumericMatrix;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Digest a validated matrix.
pub fn fingerprint_matrix(matrix: &NumericMatrix) -> Fingerprint {
    let mut hasher = Sha256::new();

    hasher.update((matrix.row_count() as u64).to_le_bytes());
    hasher.update((matrix.feature_count() as u64).to_le_bytes());

    for name in matrix.columns() {
        hasher.update(name.as_bytes());
        hasher.update([0u8]); // separator
    }

    for row in matrix.values().rows() {
        for value in row {
            hasher.update(value.to_le_bytes());
        }
    }

    let digest = hasher.finalize();
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&digest);
    Fingerprint(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::table::{Cell, Table};
    use crate::logic::validate::validate_schema;

    fn matrix_of(rows: &[(f64, f64)]) -> NumericMatrix {
        let mut t = Table::new(vec!["x".into(), "y".into()]);
        for (x, y) in rows {
            t.push_row(vec![Cell::Num(*x), Cell::Num(*y)]);
        }
        validate_schema(&t).unwrap()
    }

    #[test]
    fn test_fingerprint_deterministic() {
        let m = matrix_of(&[(1.0, 2.0), (3.0, 4.0)]);
        assert_eq!(fingerprint_matrix(&m), fingerprint_matrix(&m));
    }

    #[test]
    fn test_row_order_changes_fingerprint() {
        let a = matrix_of(&[(1.0, 2.0), (3.0, 4.0)]);
        let b = matrix_of(&[(3.0, 4.0), (1.0, 2.0)]);
        assert_ne!(fingerprint_matrix(&a), fingerprint_matrix(&b));
    }

    #[test]
    fn test_single_cell_change_changes_fingerprint() {
        let a = matrix_of(&[(1.0, 2.0), (3.0, 4.0)]);
        let b = matrix_of(&[(1.0, 2.0), (3.0, 4.0001)]);
        assert_ne!(fingerprint_matrix(&a), fingerprint_matrix(&b));
    }

    #[test]
    fn test_column_name_participates() {
        let mut t1 = Table::new(vec!["x".into()]);
        t1.push_row(vec![Cell::Num(1.0)]);
        let mut t2 = Table::new(vec!["y".into()]);
        t2.push_row(vec![Cell::Num(1.0)]);
        let m1 = validate_schema(&t1).unwrap();
        let m2 = validate_schema(&t2).unwrap();
        assert_ne!(fingerprint_matrix(&m1), fingerprint_matrix(&m2));
    }

    #[test]
    fn test_hex_display() {
        let m = matrix_of(&[(1.0, 2.0)]);
        let hex = fingerprint_matrix(&m).to_hex();
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
