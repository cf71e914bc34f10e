//! Schema validation.
//!
//! Reduces a raw batch to the numeric-only, finite-valued matrix the scorer
//! operates on. Missing cells in numeric columns become 0.0; a surviving
//! infinity rejects the batch.

use ndarray::Array2;

use crate::error::InputError;

use super::table::{Cell, Table};

/// Numeric view of a validated batch. Row order matches the source table.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericMatrix {
    columns: Vec<String>,
    values: Array2<f64>,
}

impl NumericMatrix {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn row_count(&self) -> usize {
        self.values.nrows()
    }

    pub fn feature_count(&self) -> usize {
        self.values.ncols()
    }
}

/// Feature-engineering fill: replace missing cells in numeric columns with
/// the column mean, keeping every original column. The scoring path uses
/// the stricter zero-fill of `validate_schema` instead; this variant is for
/// display and export, where a column-mean placeholder reads better than 0.
pub fn fill_missing_with_means(table: &Table) -> Table {
    let mut filled = table.clone();
    for name in table.numeric_columns() {
        let present: Vec<f64> = table
            .column_values(&name)
            .into_iter()
            .filter_map(|c| c.as_num())
            .collect();
        if present.is_empty() {
            continue;
        }
        let mean = present.iter().sum::<f64>() / present.len() as f64;
        filled.fill_column_nulls(&name, Cell::Num(mean));
    }
    filled
}

/// Validate a batch for scoring.
///
/// Keeps numeric columns only, fills nulls with 0.0, and enforces
/// finiteness. Terminal for the current request on failure.
pub fn validate_schema(table: &Table) -> Result<NumericMatrix, InputError> {
    if table.is_empty() {
        return Err(InputError::EmptyInput);
    }

    let columns = table.numeric_columns();
    if columns.is_empty() {
        return Err(InputError::NoNumericColumns);
    }

    let nrows = table.row_count();
    let ncols = columns.len();
    let mut values = Array2::<f64>::zeros((nrows, ncols));

    for (col_idx, name) in columns.iter().enumerate() {
        for (row_idx, cell) in table.column_values(name).into_iter().enumerate() {
            let v = match cell {
                Cell::Num(n) => *n,
                _ => 0.0,
            };
            if !v.is_finite() {
                return Err(InputError::NonFiniteValue {
                    column: name.clone(),
                    row: row_idx,
                });
            }
            values[[row_idx, col_idx]] = v;
        }
    }

    Ok(NumericMatrix { columns, values })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(rows: &[(f64, &str)]) -> Table {
        let mut t = Table::new(vec!["x".into(), "label".into()]);
        for (x, label) in rows {
            t.push_row(vec![Cell::Num(*x), Cell::Text((*label).into())]);
        }
        t
    }

    #[test]
    fn test_empty_batch_rejected() {
        let t = Table::new(vec!["x".into()]);
        assert!(matches!(validate_schema(&t), Err(InputError::EmptyInput)));
    }

    #[test]
    fn test_text_only_batch_rejected() {
        let mut t = Table::new(vec!["name".into()]);
        t.push_row(vec![Cell::Text("a".into())]);
        assert!(matches!(
            validate_schema(&t),
            Err(InputError::NoNumericColumns)
        ));
    }

    #[test]
    fn test_text_columns_dropped() {
        let t = batch(&[(1.0, "a"), (2.0, "b")]);
        let matrix = validate_schema(&t).unwrap();
        assert_eq!(matrix.columns(), &["x".to_string()]);
        assert_eq!(matrix.row_count(), 2);
    }

    #[test]
    fn test_nulls_filled_with_zero() {
        let mut t = Table::new(vec!["x".into()]);
        t.push_row(vec![Cell::Num(5.0)]);
        t.push_row(vec![Cell::Null]);
        let matrix = validate_schema(&t).unwrap();
        assert_eq!(matrix.values()[[1, 0]], 0.0);
    }

    #[test]
    fn test_fill_missing_with_means() {
        let mut t = Table::new(vec!["x".into(), "name".into()]);
        t.push_row(vec![Cell::Num(2.0), Cell::Text("a".into())]);
        t.push_row(vec![Cell::Null, Cell::Text("b".into())]);
        t.push_row(vec![Cell::Num(4.0), Cell::Null]);

        let filled = fill_missing_with_means(&t);
        assert_eq!(filled.value(1, "x"), Some(&Cell::Num(3.0)));
        // Text columns are untouched
        assert_eq!(filled.value(2, "name"), Some(&Cell::Null));
    }

    #[test]
    fn test_infinity_rejected() {
        let mut t = Table::new(vec!["x".into()]);
        t.push_row(vec![Cell::Num(f64::INFINITY)]);
        match validate_schema(&t) {
            Err(InputError::NonFiniteValue { column, row }) => {
                assert_eq!(column, "x");
                assert_eq!(row, 0);
            }
            other => panic!("expected NonFiniteValue, got {:?}", other),
        }
    }
}
