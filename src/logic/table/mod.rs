//! Tabular batch model.
//!
//! A `Table` is an ordered sequence of rows over named columns; cells are
//! numeric, text, or null. The column set is not fixed: uploads bring
//! whatever columns they have, and downstream stages pick what they
//! understand.

pub mod parse;

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One cell of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Num(f64),
    Text(String),
}

impl Cell {
    pub fn as_num(&self) -> Option<f64> {
        match self {
            Cell::Num(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    fn to_json(&self) -> Value {
        match self {
            Cell::Null => Value::Null,
            Cell::Num(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Cell::Text(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Num(n) => {
                if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Cell::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Ordered tabular batch. Row order and column order are preserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row, padding or truncating to the column count.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), Cell::Null);
        self.rows.push(row);
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Cell by row index and column name.
    pub fn value(&self, row: usize, column: &str) -> Option<&Cell> {
        let col = self.column_index(column)?;
        self.cell(row, col)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.rows.iter().map(|r| r.as_slice())
    }

    /// All cells of a named column, in row order. Empty if the column is absent.
    pub fn column_values(&self, name: &str) -> Vec<&Cell> {
        match self.column_index(name) {
            Some(idx) => self.rows.iter().map(|r| &r[idx]).collect(),
            None => Vec::new(),
        }
    }

    /// Names of columns whose cells are all numeric or null (at least one
    /// numeric). A single text cell disqualifies the column.
    pub fn numeric_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(idx, _)| {
                let mut saw_num = false;
                for row in &self.rows {
                    match &row[*idx] {
                        Cell::Num(_) => saw_num = true,
                        Cell::Null => {}
                        Cell::Text(_) => return false,
                    }
                }
                saw_num
            })
            .map(|(_, name)| name.clone())
            .collect()
    }

    /// Append a column. Value count must equal the row count.
    pub fn push_column(&mut self, name: &str, values: Vec<Cell>) {
        debug_assert_eq!(values.len(), self.rows.len());
        self.columns.push(name.to_string());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
    }

    /// Replace null cells of a column with the given value.
    pub fn fill_column_nulls(&mut self, name: &str, value: Cell) {
        if let Some(idx) = self.column_index(name) {
            for row in &mut self.rows {
                if row[idx].is_null() {
                    row[idx] = value.clone();
                }
            }
        }
    }

    /// New table holding only the rows whose mask entry is true.
    pub fn select_rows(&self, mask: &[bool]) -> Table {
        let rows = self
            .rows
            .iter()
            .zip(mask)
            .filter(|(_, keep)| **keep)
            .map(|(row, _)| row.clone())
            .collect();
        Table {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Rows as JSON objects, for the web layer.
    pub fn to_records(&self) -> Vec<Value> {
        self.rows
            .iter()
            .map(|row| {
                let mut obj = Map::new();
                for (name, cell) in self.columns.iter().zip(row) {
                    obj.insert(name.clone(), cell.to_json());
                }
                Value::Object(obj)
            })
            .collect()
    }

    /// Serialize to CSV with a header row.
    pub fn to_csv_string(&self) -> String {
        let mut out = String::new();
        let header: Vec<String> = self.columns.iter().map(|c| csv_escape(c)).collect();
        out.push_str(&header.join(","));
        out.push('\n');
        for row in &self.rows {
            let fields: Vec<String> = row.iter().map(|c| csv_escape(&c.to_string())).collect();
            out.push_str(&fields.join(","));
            out.push('\n');
        }
        out
    }
}

fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> Table {
        let mut t = Table::new(vec!["x".into(), "y".into(), "name".into()]);
        t.push_row(vec![Cell::Num(1.0), Cell::Num(2.0), Cell::Text("a.csv".into())]);
        t.push_row(vec![Cell::Num(3.0), Cell::Null, Cell::Text("b.pdf".into())]);
        t
    }

    #[test]
    fn test_numeric_columns() {
        let t = sample_table();
        assert_eq!(t.numeric_columns(), vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn test_all_null_column_not_numeric() {
        let mut t = Table::new(vec!["a".into()]);
        t.push_row(vec![Cell::Null]);
        assert!(t.numeric_columns().is_empty());
    }

    #[test]
    fn test_push_column_and_select_rows() {
        let mut t = sample_table();
        t.push_column("anomaly", vec![Cell::Num(0.0), Cell::Num(1.0)]);
        let flagged = t.select_rows(&[false, true]);
        assert_eq!(flagged.row_count(), 1);
        assert_eq!(flagged.value(0, "name"), Some(&Cell::Text("b.pdf".into())));
    }

    #[test]
    fn test_to_csv_quotes_special_fields() {
        let mut t = Table::new(vec!["note".into()]);
        t.push_row(vec![Cell::Text("hello, \"world\"".into())]);
        let csv = t.to_csv_string();
        assert_eq!(csv, "note\n\"hello, \"\"world\"\"\"\n");
    }

    #[test]
    fn test_to_records() {
        let t = sample_table();
        let records = t.to_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["x"], 1.0);
        assert!(records[1]["y"].is_null());
    }
}
