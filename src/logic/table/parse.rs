//! CSV / JSON upload parsing.
//!
//! The web layer hands over raw upload bytes; this turns them into a
//! `Table`. Numeric-looking CSV fields become numeric cells so the schema
//! validator sees proper column types.

use serde_json::Value;

use crate::error::InputError;

use super::{Cell, Table};

/// Parse by file name: `.json` goes through the JSON reader, everything
/// else is treated as CSV.
pub fn parse_upload(bytes: &[u8], file_name: &str) -> Result<Table, InputError> {
    if file_name.to_ascii_lowercase().ends_with(".json") {
        from_json_bytes(bytes)
    } else {
        from_csv_bytes(bytes)
    }
}

/// CSV with a header row. Quoted fields may contain commas, newlines, and
/// doubled quotes.
pub fn from_csv_bytes(bytes: &[u8]) -> Result<Table, InputError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| InputError::Parse(format!("invalid UTF-8: {}", e)))?;

    let mut records = split_records(text);
    if records.is_empty() {
        return Err(InputError::Parse("missing CSV header row".to_string()));
    }

    let header = records.remove(0);
    let columns: Vec<String> = header.into_iter().map(|f| f.trim().to_string()).collect();
    if columns.is_empty() || columns.iter().all(|c| c.is_empty()) {
        return Err(InputError::Parse("missing CSV header row".to_string()));
    }

    let mut table = Table::new(columns);
    for record in records {
        if record.len() == 1 && record[0].trim().is_empty() {
            continue; // trailing blank line
        }
        let row = record.iter().map(|field| coerce_cell(field)).collect();
        table.push_row(row);
    }
    Ok(table)
}

/// JSON array of objects. Columns are collected in first-seen order across
/// all rows; objects missing a column get null cells.
pub fn from_json_bytes(bytes: &[u8]) -> Result<Table, InputError> {
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| InputError::Parse(e.to_string()))?;

    let rows = match value {
        Value::Array(rows) => rows,
        _ => return Err(InputError::Parse("expected a JSON array of objects".to_string())),
    };

    let mut columns: Vec<String> = Vec::new();
    for row in &rows {
        let obj = row
            .as_object()
            .ok_or_else(|| InputError::Parse("expected a JSON array of objects".to_string()))?;
        for key in obj.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }

    let mut table = Table::new(columns);
    for row in &rows {
        if let Some(obj) = row.as_object() {
            let cells = table
                .columns()
                .iter()
                .map(|name| obj.get(name).map(json_cell).unwrap_or(Cell::Null))
                .collect();
            table.push_row(cells);
        }
    }
    Ok(table)
}

fn json_cell(value: &Value) -> Cell {
    match value {
        Value::Null => Cell::Null,
        Value::Number(n) => n.as_f64().map(Cell::Num).unwrap_or(Cell::Null),
        Value::String(s) => Cell::Text(s.clone()),
        Value::Bool(b) => Cell::Text(b.to_string()),
        other => Cell::Text(other.to_string()),
    }
}

/// Empty fields are null, numeric fields (including NaN, which is treated
/// as missing) are numbers, everything else is text.
fn coerce_cell(field: &str) -> Cell {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return Cell::Null;
    }
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_nan() => Cell::Null,
        Ok(n) => Cell::Num(n),
        Err(_) => Cell::Text(trimmed.to_string()),
    }
}

/// Split CSV text into records of fields, honoring quoting.
fn split_records(text: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                _ => field.push(c),
            }
        } else {
            match c {
                '"' => in_quotes = true,
                ',' => {
                    record.push(std::mem::take(&mut field));
                }
                '\r' => {} // normalized away; \r\n handled by the \n arm
                '\n' => {
                    record.push(std::mem::take(&mut field));
                    records.push(std::mem::take(&mut record));
                }
                _ => field.push(c),
            }
        }
    }

    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_numeric_coercion() {
        let table = from_csv_bytes(b"x,y,name\n1,2.5,alpha\n3,,beta\n").unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.value(0, "x"), Some(&Cell::Num(1.0)));
        assert_eq!(table.value(0, "y"), Some(&Cell::Num(2.5)));
        assert_eq!(table.value(1, "y"), Some(&Cell::Null));
        assert_eq!(table.value(1, "name"), Some(&Cell::Text("beta".into())));
    }

    #[test]
    fn test_csv_quoted_fields() {
        let table = from_csv_bytes(b"a,b\n\"1,5\",\"say \"\"hi\"\"\"\n").unwrap();
        assert_eq!(table.value(0, "a"), Some(&Cell::Text("1,5".into())));
        assert_eq!(table.value(0, "b"), Some(&Cell::Text("say \"hi\"".into())));
    }

    #[test]
    fn test_csv_crlf_and_trailing_newline() {
        let table = from_csv_bytes(b"x\r\n1\r\n2\r\n").unwrap();
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn test_csv_empty_input_rejected() {
        assert!(from_csv_bytes(b"").is_err());
    }

    #[test]
    fn test_json_rows_and_column_union() {
        let table =
            from_json_bytes(br#"[{"x": 1, "y": 2}, {"x": 3, "z": "extra"}]"#).unwrap();
        assert_eq!(table.row_count(), 2);
        assert!(table.has_column("z"));
        assert_eq!(table.value(0, "z"), Some(&Cell::Null));
        assert_eq!(table.value(1, "x"), Some(&Cell::Num(3.0)));
    }

    #[test]
    fn test_json_non_array_rejected() {
        assert!(from_json_bytes(br#"{"x": 1}"#).is_err());
    }

    #[test]
    fn test_parse_upload_dispatch() {
        assert!(parse_upload(br#"[{"x": 1}]"#, "logs.JSON").is_ok());
        assert!(parse_upload(b"x\n1\n", "logs.csv").is_ok());
    }
}
