//! In-memory tabular input.
//!
//! Reconciliation inputs are spreadsheets exported from ERP reports, so
//! column names are arbitrary text and may legitimately repeat (the
//! balancete layout carries two `Código`/`Descrição` pairs). A [`Table`]
//! keeps the columns ordered and possibly duplicated, with every cell a
//! loosely-typed [`serde_json::Value`].

use serde_json::{Map, Value};

#[derive(Debug, Clone, Default)]
pub struct Table {
    columns: Vec<String>,
    normalized: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let normalized = columns
            .iter()
            .map(|c| crate::columns::normalize_column_name(c))
            .collect();
        Table {
            columns,
            normalized,
            rows,
        }
    }

    /// Builds a table from rows-of-dicts. The column order is the order of
    /// first appearance across all records; duplicated spreadsheet columns
    /// cannot survive this representation, so callers with such layouts
    /// should use [`Table::new`] directly.
    pub fn from_records(records: &[Map<String, Value>]) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for record in records {
            for key in record.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }
        let rows = records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|c| record.get(c).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect();
        Table::new(columns, rows)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Column names after normalization (lowercase, accents stripped,
    /// non-alphanumeric runs collapsed to `_`).
    pub fn normalized_columns(&self) -> &[String] {
        &self.normalized
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell at `(row, column)`; `Value::Null` when the row is ragged.
    pub fn cell<'a>(&'a self, row: &'a [Value], column: usize) -> &'a Value {
        row.get(column).unwrap_or(&Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_records_preserves_first_appearance_order() {
        let records = vec![
            serde_json::from_value::<Map<String, Value>>(json!({"b": 1, "a": 2})).unwrap(),
            serde_json::from_value::<Map<String, Value>>(json!({"a": 3, "c": 4})).unwrap(),
        ];
        let table = Table::from_records(&records);
        assert!(table.columns().contains(&"a".to_string()));
        assert!(table.columns().contains(&"c".to_string()));
        assert_eq!(table.len(), 2);
        let idx_c = table.columns().iter().position(|c| c == "c").unwrap();
        assert_eq!(table.rows()[0][idx_c], Value::Null);
        assert_eq!(table.rows()[1][idx_c], json!(4));
    }

    #[test]
    fn test_duplicate_columns_survive() {
        let table = Table::new(
            vec!["Código".into(), "Descrição".into(), "Código".into()],
            vec![vec![json!("1.1.2"), json!("Clientes"), json!("017043-81")]],
        );
        assert_eq!(table.normalized_columns(), &["codigo", "descricao", "codigo"]);
    }
}
