pub mod html;
pub mod load;
pub mod numeric;
pub mod select;

use serde_json::{json, Value};

pub use numeric::NumericColumn;
pub use select::{select_by_density, select_by_keywords};

/// A table as parsed from a document: ordered column names (not guaranteed
/// unique or clean) and ordered rows of raw text cells. Rows are padded to
/// the column count at construction time.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(columns: Vec<String>, mut rows: Vec<Vec<String>>) -> Self {
        let width = columns.len();
        for row in &mut rows {
            row.resize(width, String::new());
        }
        Self { columns, rows }
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Raw text cells of one column, in row order.
    pub fn column_cells(&self, index: usize) -> Vec<&str> {
        self.rows.iter().map(|r| r[index].as_str()).collect()
    }
}

/// Canonicalize a column name: lowercase, runs of non-alphanumeric characters
/// collapsed to a single underscore, no leading/trailing underscore.
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_sep = false;
    for ch in name.chars() {
        if ch.is_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            for lower in ch.to_lowercase() {
                out.push(lower);
            }
        } else {
            pending_sep = true;
        }
    }
    out
}

/// A [`RawTable`] with canonical column names and per-column numeric
/// classification. Derived once per request, never retained beyond it.
#[derive(Debug, Clone)]
pub struct NormalizedTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Parallel to `columns`: whether the column classified as numeric.
    pub numeric: Vec<bool>,
}

impl NormalizedTable {
    pub fn from_raw(raw: &RawTable, classify_sample_rows: usize) -> Self {
        let columns: Vec<String> = raw.columns.iter().map(|c| normalize_name(c)).collect();
        let numeric = (0..raw.column_count())
            .map(|i| numeric::classify_column(&raw.column_cells(i), classify_sample_rows))
            .collect();
        Self { columns, rows: raw.rows.clone(), numeric }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Names of the columns classified as numeric, in table order.
    pub fn numeric_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .zip(&self.numeric)
            .filter(|(_, &n)| n)
            .map(|(c, _)| c.as_str())
            .collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Coerce one column to numbers, `None` per uncoercible cell.
    pub fn numeric_column(&self, index: usize) -> NumericColumn {
        self.rows.iter().map(|r| numeric::coerce(&r[index])).collect()
    }

    /// First `n` rows as JSON records keyed by column name, the shape the
    /// prompt embeds. Payload limits are the caller's reason for `n`.
    pub fn head_records(&self, n: usize) -> Value {
        let records: Vec<Value> = self
            .rows
            .iter()
            .take(n)
            .map(|row| {
                let mut obj = serde_json::Map::new();
                for (col, cell) in self.columns.iter().zip(row) {
                    obj.insert(col.clone(), json!(cell));
                }
                Value::Object(obj)
            })
            .collect();
        Value::Array(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_and_trims() {
        assert_eq!(normalize_name("Worldwide gross"), "worldwide_gross");
        assert_eq!(normalize_name("  Rank  "), "rank");
        assert_eq!(normalize_name("Peak (2024)"), "peak_2024");
        assert_eq!(normalize_name("Ref."), "ref");
        assert_eq!(normalize_name("%$#"), "");
    }

    #[test]
    fn ragged_rows_are_padded() {
        let t = RawTable::new(
            vec!["a".into(), "b".into(), "c".into()],
            vec![vec!["1".into()], vec!["2".into(), "3".into(), "4".into()]],
        );
        assert_eq!(t.rows[0].len(), 3);
        assert_eq!(t.column_cells(2), vec!["", "4"]);
    }

    #[test]
    fn normalized_table_classifies_columns() {
        let raw = RawTable::new(
            vec!["Title".into(), "Worldwide gross".into()],
            vec![
                vec!["Avatar".into(), "$2,923,706,026".into()],
                vec!["Titanic".into(), "$2,264,812,968".into()],
            ],
        );
        let norm = NormalizedTable::from_raw(&raw, 10);
        assert_eq!(norm.columns, vec!["title", "worldwide_gross"]);
        assert_eq!(norm.numeric_columns(), vec!["worldwide_gross"]);
    }

    #[test]
    fn head_records_truncates() {
        let raw = RawTable::new(
            vec!["x".into()],
            (0..30).map(|i| vec![i.to_string()]).collect(),
        );
        let norm = NormalizedTable::from_raw(&raw, 10);
        let head = norm.head_records(20);
        assert_eq!(head.as_array().unwrap().len(), 20);
        assert_eq!(head[0]["x"], "0");
    }
}
