//! Pick the single most relevant table among parsed candidates.
//!
//! Two modes, two guarantees: keyword mode serves callers that know the
//! semantic roles they need ("rank" and "peak"); numeric-density mode serves
//! callers with no hint, using the count of numeric columns as a relevance
//! proxy. Both are pure scoring over [`NormalizedTable`], selection is
//! max-by-score with ties broken by document order.

use tracing::{info, warn};

use super::{NormalizedTable, RawTable};
use crate::error::{ScoutError, ScoutResult};

/// True when every required keyword has a case-insensitive substring match
/// among the table's normalized column names.
pub fn matches_keywords(table: &NormalizedTable, keywords: &[&str]) -> bool {
    keywords.iter().all(|kw| {
        let kw = kw.to_lowercase();
        table.columns.iter().any(|c| c.contains(&kw))
    })
}

/// Count of columns classified as numeric: the relevance score used when no
/// semantic hint is available.
pub fn numeric_density(table: &NormalizedTable) -> usize {
    table.numeric.iter().filter(|&&n| n).count()
}

/// Keyword mode: first table in document order whose columns cover every
/// keyword; falls back to the first table when none match.
pub fn select_by_keywords<'a>(
    tables: &'a [RawTable],
    keywords: &[&str],
    classify_sample_rows: usize,
) -> ScoutResult<(&'a RawTable, NormalizedTable)> {
    if tables.is_empty() {
        return Err(ScoutError::input("no tables found"));
    }

    for (i, raw) in tables.iter().enumerate() {
        let norm = NormalizedTable::from_raw(raw, classify_sample_rows);
        if matches_keywords(&norm, keywords) {
            info!(table = i, ?keywords, "selected table by keyword match");
            return Ok((raw, norm));
        }
    }

    warn!(?keywords, "no table matched keywords, falling back to first");
    Ok((&tables[0], NormalizedTable::from_raw(&tables[0], classify_sample_rows)))
}

/// Numeric-density mode: the table with the most numeric columns, earliest
/// wins ties. Zero tables is a fatal input error; a best table with zero
/// numeric columns is returned as-is and the caller must check
/// [`NormalizedTable::numeric_columns`] before depending on them.
pub fn select_by_density(
    tables: &[RawTable],
    classify_sample_rows: usize,
) -> ScoutResult<(usize, NormalizedTable)> {
    if tables.is_empty() {
        return Err(ScoutError::input("no tables found"));
    }

    let mut best_index = 0;
    let mut best_table: Option<NormalizedTable> = None;
    let mut best_score = 0;

    for (i, raw) in tables.iter().enumerate() {
        let norm = NormalizedTable::from_raw(raw, classify_sample_rows);
        let score = numeric_density(&norm);
        if best_table.is_none() || score > best_score {
            best_index = i;
            best_score = score;
            best_table = Some(norm);
        }
    }

    let table = best_table.unwrap_or_else(|| {
        // Unreachable: tables is non-empty, the loop always assigns.
        NormalizedTable::from_raw(&tables[0], classify_sample_rows)
    });

    if best_score == 0 {
        warn!("best table has no numeric columns, continuing degraded");
    } else {
        info!(
            table = best_index,
            numeric_columns = best_score,
            "selected table by numeric density"
        );
    }

    Ok((best_index, table))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(cols: &[&str], row: &[&str]) -> RawTable {
        RawTable::new(
            cols.iter().map(|c| c.to_string()).collect(),
            vec![row.iter().map(|c| c.to_string()).collect()],
        )
    }

    #[test]
    fn keyword_mode_skips_non_matching_tables() {
        let tables = vec![
            table(&["Name", "Score"], &["alpha", "10"]),
            table(&["Rank", "Peak"], &["1", "2"]),
        ];
        let (raw, norm) = select_by_keywords(&tables, &["rank", "peak"], 10).unwrap();
        assert_eq!(raw.columns, vec!["Rank", "Peak"]);
        assert_eq!(norm.columns, vec!["rank", "peak"]);
    }

    #[test]
    fn keyword_mode_falls_back_to_first() {
        let tables = vec![
            table(&["Name", "Score"], &["alpha", "10"]),
            table(&["Rank", "Peak"], &["1", "2"]),
        ];
        let (raw, _) = select_by_keywords(&tables, &["nonexistent"], 10).unwrap();
        assert_eq!(raw.columns, vec!["Name", "Score"]);
    }

    #[test]
    fn keyword_match_is_substring_on_normalized_names() {
        let tables = vec![table(&["Worldwide gross (2024)", "Title"], &["$1bn", "Avatar"])];
        let (_, norm) = select_by_keywords(&tables, &["worldwide", "gross", "title"], 10).unwrap();
        assert!(matches_keywords(&norm, &["gross"]));
    }

    #[test]
    fn density_mode_prefers_more_numeric_columns() {
        let tables = vec![
            table(&["a", "b", "c", "d"], &["1", "2", "x", "y"]),
            table(&["e", "f", "g", "h"], &["1", "2", "3", "4"]),
        ];
        let (index, norm) = select_by_density(&tables, 10).unwrap();
        assert_eq!(index, 1);
        assert_eq!(numeric_density(&norm), 4);
    }

    #[test]
    fn density_mode_ties_break_earliest() {
        let tables = vec![
            table(&["a", "b"], &["1", "2"]),
            table(&["c", "d"], &["3", "4"]),
        ];
        let (index, _) = select_by_density(&tables, 10).unwrap();
        assert_eq!(index, 0);
    }

    #[test]
    fn zero_tables_is_a_fatal_input_error() {
        let err = select_by_density(&[], 10).unwrap_err();
        assert!(matches!(err, ScoutError::Input { .. }));
        let err = select_by_keywords(&[], &["rank"], 10).unwrap_err();
        assert!(matches!(err, ScoutError::Input { .. }));
    }

    #[test]
    fn all_text_document_returns_first_with_no_numeric_columns() {
        let tables = vec![
            table(&["a", "b"], &["x", "y"]),
            table(&["c"], &["z"]),
        ];
        let (index, norm) = select_by_density(&tables, 10).unwrap();
        assert_eq!(index, 0);
        assert!(norm.numeric_columns().is_empty());
    }
}
