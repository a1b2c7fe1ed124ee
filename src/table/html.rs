//! HTML → [`RawTable`] extraction using CSS selectors.

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::RawTable;
use crate::error::{ScoutError, ScoutResult};

fn selector(css: &str) -> ScoutResult<Selector> {
    Selector::parse(css).map_err(|e| ScoutError::input(format!("CSS selector error: {e:?}")))
}

/// Collapse an element's text nodes into one trimmed, single-spaced string.
fn cell_text(el: ElementRef) -> String {
    let joined = el.text().collect::<Vec<_>>().join(" ");
    joined.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse every `<table>` in the document, in document order.
///
/// Header names come from the first row containing `<th>` cells; a table
/// with no header row uses its first row as column names, matching how the
/// upstream sources render list tables. Tables that yield no columns are
/// dropped.
pub fn parse_tables(html: &str) -> ScoutResult<Vec<RawTable>> {
    let document = Html::parse_document(html);
    let table_sel = selector("table")?;
    let row_sel = selector("tr")?;
    let header_sel = selector("th")?;
    let cell_sel = selector("th, td")?;

    let mut tables = Vec::new();
    for table_el in document.select(&table_sel) {
        let mut columns: Vec<String> = Vec::new();
        let mut rows: Vec<Vec<String>> = Vec::new();

        for row_el in table_el.select(&row_sel) {
            let cells: Vec<String> = row_el.select(&cell_sel).map(cell_text).collect();
            if cells.is_empty() {
                continue;
            }
            if columns.is_empty() {
                // First populated row becomes the header whether or not it
                // uses <th>; a th-bearing later row never re-headers.
                columns = cells;
            } else if row_el.select(&header_sel).count() == row_el.select(&cell_sel).count() {
                // Pure-header continuation rows (grouping rows) carry no data
                continue;
            } else {
                rows.push(cells);
            }
        }

        if !columns.is_empty() {
            tables.push(RawTable::new(columns, rows));
        }
    }

    debug!(count = tables.len(), "parsed html tables");
    Ok(tables)
}
