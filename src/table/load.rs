//! Load tabular attachments delivered by the intake collaborator.
//!
//! Attachments are classified by file extension; anything the pipeline
//! cannot read is logged and skipped rather than failing the request.

use tracing::{info, warn};

use super::RawTable;
use crate::error::{ScoutError, ScoutResult};

/// Parse delimited bytes into a [`RawTable`], first record as header.
fn read_delimited(bytes: &[u8], delimiter: u8) -> ScoutResult<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(bytes);

    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| ScoutError::input(format!("bad delimited header: {e}")))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ScoutError::input(format!("bad delimited row: {e}")))?;
        rows.push(record.iter().map(|c| c.to_string()).collect());
    }

    Ok(RawTable::new(columns, rows))
}

/// Load one attachment if its extension names a readable tabular format.
///
/// `.xls`/`.xlsx` are recognized tabular formats this build cannot read;
/// they are reported and skipped so the rest of the request proceeds.
pub fn load_attachment(name: &str, bytes: &[u8]) -> Option<RawTable> {
    let ext = name.rsplit('.').next().unwrap_or("").to_ascii_lowercase();
    let result = match ext.as_str() {
        "csv" => read_delimited(bytes, b','),
        "tsv" => read_delimited(bytes, b'\t'),
        "xls" | "xlsx" => {
            warn!(name, "spreadsheet attachments are not supported, skipping");
            return None;
        }
        _ => return None,
    };

    match result {
        Ok(table) => {
            info!(name, rows = table.row_count(), "loaded attachment");
            Some(table)
        }
        Err(e) => {
            warn!(name, error = %e, "failed to load attachment, skipping");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_csv_attachment() {
        let bytes = b"rank,peak\n1,1\n2,3\n";
        let table = load_attachment("data.csv", bytes).unwrap();
        assert_eq!(table.columns, vec!["rank", "peak"]);
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn loads_tsv_attachment() {
        let bytes = b"a\tb\n1\t2\n";
        let table = load_attachment("data.tsv", bytes).unwrap();
        assert_eq!(table.columns, vec!["a", "b"]);
    }

    #[test]
    fn unknown_extensions_are_skipped() {
        assert!(load_attachment("notes.txt", b"whatever").is_none());
        assert!(load_attachment("book.xlsx", b"\x00binary").is_none());
    }

    #[test]
    fn malformed_csv_is_skipped_not_fatal() {
        // Invalid UTF-8 in a record errors the reader mid-stream.
        let bytes = b"a,b\n\xff\xfe,2\n";
        assert!(load_attachment("bad.csv", bytes).is_none());
    }
}
