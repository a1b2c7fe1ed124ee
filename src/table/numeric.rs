//! Best-effort coercion of raw table cells to numbers.
//!
//! A cell either coerces or is missing; a bad cell is never an error, so one
//! garbled value cannot take down a whole column.

use regex::Regex;
use std::sync::OnceLock;

/// One value per source row: a float or a missing marker.
pub type NumericColumn = Vec<Option<f64>>;

fn money_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // Optional currency symbol, mantissa, optional magnitude suffix.
        // Anchored: a cell that merely contains a number somewhere goes
        // through the digit-stripping fallback instead.
        Regex::new(r"(?i)^[$€£]?\s*(-?\d+(?:\.\d+)?)\s*(mn|million|m|bn|billion|b)?\b").unwrap()
    })
}

/// Interpret one raw cell as a number.
///
/// Commas (thousands separators) and surrounding whitespace are stripped
/// first. `$1.5bn` and `1.5 billion` become 1.5e9, `3 m` becomes 3e6. When
/// the currency/magnitude pattern does not apply, every character that is
/// not a digit or decimal point is dropped and the remainder parsed.
/// Returns `None` when no digits survive.
pub fn coerce(cell: &str) -> Option<f64> {
    let cleaned = cell.trim().replace(',', "");
    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    if let Some(caps) = money_re().captures(&cleaned) {
        let mantissa: f64 = caps.get(1)?.as_str().parse().ok()?;
        let scale = match caps.get(2).map(|m| m.as_str().to_ascii_lowercase()) {
            Some(s) if s.starts_with('b') => 1e9,
            Some(s) if s.starts_with('m') => 1e6,
            _ => 1.0,
        };
        return Some(mantissa * scale);
    }

    // Fallback: keep digits and the decimal point, parse what remains.
    let digits: String = cleaned.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
    digits.parse().ok()
}

/// Declare a column numeric if at least one of its first `sample_rows` cells
/// coerces. Deliberately permissive: a sparse numeric column must not be
/// silently lost downstream.
pub fn classify_column(cells: &[&str], sample_rows: usize) -> bool {
    cells.iter().take(sample_rows).any(|c| coerce(c).is_some())
}

/// Coerce a whole column, one value or missing per row.
pub fn coerce_column(cells: &[&str]) -> NumericColumn {
    cells.iter().map(|c| coerce(c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6 * b.abs().max(1.0)
    }

    #[test]
    fn currency_and_magnitude_forms_agree() {
        assert!(close(coerce("$1.5bn").unwrap(), 1_500_000_000.0));
        assert!(close(coerce("$1,500,000,000").unwrap(), 1_500_000_000.0));
        assert!(close(coerce("1.5 billion").unwrap(), 1_500_000_000.0));
        assert!(close(coerce("$2.8 million").unwrap(), 2_800_000.0));
        assert!(close(coerce("12mn").unwrap(), 12_000_000.0));
    }

    #[test]
    fn plain_numbers_and_noise() {
        assert!(close(coerce("42").unwrap(), 42.0));
        assert!(close(coerce(" 1,234.5 ").unwrap(), 1234.5));
        assert!(close(coerce("T2B[a]").unwrap(), 2.0));
        assert!(close(coerce("-7").unwrap(), -7.0));
    }

    #[test]
    fn no_digits_is_missing_not_an_error() {
        assert_eq!(coerce(""), None);
        assert_eq!(coerce("n/a"), None);
        assert_eq!(coerce("—"), None);
        assert_eq!(coerce("TBD"), None);
    }

    #[test]
    fn coercion_is_idempotent() {
        let first = coerce("$1.5bn").unwrap();
        let second = coerce(&first.to_string()).unwrap();
        assert!(close(first, second));
    }

    #[test]
    fn classify_samples_the_head() {
        let mostly_text: Vec<&str> = vec!["alpha", "beta", "3", "gamma"];
        assert!(classify_column(&mostly_text, 10));

        let all_text: Vec<&str> = vec!["alpha", "beta", "gamma"];
        assert!(!classify_column(&all_text, 10));

        // Numeric cells past the sample window do not count.
        let late: Vec<&str> = std::iter::repeat("x").take(10).chain(["5"]).collect();
        assert!(!classify_column(&late, 10));
    }

    #[test]
    fn column_coercion_preserves_length() {
        let cells = vec!["1", "n/a", "3"];
        let col = coerce_column(&cells);
        assert_eq!(col.len(), 3);
        assert_eq!(col[1], None);
    }
}
