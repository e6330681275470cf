//! Amount normalization
//!
//! Amounts in the fact tables come from a spreadsheet export and may be
//! stored as locale-formatted text ("1 250,50"). These helpers turn any cell
//! into an `f64`, treating anything unreadable as zero.

use crate::db::CellValue;

/// Read a monetary amount from a cell.
///
/// Text is stripped of all whitespace (including non-breaking spaces), its
/// first comma becomes the decimal point, and the longest numeric prefix is
/// parsed. NULL, non-numeric and non-finite values yield `0.0`.
pub fn parse_amount(value: &CellValue) -> f64 {
    let amount = match value {
        CellValue::Integer(i) => *i as f64,
        CellValue::Float(f) => *f,
        CellValue::Text(s) => parse_amount_str(s),
        _ => 0.0,
    };
    if amount.is_finite() { amount } else { 0.0 }
}

/// Text form of [`parse_amount`]
pub fn parse_amount_str(raw: &str) -> f64 {
    let cleaned: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let cleaned = cleaned.replacen(',', ".", 1);
    numeric_prefix(&cleaned).parse::<f64>().unwrap_or(0.0)
}

/// Longest prefix of `s` that reads as a decimal number
fn numeric_prefix(s: &str) -> &str {
    let b = s.as_bytes();
    let digits_from = |mut i: usize| {
        while i < b.len() && b[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut i = 0;
    if matches!(b.first(), Some(b'+' | b'-')) {
        i = 1;
    }
    let int_end = digits_from(i);
    let mut digits = int_end - i;
    i = int_end;

    if b.get(i) == Some(&b'.') {
        let frac_end = digits_from(i + 1);
        digits += frac_end - (i + 1);
        if digits > 0 {
            i = frac_end;
        }
    }
    if digits == 0 {
        return "";
    }

    if matches!(b.get(i), Some(b'e' | b'E')) {
        let mut j = i + 1;
        if matches!(b.get(j), Some(b'+' | b'-')) {
            j += 1;
        }
        let exp_end = digits_from(j);
        if exp_end > j {
            i = exp_end;
        }
    }
    &s[..i]
}
