// Utility helpers for parsing and number formatting.
//
// This module centralizes all the "dirty" spreadsheet number handling so the
// rest of the code can assume clean, typed values.
use num_format::{Locale, ToFormattedString};

/// Parse a string-like value into `f64` while being forgiving about
/// formatting issues that are common in spreadsheet exports.
///
/// - Accepts `Option<&str>` so callers can pass through optional fields.
/// - Trims whitespace.
/// - Rejects values that contain alphabetic characters.
/// - Strips thousands separators like `","` before parsing.
/// - Returns `None` for anything that cannot be safely parsed.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let s = s.replace(",", "");
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Normalize a raw consumption cell to whole energy units.
///
/// The single rounding rule for the whole crate: truncate toward zero.
/// Returns `None` when the cell is blank or unparseable; callers treat that
/// as zero units.
pub fn normalize_units(s: Option<&str>) -> Option<i64> {
    // `as` saturates on overflow, and finite input is guaranteed above.
    parse_f64_safe(s).map(|v| v.trunc() as i64)
}

/// Change from `from` to `to` as a percentage of `from`, or `None` when
/// `from` is zero.
pub fn percent_change(from: i64, to: i64) -> Option<f64> {
    if from == 0 {
        return None;
    }
    // Subtract in f64: the i64 difference of two extreme sums can overflow.
    Some((to as f64 - from as f64) / from as f64 * 100.0)
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Format a floating-point value with:
    // - a fixed number of decimal places, and
    // - locale-aware thousands separators (e.g., `1,234,567.89`).
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Thin wrapper around `num-format` for integer-like values.
    n.to_formatted_string(&Locale::en)
}

/// KPI style used on the dashboard, e.g. `Unit 1,234`.
pub fn format_units(n: i64) -> String {
    format!("Unit {}", format_int(n))
}

/// Meter readings and factors print without thousands separators and without
/// trailing zeros, the way they appear on the sheet.
pub fn format_reading(v: f64) -> String {
    let s = format!("{:.4}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_thousands_separators_and_rejects_text() {
        assert_eq!(parse_f64_safe(Some(" 1,234.5 ")), Some(1234.5));
        assert_eq!(parse_f64_safe(Some("n/a")), None);
        assert_eq!(parse_f64_safe(Some("")), None);
        assert_eq!(parse_f64_safe(None), None);
    }

    #[test]
    fn normalization_truncates_toward_zero() {
        assert_eq!(normalize_units(Some("10.99")), Some(10));
        assert_eq!(normalize_units(Some("-10.99")), Some(-10));
        assert_eq!(normalize_units(Some("2,000.5")), Some(2000));
        assert_eq!(normalize_units(Some("  ")), None);
        assert_eq!(normalize_units(Some("99999999999999999999")), Some(i64::MAX));
    }

    #[test]
    fn percent_change_needs_a_nonzero_base() {
        assert_eq!(percent_change(0, 10), None);
        assert_eq!(percent_change(100, 110), Some(10.0));
        assert_eq!(percent_change(200, 150), Some(-25.0));
        let swing = percent_change(i64::MIN, i64::MAX).unwrap();
        assert!(swing.is_finite() && swing < 0.0);
    }

    #[test]
    fn formats_numbers_with_separators() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(-12.5, 1), "-12.5");
        assert_eq!(format_number(0.0, 2), "0.00");
        assert_eq!(format_units(1234), "Unit 1,234");
    }

    #[test]
    fn readings_drop_trailing_zeros() {
        assert_eq!(format_reading(1.0), "1");
        assert_eq!(format_reading(0.25), "0.25");
        assert_eq!(format_reading(12345.5), "12345.5");
    }
}
