//! Cell value helpers for currency text and numeric formatting.

use chrono::{Duration, NaiveDate, NaiveDateTime};

/// Characters removed from currency text before numeric parsing.
const CURRENCY_NOISE: &[char] = &['¥', '￥', '$', ',', '，', '%'];

/// Strips currency symbols, thousands separators, percent signs and whitespace.
pub fn clean_currency(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace() && !CURRENCY_NOISE.contains(c))
        .collect()
}

/// Parses currency text into a finite amount.
///
/// Returns `None` for blank text and for anything that is not a number once
/// the currency noise has been removed.
pub fn parse_amount(text: &str) -> Option<f64> {
    let cleaned = clean_currency(text);
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Returns true when the text parses as an amount.
pub fn looks_numeric(text: &str) -> bool {
    parse_amount(text).is_some()
}

/// Rounds to whole cents.
pub fn round_cents(value: f64) -> f64 {
    let rounded = (value * 100.0).round() / 100.0;
    // Avoid emitting -0.0.
    if rounded == 0.0 { 0.0 } else { rounded }
}

/// Formats a floating-point number without trailing zeros after the decimal.
///
/// Integer-valued floats like 40.0 are formatted as "40".
///
/// # Examples
///
/// ```
/// use pos_model::value::format_numeric;
///
/// assert_eq!(format_numeric(1.0), "1");
/// assert_eq!(format_numeric(1.50), "1.5");
/// assert_eq!(format_numeric(40.0), "40");
/// ```
pub fn format_numeric(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e17 {
        return format!("{v:.0}");
    }
    let s = format!("{v}");
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}

/// Converts an Excel serial date (days since 1899-12-30) to a datetime.
///
/// Fractions are rounded to the nearest second.
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || !(0.0..2_958_466.0).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let seconds = (serial * 86_400.0).round() as i64;
    epoch.checked_add_signed(Duration::seconds(seconds))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_currency() {
        assert_eq!(clean_currency("¥1,234.50"), "1234.50");
        assert_eq!(clean_currency(" 12 % "), "12");
        assert_eq!(clean_currency("￥ 3，000"), "3000");
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("¥1,234.50"), Some(1234.5));
        assert_eq!(parse_amount("-20"), Some(-20.0));
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("  "), None);
        assert_eq!(parse_amount("n/a"), None);
        assert_eq!(parse_amount("inf"), None);
    }

    #[test]
    fn test_round_cents() {
        assert_eq!(round_cents(39.499_999), 39.5);
        assert_eq!(round_cents(0.1 + 0.2), 0.3);
        assert_eq!(round_cents(-0.001).to_string(), "0");
    }

    #[test]
    fn test_excel_serial_to_datetime() {
        let dt = excel_serial_to_datetime(45_658.875).unwrap();
        assert_eq!(dt.to_string(), "2025-01-01 21:00:00");
        assert_eq!(excel_serial_to_datetime(-1.0), None);
        assert_eq!(excel_serial_to_datetime(f64::NAN), None);
    }

    #[test]
    fn test_format_numeric() {
        assert_eq!(format_numeric(0.0), "0");
        assert_eq!(format_numeric(100.0), "100");
        assert_eq!(format_numeric(6_212_345_678_901_234.0), "6212345678901234");
        assert_eq!(format_numeric(2.25), "2.25");
    }
}
