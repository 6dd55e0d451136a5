//! Datetime parsing for exported cells.
//!
//! Exports mix several textual layouts with native workbook datetimes and
//! bare Excel serial numbers. Explicit formats are tried first in priority
//! order, then a broader fallback set.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use pos_model::RawCell;
use pos_model::value::excel_serial_to_datetime;

/// Datetime layouts tried first, in order.
pub const PRIMARY_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
];

/// Date-only layouts tried after the datetime layouts of the same family.
pub const PRIMARY_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y"];

const FALLBACK_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y.%m.%d %H:%M:%S",
    "%Y.%m.%d %H:%M",
    "%Y年%m月%d日 %H:%M:%S",
    "%Y年%m月%d日 %H:%M",
];

const FALLBACK_DATE_FORMATS: &[&str] = &["%Y.%m.%d", "%Y年%m月%d日"];

/// Serial numbers accepted from text; wider values are not plausible dates.
const TEXT_SERIAL_RANGE: std::ops::RangeInclusive<f64> = 1.0..=100_000.0;

fn midnight(date: NaiveDate) -> Option<NaiveDateTime> {
    date.and_hms_opt(0, 0, 0)
}

fn parse_primary(text: &str) -> Option<NaiveDateTime> {
    PRIMARY_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            PRIMARY_DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
                .and_then(midnight)
        })
}

fn parse_fallback(text: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local());
    }
    if let Some(dt) = FALLBACK_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
    {
        return Some(dt);
    }
    if let Some(date) = FALLBACK_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
    {
        return midnight(date);
    }
    if text.len() == 8 && text.bytes().all(|b| b.is_ascii_digit()) {
        return NaiveDate::parse_from_str(text, "%Y%m%d").ok().and_then(midnight);
    }
    text.parse::<f64>()
        .ok()
        .filter(|serial| TEXT_SERIAL_RANGE.contains(serial))
        .and_then(excel_serial_to_datetime)
}

/// Parses datetime text; `None` when no layout matches.
pub fn parse_datetime_text(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    parse_primary(text).or_else(|| parse_fallback(text))
}

/// Parses a raw cell as a datetime.
///
/// Native datetimes pass through and numbers are read as Excel serials.
pub fn parse_datetime(cell: &RawCell) -> Option<NaiveDateTime> {
    match cell {
        RawCell::Blank => None,
        RawCell::DateTime(dt) => Some(*dt),
        RawCell::Number(serial) => excel_serial_to_datetime(*serial),
        RawCell::Text(text) => parse_datetime_text(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn test_primary_formats() {
        assert_eq!(
            parse_datetime_text("2025-12-01 20:15:30"),
            Some(dt(2025, 12, 1, 20, 15, 30))
        );
        assert_eq!(parse_datetime_text("2025-12-01 20:15"), Some(dt(2025, 12, 1, 20, 15, 0)));
        assert_eq!(parse_datetime_text("2025/12/1"), Some(dt(2025, 12, 1, 0, 0, 0)));
        assert_eq!(parse_datetime_text("01/12/2025"), Some(dt(2025, 12, 1, 0, 0, 0)));
    }

    #[test]
    fn test_fallback_formats() {
        assert_eq!(
            parse_datetime_text("2025-12-01T20:15:30"),
            Some(dt(2025, 12, 1, 20, 15, 30))
        );
        assert_eq!(
            parse_datetime_text("2025-12-01T20:15:30+08:00"),
            Some(dt(2025, 12, 1, 20, 15, 30))
        );
        assert_eq!(parse_datetime_text("2025.12.01"), Some(dt(2025, 12, 1, 0, 0, 0)));
        assert_eq!(parse_datetime_text("2025年12月01日"), Some(dt(2025, 12, 1, 0, 0, 0)));
        assert_eq!(parse_datetime_text("20251201"), Some(dt(2025, 12, 1, 0, 0, 0)));
        assert_eq!(parse_datetime_text("45992.5"), Some(dt(2025, 12, 1, 12, 0, 0)));
    }

    #[test]
    fn test_unparseable_is_none() {
        assert_eq!(parse_datetime_text(""), None);
        assert_eq!(parse_datetime_text("营业中"), None);
        assert_eq!(parse_datetime_text("2025-13-01"), None);
        assert_eq!(parse_datetime(&RawCell::Blank), None);
    }

    #[test]
    fn test_cells() {
        assert_eq!(
            parse_datetime(&RawCell::Number(45992.0)),
            Some(dt(2025, 12, 1, 0, 0, 0))
        );
        let native = dt(2025, 1, 2, 3, 4, 5);
        assert_eq!(parse_datetime(&RawCell::DateTime(native)), Some(native));
    }
}
