//! Header row location by keyword density.
//!
//! Exports start with a variable preamble (report title, store name, date
//! range, filter settings) before the real header. Each candidate row is
//! normalized and scored by how many header keywords it contains; the best
//! row wins, earliest first on ties. The same pass picks up the first
//! date-like text as a fallback business date.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use tracing::debug;

use crate::error::{IngestError, Result};

/// Labels that only appear in real header rows, covering every report type.
pub const HEADER_KEYWORDS: &[&str] = &[
    "实收金额",
    "开台单号",
    "酒水名称",
    "账单合计",
    "门店名称",
    "包厢名称",
    "订位人",
    "会员卡号",
    "变动类型",
];

static SEPARATED_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(20\d{2})[-./](\d{1,2})[-./](\d{1,2})").expect("valid separated date regex")
});

static LOCALIZED_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(20\d{2})年(\d{1,2})月(\d{1,2})日").expect("valid localized date regex")
});

static COMPACT_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\D)(20\d{2})(\d{2})(\d{2})(?:\D|$)").expect("valid compact date regex")
});

/// Where the header is and what else the scan found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderLocation {
    /// Zero-based row of the header within the source grid.
    pub header_index: usize,
    /// Number of keywords found in the header row.
    pub score: usize,
    /// First date found in the scanned rows.
    pub detected_date: Option<NaiveDate>,
}

/// Lowercases and removes whitespace, punctuation and underscores.
pub fn normalize_match_text(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn keyword_score(row: &str, keywords: &[String]) -> usize {
    let normalized = normalize_match_text(row);
    keywords
        .iter()
        .filter(|keyword| normalized.contains(keyword.as_str()))
        .count()
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

/// Finds the first valid date in `text`.
///
/// Separated numeric forms are tried first, then the localized
/// year/month/day form, then a bare 8-digit run.
pub fn find_date(text: &str) -> Option<NaiveDate> {
    [&*SEPARATED_DATE, &*LOCALIZED_DATE, &*COMPACT_DATE]
        .iter()
        .find_map(|pattern| {
            pattern
                .captures_iter(text)
                .find_map(|caps| ymd(&caps[1], &caps[2], &caps[3]))
        })
}

/// Scores candidate rows and returns the header location.
///
/// `rows` holds the text of each row in the scan window.
///
/// # Errors
///
/// Returns [`IngestError::NoHeaderDetected`] when no row contains a keyword.
pub fn locate_header(rows: &[String]) -> Result<HeaderLocation> {
    let keywords: Vec<String> = HEADER_KEYWORDS
        .iter()
        .map(|keyword| normalize_match_text(keyword))
        .collect();
    let mut best: Option<(usize, usize)> = None;
    let mut detected_date = None;
    for (idx, row) in rows.iter().enumerate() {
        let score = keyword_score(row, &keywords);
        if score > 0 && best.is_none_or(|(_, best_score)| score > best_score) {
            best = Some((idx, score));
        }
        if detected_date.is_none() {
            detected_date = find_date(row);
        }
    }
    let (header_index, score) = best.ok_or(IngestError::NoHeaderDetected {
        scanned: rows.len(),
    })?;
    debug!(header_index, score, ?detected_date, "located header row");
    Ok(HeaderLocation {
        header_index,
        score,
        detected_date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|line| (*line).to_string()).collect()
    }

    #[test]
    fn test_normalize_match_text() {
        assert_eq!(normalize_match_text(" 实收_金额 (元) "), "实收金额元");
        assert_eq!(normalize_match_text("POS-Card"), "poscard");
    }

    #[test]
    fn test_preamble_rows_are_skipped() {
        let lines = rows(&[
            "包厢开台分析表",
            "门店：空境KTV（万象城店）",
            "统计时间：2025-12-01 至 2025-12-01",
            "导出人：管理员",
            "",
            "包厢名称,开台单号,开房时间,账单合计,实收金额",
            "A01,KT202512010001,2025-12-01 20:00,300,280",
        ]);
        let location = locate_header(&lines).unwrap();
        assert_eq!(location.header_index, 5);
        assert_eq!(location.score, 4);
        assert_eq!(location.detected_date, NaiveDate::from_ymd_opt(2025, 12, 1));
    }

    #[test]
    fn test_ties_pick_earliest_row() {
        let lines = rows(&["订位人,部门", "订位人,部门"]);
        assert_eq!(locate_header(&lines).unwrap().header_index, 0);
    }

    #[test]
    fn test_no_keywords_is_header_error() {
        let lines = rows(&["title", "a,b,c"]);
        assert!(matches!(
            locate_header(&lines),
            Err(IngestError::NoHeaderDetected { scanned: 2 })
        ));
    }

    #[test]
    fn test_find_date_forms() {
        assert_eq!(find_date("日期 2025/3/7"), NaiveDate::from_ymd_opt(2025, 3, 7));
        assert_eq!(find_date("2025年12月01日"), NaiveDate::from_ymd_opt(2025, 12, 1));
        assert_eq!(find_date("export_20251130.csv"), NaiveDate::from_ymd_opt(2025, 11, 30));
        assert_eq!(find_date("单号 202512010001"), None);
        assert_eq!(find_date("2025-13-45"), None);
    }
}
