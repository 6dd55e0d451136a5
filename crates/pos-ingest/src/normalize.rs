//! Table cleanup after header flattening.

use std::collections::BTreeSet;

use tracing::debug;

use pos_model::{RawCell, RawTable};

/// First-column markers of spreadsheet summary rows.
pub const TOTAL_ROW_MARKERS: &[&str] = &["合计", "总计"];

/// Label given to columns whose header is blank.
pub const UNNAMED_COLUMN: &str = "unnamed_col";

/// What normalization removed or changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeStats {
    pub blank_rows: usize,
    pub total_rows: usize,
    pub empty_columns: usize,
    pub renamed_columns: usize,
    /// Rows whose non-blank cells extended past the header width.
    pub truncated_rows: usize,
}

fn is_total_row(row: &[RawCell]) -> bool {
    row.first().is_some_and(|cell| {
        let text = cell.to_text();
        TOTAL_ROW_MARKERS.iter().any(|marker| text.contains(marker))
    })
}

/// Makes labels unique: blank labels become [`UNNAMED_COLUMN`], repeats get
/// `_1`, `_2`, ... in order of appearance.
pub fn dedupe_labels(labels: Vec<String>) -> (Vec<String>, usize) {
    let mut used: BTreeSet<String> = BTreeSet::new();
    let mut renamed = 0;
    let out = labels
        .into_iter()
        .map(|label| {
            let blank = label.trim().is_empty();
            let base = if blank {
                UNNAMED_COLUMN.to_string()
            } else {
                label
            };
            if used.insert(base.clone()) {
                if blank {
                    renamed += 1;
                }
                return base;
            }
            renamed += 1;
            let mut suffix = 1;
            loop {
                let candidate = format!("{base}_{suffix}");
                if used.insert(candidate.clone()) {
                    return candidate;
                }
                suffix += 1;
            }
        })
        .collect();
    (out, renamed)
}

/// Drops blank rows, summary rows and empty columns, then dedupes labels.
pub fn normalize_table(mut table: RawTable) -> (RawTable, NormalizeStats) {
    let mut stats = NormalizeStats::default();

    let before = table.rows.len();
    table.rows.retain(|row| !row.iter().all(RawCell::is_blank));
    stats.blank_rows = before - table.rows.len();

    let before = table.rows.len();
    table.rows.retain(|row| !is_total_row(row));
    stats.total_rows = before - table.rows.len();

    let populated: Vec<bool> = (0..table.column_count())
        .map(|idx| table.column_cells(idx).any(|cell| !cell.is_blank()))
        .collect();
    let before = table.column_count();
    table.retain_columns(|idx, _| populated[idx]);
    stats.empty_columns = before - table.column_count();

    let (columns, renamed) = dedupe_labels(std::mem::take(&mut table.columns));
    table.columns = columns;
    stats.renamed_columns = renamed;

    debug!(
        rows = table.row_count(),
        columns = table.column_count(),
        blank_rows = stats.blank_rows,
        total_rows = stats.total_rows,
        empty_columns = stats.empty_columns,
        "normalized table"
    );
    (table, stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_row(values: &[&str]) -> Vec<RawCell> {
        values.iter().map(|value| RawCell::text(*value)).collect()
    }

    #[test]
    fn test_dedupe_labels() {
        let (labels, renamed) = dedupe_labels(vec![
            "现金".into(),
            "".into(),
            "现金".into(),
            " ".into(),
            "现金_1".into(),
        ]);
        assert_eq!(
            labels,
            vec!["现金", "unnamed_col", "现金_1", "unnamed_col_1", "现金_1_1"]
        );
        assert_eq!(renamed, 4);
    }

    #[test]
    fn test_normalize_drops_noise() {
        let table = RawTable::new(
            vec!["包厢名称".into(), "空列".into(), "实收金额".into(), "实收金额".into()],
            vec![
                text_row(&["A01", "", "100", "1"]),
                text_row(&["", "", "", ""]),
                text_row(&["合计", "", "100", "1"]),
                text_row(&["A02", " ", "80", "2"]),
            ],
        );
        let (table, stats) = normalize_table(table);
        assert_eq!(table.columns, vec!["包厢名称", "实收金额", "实收金额_1"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows[1], text_row(&["A02", "80", "2"]));
        assert_eq!(
            stats,
            NormalizeStats {
                blank_rows: 1,
                total_rows: 1,
                empty_columns: 1,
                renamed_columns: 1,
                truncated_rows: 0,
            }
        );
    }
}
