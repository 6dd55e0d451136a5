//! Raw spreadsheet cells and the label-addressed table built from them.

use chrono::NaiveDateTime;
use serde_json::Value;

use crate::value::{format_numeric, parse_amount};

/// A cell exactly as read from the source sheet.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RawCell {
    #[default]
    Blank,
    Text(String),
    Number(f64),
    DateTime(NaiveDateTime),
}

impl RawCell {
    /// Builds a text cell, mapping whitespace-only text to `Blank`.
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.trim().is_empty() {
            Self::Blank
        } else {
            Self::Text(value)
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            Self::Blank => true,
            Self::Text(text) => text.trim().is_empty(),
            Self::Number(value) => value.is_nan(),
            Self::DateTime(_) => false,
        }
    }

    /// Display form of the cell; blank cells render as an empty string.
    pub fn to_text(&self) -> String {
        match self {
            Self::Blank => String::new(),
            Self::Text(text) => text.clone(),
            Self::Number(value) if value.is_nan() => String::new(),
            Self::Number(value) => format_numeric(*value),
            Self::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    /// Numeric reading of the cell, treating text as currency.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) if value.is_finite() => Some(*value),
            Self::Text(text) => parse_amount(text),
            _ => None,
        }
    }

    /// JSON form used in issue snapshots.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Blank => Value::Null,
            Self::Text(text) => Value::String(text.clone()),
            Self::Number(value) => serde_json::Number::from_f64(*value)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Self::DateTime(dt) => Value::String(dt.format("%Y-%m-%dT%H:%M:%S").to_string()),
        }
    }
}

static BLANK: RawCell = RawCell::Blank;

/// Ordered rows addressed by column label.
///
/// Every row holds exactly `columns.len()` cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<RawCell>>,
}

impl RawTable {
    /// Builds a table, padding short rows with blanks and cutting long ones.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<RawCell>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, RawCell::Blank);
                row
            })
            .collect();
        Self { columns, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == label)
    }

    pub fn has_column(&self, label: &str) -> bool {
        self.column_index(label).is_some()
    }

    pub fn cell(&self, row: usize, column: usize) -> &RawCell {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .unwrap_or(&BLANK)
    }

    /// Iterates the cells of one column top to bottom.
    pub fn column_cells(&self, column: usize) -> impl Iterator<Item = &RawCell> + '_ {
        self.rows.iter().map(move |row| row.get(column).unwrap_or(&BLANK))
    }

    /// Removes a column and returns its label and cells.
    pub fn take_column(&mut self, column: usize) -> (String, Vec<RawCell>) {
        let label = self.columns.remove(column);
        let cells = self
            .rows
            .iter_mut()
            .map(|row| {
                if column < row.len() {
                    row.remove(column)
                } else {
                    RawCell::Blank
                }
            })
            .collect();
        (label, cells)
    }

    /// Keeps only the columns whose index satisfies the predicate.
    pub fn retain_columns(&mut self, mut keep: impl FnMut(usize, &str) -> bool) {
        let mask: Vec<bool> = self
            .columns
            .iter()
            .enumerate()
            .map(|(idx, label)| keep(idx, label))
            .collect();
        let mut idx = 0;
        self.columns.retain(|_| {
            let kept = mask[idx];
            idx += 1;
            kept
        });
        for row in &mut self.rows {
            let mut idx = 0;
            row.retain(|_| {
                let kept = mask.get(idx).copied().unwrap_or(false);
                idx += 1;
                kept
            });
        }
    }

    /// Slices rows `[offset, offset + len)` into a new table with the same columns.
    pub fn slice(&self, offset: usize, len: usize) -> Self {
        let end = (offset + len).min(self.rows.len());
        let start = offset.min(end);
        Self {
            columns: self.columns.clone(),
            rows: self.rows[start..end].to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RawTable {
        RawTable::new(
            vec!["a".into(), "b".into(), "c".into()],
            vec![
                vec![RawCell::text("x"), RawCell::Number(1.0)],
                vec![
                    RawCell::text("y"),
                    RawCell::Number(2.5),
                    RawCell::text("z"),
                    RawCell::text("extra"),
                ],
            ],
        )
    }

    #[test]
    fn test_rows_are_padded_and_cut() {
        let table = table();
        assert!(table.rows.iter().all(|row| row.len() == 3));
        assert_eq!(table.cell(0, 2), &RawCell::Blank);
        assert_eq!(table.cell(9, 9), &RawCell::Blank);
    }

    #[test]
    fn test_take_and_retain_columns() {
        let mut table = table();
        let (label, cells) = table.take_column(1);
        assert_eq!(label, "b");
        assert_eq!(cells, vec![RawCell::Number(1.0), RawCell::Number(2.5)]);
        table.retain_columns(|_, label| label != "c");
        assert_eq!(table.columns, vec!["a".to_string()]);
        assert_eq!(table.rows[1], vec![RawCell::text("y")]);
    }

    #[test]
    fn test_cell_text_and_number() {
        assert!(RawCell::text("   ").is_blank());
        assert_eq!(RawCell::Number(12.0).to_text(), "12");
        assert_eq!(RawCell::text("¥1,200").as_number(), Some(1200.0));
        assert_eq!(RawCell::text("abc").as_number(), None);
    }

    #[test]
    fn test_slice_bounds() {
        let table = table();
        assert_eq!(table.slice(1, 10).row_count(), 1);
        assert_eq!(table.slice(5, 10).row_count(), 0);
    }
}
