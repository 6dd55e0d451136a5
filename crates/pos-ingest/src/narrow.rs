//! Compact in-memory frame for inspecting a normalized table.
//!
//! The frame is for display and footprint only; canonical records are always
//! built from the untouched [`RawTable`], so narrowing never changes a
//! monetary value.

use std::collections::{BTreeMap, BTreeSet};

use polars::prelude::{Column, DataFrame, DataType, IntoColumn, NamedFrom, Series};
use serde::Serialize;

use pos_model::{RawCell, RawTable};

use crate::error::Result;

/// Share of distinct values at or below which a text column is dictionary-encoded.
pub const CATEGORY_CARDINALITY_RATIO: f64 = 0.5;

/// Physical storage chosen for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnStorage {
    Int32,
    Int64,
    Float32,
    /// Dictionary codes into a level list.
    Category { levels: usize },
    Text,
}

impl ColumnStorage {
    pub fn label(&self) -> String {
        match self {
            Self::Int32 => "int32".to_string(),
            Self::Int64 => "int64".to_string(),
            Self::Float32 => "float32".to_string(),
            Self::Category { levels } => format!("category({levels})"),
            Self::Text => "text".to_string(),
        }
    }
}

/// A narrowed polars frame plus the per-column storage decisions.
#[derive(Debug, Clone)]
pub struct NarrowedFrame {
    pub frame: DataFrame,
    pub storage: Vec<(String, ColumnStorage)>,
    /// Level lists of dictionary-encoded columns.
    pub categories: BTreeMap<String, Vec<String>>,
}

impl NarrowedFrame {
    pub fn estimated_size(&self) -> usize {
        self.frame.estimated_size()
    }
}

enum Numbers {
    Integers(Vec<Option<i64>>),
    Floats(Vec<Option<f64>>),
}

/// Reads a column as numbers when every populated cell is numeric.
fn numeric_column(cells: &[&RawCell]) -> Option<Numbers> {
    let mut values = Vec::with_capacity(cells.len());
    let mut populated = 0;
    for cell in cells {
        if cell.is_blank() {
            values.push(None);
            continue;
        }
        values.push(Some(cell.as_number()?));
        populated += 1;
    }
    if populated == 0 {
        return None;
    }
    let integral = values
        .iter()
        .flatten()
        .all(|value| value.fract() == 0.0 && value.abs() < i64::MAX as f64);
    if integral {
        Some(Numbers::Integers(
            values.iter().map(|value| value.map(|v| v as i64)).collect(),
        ))
    } else {
        Some(Numbers::Floats(values))
    }
}

fn narrow_column(name: &str, cells: &[&RawCell]) -> Result<(Column, ColumnStorage, Option<Vec<String>>)> {
    match numeric_column(cells) {
        Some(Numbers::Integers(values)) => {
            let fits = values
                .iter()
                .flatten()
                .all(|value| i32::try_from(*value).is_ok());
            let series = Series::new(name.into(), values);
            if fits {
                Ok((series.cast(&DataType::Int32)?.into_column(), ColumnStorage::Int32, None))
            } else {
                Ok((series.into_column(), ColumnStorage::Int64, None))
            }
        }
        Some(Numbers::Floats(values)) => {
            let series = Series::new(name.into(), values).cast(&DataType::Float32)?;
            Ok((series.into_column(), ColumnStorage::Float32, None))
        }
        None => {
            let texts: Vec<Option<String>> = cells
                .iter()
                .map(|cell| (!cell.is_blank()).then(|| cell.to_text()))
                .collect();
            let distinct: BTreeSet<&str> = texts.iter().flatten().map(String::as_str).collect();
            let ratio = distinct.len() as f64 / cells.len().max(1) as f64;
            if ratio <= CATEGORY_CARDINALITY_RATIO {
                let levels: Vec<String> = distinct.iter().map(|level| (*level).to_string()).collect();
                let codes: Vec<Option<u32>> = texts
                    .iter()
                    .map(|text| {
                        text.as_ref().and_then(|text| {
                            levels
                                .binary_search(text)
                                .ok()
                                .and_then(|idx| u32::try_from(idx).ok())
                        })
                    })
                    .collect();
                let storage = ColumnStorage::Category {
                    levels: levels.len(),
                };
                Ok((Series::new(name.into(), codes).into_column(), storage, Some(levels)))
            } else {
                Ok((Series::new(name.into(), texts).into_column(), ColumnStorage::Text, None))
            }
        }
    }
}

/// Builds the narrowed frame for a normalized table.
///
/// Integer columns narrow to 32 bits when every value fits, float columns to
/// 32 bits, and text columns whose distinct count is at most half the row
/// count become dictionary codes.
///
/// # Errors
///
/// Returns an error if polars rejects a cast or the frame.
pub fn narrow_table(table: &RawTable) -> Result<NarrowedFrame> {
    let mut columns = Vec::with_capacity(table.column_count());
    let mut storage = Vec::with_capacity(table.column_count());
    let mut categories = BTreeMap::new();
    for (idx, name) in table.columns.iter().enumerate() {
        let cells: Vec<&RawCell> = table.column_cells(idx).collect();
        let (column, kind, levels) = narrow_column(name, &cells)?;
        columns.push(column);
        storage.push((name.clone(), kind));
        if let Some(levels) = levels {
            categories.insert(name.clone(), levels);
        }
    }
    let frame = DataFrame::new(columns)?;
    Ok(NarrowedFrame {
        frame,
        storage,
        categories,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RawTable {
        let rows = (0..6)
            .map(|idx| {
                vec![
                    RawCell::text(if idx % 2 == 0 { "大包" } else { "小包" }),
                    RawCell::text(format!("A{idx:02}")),
                    RawCell::Number(f64::from(idx) * 10.0),
                    RawCell::text(format!("{}.5", idx)),
                    RawCell::Number(6_212_345_678_901.0 + f64::from(idx)),
                ]
            })
            .collect();
        RawTable::new(
            vec![
                "包厢类型".into(),
                "包厢名称".into(),
                "消费时长".into(),
                "实收金额".into(),
                "会员卡号".into(),
            ],
            rows,
        )
    }

    #[test]
    fn test_storage_decisions() {
        let narrowed = narrow_table(&table()).unwrap();
        let kinds: Vec<ColumnStorage> = narrowed.storage.iter().map(|(_, kind)| *kind).collect();
        assert_eq!(
            kinds,
            vec![
                ColumnStorage::Category { levels: 2 },
                ColumnStorage::Text,
                ColumnStorage::Int32,
                ColumnStorage::Float32,
                ColumnStorage::Int64,
            ]
        );
        assert_eq!(narrowed.categories["包厢类型"], vec!["大包", "小包"]);
        assert_eq!(narrowed.frame.height(), 6);
        assert_eq!(narrowed.frame.column("消费时长").unwrap().dtype(), &DataType::Int32);
        assert!(narrowed.estimated_size() > 0);
    }

    #[test]
    fn test_empty_table() {
        let narrowed = narrow_table(&RawTable::default()).unwrap();
        assert_eq!(narrowed.frame.width(), 0);
    }
}
