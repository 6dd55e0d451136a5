//! Start time not after end time.
//!
//! Rows where either time is missing or unparseable are not judged.

use pos_model::ValidationIssue;
use pos_transform::CoercedTable;

use super::logic_error;

pub fn check(table: &CoercedTable, start: &str, end: &str) -> Vec<ValidationIssue> {
    if !table.has_field(start) || !table.has_field(end) {
        return Vec::new();
    }
    table
        .records
        .iter()
        .enumerate()
        .filter_map(|(row, record)| {
            let (start_at, end_at) = (record.datetime(start)?, record.datetime(end)?);
            (start_at > end_at).then(|| {
                logic_error(
                    row,
                    end,
                    format!("{start} {start_at} is after {end} {end_at}"),
                )
                .with_value(start, start_at.format("%Y-%m-%dT%H:%M:%S").to_string())
                .with_value(end, end_at.format("%Y-%m-%dT%H:%M:%S").to_string())
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pos_model::{CanonicalRecord, CanonicalValue};

    fn at(hour: u32) -> CanonicalValue {
        CanonicalValue::DateTime(
            NaiveDate::from_ymd_opt(2025, 12, 1)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
        )
    }

    fn row(open: CanonicalValue, close: CanonicalValue) -> CanonicalRecord {
        let mut record = CanonicalRecord::new();
        record.insert("open_time", open);
        record.insert("close_time", close);
        record
    }

    #[test]
    fn test_reversed_times_flag_end_column() {
        let table = CoercedTable {
            records: vec![
                row(at(20), at(23)),
                row(at(23), at(20)),
                row(CanonicalValue::Null, at(1)),
                row(at(22), at(22)),
            ],
            fields: ["open_time".to_string(), "close_time".to_string()].into(),
        };
        let issues = check(&table, "open_time", "close_time");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].row_index, 1);
        assert_eq!(issues[0].column, "close_time");
        assert_eq!(issues[0].raw_snapshot["open_time"], "2025-12-01T23:00:00");
    }
}
