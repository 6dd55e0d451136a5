//! Tests for packing followed by mapping, as the pipeline runs them.

use proptest::prelude::*;

use pos_map::{FieldMapper, label_similarity, pack_dynamic_columns};
use pos_model::{IssueLog, RawCell, RawTable, ReportType};

fn booking_table() -> RawTable {
    RawTable::new(
        vec![
            "部门".into(),
            "订位人".into(),
            "支付方式_微信支付".into(),
            "支付方式_小红书".into(),
            "实收金额 ".into(),
            "备用列".into(),
        ],
        vec![
            vec![
                RawCell::text("营销部"),
                RawCell::text("张三"),
                RawCell::Number(60.0),
                RawCell::Number(40.0),
                RawCell::Number(100.0),
                RawCell::text("x"),
            ],
            vec![
                RawCell::text("营销部"),
                RawCell::text("李四"),
                RawCell::Number(80.0),
                RawCell::Number(0.0),
                RawCell::Number(80.0),
                RawCell::Blank,
            ],
        ],
    )
}

#[test]
fn dynamic_columns_are_packed_before_mapping() {
    let profile = ReportType::Booking.profile();
    let mut table = booking_table();
    let packed = pack_dynamic_columns(&mut table, profile);

    let mut issues = IssueLog::new();
    let mapped = FieldMapper::new(profile, 0.85).map_table(table, &mut issues);

    assert_eq!(
        mapped.table.columns,
        vec!["department", "employee_name", "pay_wechat", "actual_amount"]
    );
    assert_eq!(mapped.dropped, vec!["备用列"]);
    assert_eq!(mapped.fuzzy_matches().count(), 1);
    assert_eq!(issues.len(), 2);
    assert_eq!(issues.error_count(), 0);

    assert_eq!(packed.entries.len(), 2);
    assert_eq!(packed.entries[0].get("pay_xiaohongshu"), Some(40.0));
    assert!(packed.entries[1].is_empty());
}

#[test]
fn every_dynamic_cell_zero_gives_empty_entries() {
    let profile = ReportType::Room.profile();
    let mut table = RawTable::new(
        vec!["包厢名称".into(), "支付方式_快手".into()],
        vec![
            vec![RawCell::text("A01"), RawCell::Number(0.0)],
            vec![RawCell::text("A02"), RawCell::text("0.00")],
        ],
    );
    let packed = pack_dynamic_columns(&mut table, profile);
    assert_eq!(packed.fields(), vec!["pay_kuaishou"]);
    assert!(packed.entries.iter().all(|entry| entry.is_empty()));
}

proptest! {
    #[test]
    fn surrounding_whitespace_scores_full_similarity(label in "[\u{4e00}-\u{4e80}]{1,6}", pad in " {0,3}") {
        let padded = format!("{pad}{label}{pad}");
        prop_assert!((label_similarity(&padded, &label) - 1.0).abs() < f64::EPSILON);
    }
}
