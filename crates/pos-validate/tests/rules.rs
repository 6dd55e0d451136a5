//! Business rules over coerced booking and room rows.

use proptest::prelude::*;

use pos_model::{IssueKind, IssueLog, RawCell, RawTable, ReportType, SideChannelEntry};
use pos_transform::{CoercedTable, TypeCoercer};
use pos_validate::BusinessRuleValidator;

fn coerce(report_type: ReportType, columns: &[&str], values: &[f64]) -> CoercedTable {
    let table = RawTable::new(
        columns.iter().map(|c| (*c).to_string()).collect(),
        vec![values.iter().map(|v| RawCell::Number(*v)).collect()],
    );
    let mut issues = IssueLog::new();
    let coerced = TypeCoercer::new(report_type.profile()).coerce(&table, Vec::new(), &mut issues);
    assert!(issues.is_empty());
    coerced
}

fn booking(actual: f64, wechat: f64, cash: f64) -> CoercedTable {
    coerce(
        ReportType::Booking,
        &["actual_amount", "pay_wechat", "pay_cash"],
        &[actual, wechat, cash],
    )
}

#[test]
fn booking_balance_within_tolerance_passes() {
    let validator = BusinessRuleValidator::new(ReportType::Booking.profile(), 1.0);
    assert!(validator.validate(&booking(100.0, 60.0, 39.5)).is_empty());
}

#[test]
fn booking_balance_violation_reports_operands() {
    let validator = BusinessRuleValidator::new(ReportType::Booking.profile(), 1.0);
    let issues = validator.validate(&booking(100.0, 60.0, 30.0));
    assert_eq!(issues.len(), 1);
    let issue = &issues[0];
    assert_eq!(issue.kind, IssueKind::Logic);
    assert!(issue.is_error());
    assert_eq!(issue.row_index, 0);
    assert_eq!(issue.column, "actual_amount");
    assert_eq!(issue.raw_snapshot["actual_amount"], 100.0);
    assert_eq!(issue.raw_snapshot["pay_sum"], 90.0);
    assert_eq!(issue.raw_snapshot["difference"], 10.0);
}

#[test]
fn balance_issue_serializes_for_audit() {
    let validator = BusinessRuleValidator::new(ReportType::Booking.profile(), 1.0);
    let issues = validator.validate(&booking(100.0, 60.0, 30.0));
    let json = serde_json::to_string_pretty(&issues[0]).unwrap();
    insta::assert_snapshot!(json, @r#"
    {
      "row_index": 0,
      "column": "actual_amount",
      "message": "actual amount 100.00 does not balance with payments 90.00 (difference 10.00)",
      "kind": "logic",
      "severity": "error",
      "raw_snapshot": {
        "actual_amount": 100.0,
        "difference": 10.0,
        "pay_sum": 90.0
      }
    }
    "#);
}

#[test]
fn side_channel_amounts_count_toward_balance() {
    let table = RawTable::new(
        vec!["actual_amount".into(), "pay_wechat".into()],
        vec![vec![RawCell::Number(100.0), RawCell::Number(60.0)]],
    );
    let mut entry = SideChannelEntry::new();
    entry.add("pay_xiaohongshu", 40.0);
    let mut issues = IssueLog::new();
    let coerced = TypeCoercer::new(ReportType::Booking.profile()).coerce(&table, vec![entry], &mut issues);
    let validator = BusinessRuleValidator::new(ReportType::Booking.profile(), 1.0);
    assert!(validator.validate(&coerced).is_empty());
}

#[test]
fn consistent_room_bill_passes_both_identities() {
    let table = coerce(
        ReportType::Room,
        &[
            "actual_amount",
            "bill_total",
            "room_discount",
            "pay_wechat",
            "pay_member",
            "pay_member_principal",
            "pay_member_gift",
        ],
        &[300.0, 500.0, 50.0, 300.0, 150.0, 120.0, 30.0],
    );
    let validator = BusinessRuleValidator::new(ReportType::Room.profile(), 1.0);
    assert!(validator.validate(&table).is_empty());
}

#[test]
fn room_bill_mismatch_reports_expected_amount() {
    let table = coerce(
        ReportType::Room,
        &["actual_amount", "bill_total", "pay_wechat", "pay_member_principal", "pay_member_gift"],
        &[300.0, 500.0, 300.0, 150.0, 0.0],
    );
    let validator = BusinessRuleValidator::new(ReportType::Room.profile(), 1.0);
    let issues = validator.validate(&table);
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].raw_snapshot["expected_actual"], 350.0);
}

proptest! {
    #[test]
    fn balance_flags_exactly_beyond_tolerance(
        actual_cents in 0i64..1_000_000,
        gap_cents in -500i64..500,
        tolerance_cents in 0i64..300,
    ) {
        let actual = actual_cents as f64 / 100.0;
        let cash = (actual_cents + gap_cents) as f64 / 100.0;
        let tolerance = tolerance_cents as f64 / 100.0;
        let table = booking(actual, 0.0, cash);
        let issues = BusinessRuleValidator::new(ReportType::Booking.profile(), tolerance).validate(&table);
        prop_assert_eq!(issues.len(), usize::from(gap_cents.abs() > tolerance_cents));
    }
}
