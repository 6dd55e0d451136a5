//! Bill construction: gross minus deductions minus equity payments.
//!
//! The member payment is counted once. When any principal/gift breakdown
//! value is non-zero the breakdown is used and the aggregate ignored.

use std::collections::BTreeMap;

use pos_model::payment::{EQUITY_PAYMENT_FIELDS, MEMBER_AGGREGATE_FIELD, MEMBER_BREAKDOWN_FIELDS};
use pos_model::value::round_cents;
use pos_model::{BillRule, CanonicalRecord, PaymentCategory, ValidationIssue};
use pos_transform::CoercedTable;

use super::{ACTUAL_AMOUNT, difference, logic_error};

/// Equity payments of one row, by field, and their sum.
fn equity_payments(
    record: &CanonicalRecord,
    breakdown_fields: &[&str],
    has_member_aggregate: bool,
    other_equity_fields: &[&str],
) -> BTreeMap<String, f64> {
    let mut payments = BTreeMap::new();
    let breakdown: Vec<(&str, f64)> = breakdown_fields
        .iter()
        .map(|field| (*field, record.amount(field)))
        .filter(|(_, amount)| *amount != 0.0)
        .collect();
    if !breakdown.is_empty() {
        for (field, amount) in breakdown {
            payments.insert(field.to_string(), amount);
        }
    } else if has_member_aggregate {
        let member = record.amount(MEMBER_AGGREGATE_FIELD);
        if member != 0.0 {
            payments.insert(MEMBER_AGGREGATE_FIELD.to_string(), member);
        }
    }
    for field in other_equity_fields {
        let amount = record.amount(field);
        if amount != 0.0 {
            payments.insert((*field).to_string(), amount);
        }
    }
    if let Some(entry) = record.side_channel() {
        for (field, amount) in entry.iter() {
            if amount != 0.0 && PaymentCategory::classify(field) == PaymentCategory::Equity {
                *payments.entry(field.to_string()).or_insert(0.0) += amount;
            }
        }
    }
    payments
}

pub fn check(table: &CoercedTable, rule: &BillRule, tolerance: f64) -> Vec<ValidationIssue> {
    if !table.has_field(ACTUAL_AMOUNT) || !table.has_field(rule.gross_field) {
        return Vec::new();
    }
    let present = |fields: &[&'static str]| -> Vec<&'static str> {
        fields
            .iter()
            .copied()
            .filter(|field| table.has_field(field))
            .collect()
    };
    let deduction_fields = present(rule.deduction_fields);
    let breakdown_fields = present(MEMBER_BREAKDOWN_FIELDS);
    let has_member_aggregate = table.has_field(MEMBER_AGGREGATE_FIELD);
    let other_equity_fields: Vec<&str> = present(EQUITY_PAYMENT_FIELDS)
        .into_iter()
        .filter(|field| {
            *field != MEMBER_AGGREGATE_FIELD && !MEMBER_BREAKDOWN_FIELDS.contains(field)
        })
        .collect();

    let mut issues = Vec::new();
    for (row, record) in table.records.iter().enumerate() {
        let actual = record.amount(ACTUAL_AMOUNT);
        let gross = record.amount(rule.gross_field);
        let deductions: Vec<(&str, f64)> = deduction_fields
            .iter()
            .map(|field| (*field, record.amount(field)))
            .collect();
        let total_deduction = round_cents(deductions.iter().map(|(_, amount)| amount).sum());
        let equity = equity_payments(
            record,
            &breakdown_fields,
            has_member_aggregate,
            &other_equity_fields,
        );
        let equity_sum = round_cents(equity.values().sum());
        let expected = round_cents(gross - total_deduction - equity_sum);
        let diff = difference(actual, expected);
        if diff <= tolerance {
            continue;
        }
        let mut issue = logic_error(
            row,
            ACTUAL_AMOUNT,
            format!(
                "actual amount {actual:.2} != {} {gross:.2} - deductions {total_deduction:.2} - equity payments {equity_sum:.2} = {expected:.2} (difference {diff:.2})",
                rule.gross_field
            ),
        )
        .with_value("actual_amount", actual)
        .with_value(rule.gross_field, gross)
        .with_value("total_deduction", total_deduction)
        .with_value("equity_payment_sum", equity_sum)
        .with_value("expected_actual", expected)
        .with_value("difference", diff);
        for (field, amount) in deductions {
            issue = issue.with_value(field, amount);
        }
        for (field, amount) in equity {
            issue = issue.with_value(field, amount);
        }
        issues.push(issue);
    }
    issues
}
