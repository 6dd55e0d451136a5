//! Realized amount against income payments.
//!
//! `actual_amount` must equal the sum of the income payment columns present
//! plus every side-channel amount. Dynamic payment channels count as income
//! here whatever their name.

use pos_model::payment::INCOME_PAYMENT_FIELDS;
use pos_model::value::round_cents;
use pos_model::{CanonicalRecord, SideChannelEntry, ValidationIssue};
use pos_transform::CoercedTable;

use super::{ACTUAL_AMOUNT, difference, logic_error};

/// Side-channel amounts counted as income: all of them.
pub fn side_channel_income(entry: &SideChannelEntry) -> f64 {
    entry.total()
}

fn payment_sum(record: &CanonicalRecord, income_fields: &[&str]) -> f64 {
    let fixed: f64 = income_fields.iter().map(|field| record.amount(field)).sum();
    let dynamic = record.side_channel().map_or(0.0, side_channel_income);
    round_cents(fixed + dynamic)
}

pub fn check(table: &CoercedTable, tolerance: f64) -> Vec<ValidationIssue> {
    if !table.has_field(ACTUAL_AMOUNT) {
        return Vec::new();
    }
    let income_fields: Vec<&str> = INCOME_PAYMENT_FIELDS
        .iter()
        .copied()
        .filter(|field| table.has_field(field))
        .collect();

    let mut issues = Vec::new();
    for (row, record) in table.records.iter().enumerate() {
        let actual = record.amount(ACTUAL_AMOUNT);
        let pay_sum = payment_sum(record, &income_fields);
        let diff = difference(actual, pay_sum);
        if diff > tolerance {
            issues.push(
                logic_error(
                    row,
                    ACTUAL_AMOUNT,
                    format!(
                        "actual amount {actual:.2} does not balance with payments {pay_sum:.2} (difference {diff:.2})"
                    ),
                )
                .with_value("actual_amount", actual)
                .with_value("pay_sum", pay_sum)
                .with_value("difference", diff),
            );
        }
    }
    issues
}
