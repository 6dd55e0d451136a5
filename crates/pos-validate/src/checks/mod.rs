//! Business-rule check modules.
//!
//! Each module checks one identity row by row and returns its issues. A check
//! whose operand columns are missing from the table is skipped.

pub mod balance;
pub mod bill;
pub mod cost_profit;
pub mod temporal;

use pos_model::value::round_cents;
use pos_model::{IssueKind, ValidationIssue};

/// Canonical field holding the realized amount of a row.
pub const ACTUAL_AMOUNT: &str = "actual_amount";

/// Absolute difference in cents precision, compared against the tolerance.
pub(crate) fn difference(a: f64, b: f64) -> f64 {
    round_cents((a - b).abs())
}

pub(crate) fn logic_error(row: usize, column: &str, message: String) -> ValidationIssue {
    ValidationIssue::new(IssueKind::Logic, row as i64, column, message)
}
