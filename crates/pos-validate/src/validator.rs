use tracing::debug;

use pos_model::{ReportProfile, RuleKind, ValidationIssue};
use pos_transform::CoercedTable;

use crate::checks::{balance, bill, cost_profit, temporal};

/// Runs the business rules of one report type over coerced rows.
///
/// Stateless: the same rows always give the same issues, in rule order and
/// then row order.
#[derive(Debug, Clone, Copy)]
pub struct BusinessRuleValidator {
    profile: &'static ReportProfile,
    tolerance: f64,
}

impl BusinessRuleValidator {
    pub fn new(profile: &'static ReportProfile, tolerance: f64) -> Self {
        Self { profile, tolerance }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn check_rule(&self, rule: &RuleKind, table: &CoercedTable) -> Vec<ValidationIssue> {
        match rule {
            RuleKind::Balance => balance::check(table, self.tolerance),
            RuleKind::BillConstruction(bill_rule) => bill::check(table, bill_rule, self.tolerance),
            RuleKind::CostProfit => cost_profit::check(table, self.tolerance),
            RuleKind::TemporalOrder { start, end } => temporal::check(table, start, end),
        }
    }

    pub fn validate(&self, table: &CoercedTable) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        for rule in self.profile.rules {
            let found = self.check_rule(rule, table);
            debug!(rule = rule.label(), issues = found.len(), "rule checked");
            issues.extend(found);
        }
        issues
    }
}
