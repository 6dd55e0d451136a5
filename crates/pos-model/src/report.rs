//! Validation report and the file summary attached to it.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::issue::{IssueKind, ValidationIssue};
use crate::payment::{PaymentCategory, PaymentSource};
use crate::report_type::ReportType;

/// Where the business date of the rows came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusinessDateSource {
    /// A business-date column in the source.
    Column,
    /// Per-row transaction timestamps.
    Timestamp,
    /// A date embedded in the filename.
    Filename,
    /// A date found while scanning for the header, or supplied by the caller.
    Detected,
}

impl BusinessDateSource {
    pub fn label(self) -> &'static str {
        match self {
            Self::Column => "column",
            Self::Timestamp => "timestamp",
            Self::Filename => "filename",
            Self::Detected => "detected",
        }
    }
}

/// One payment method seen in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethodMeta {
    pub code: String,
    pub name: String,
    pub is_core: bool,
    pub category: PaymentCategory,
    pub source: PaymentSource,
    pub field_name: String,
    pub sort_order: i32,
}

/// Extracted file metadata and counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub report_type: ReportType,
    pub total_rows: usize,
    pub error_count: usize,
    pub warning_count: usize,
    pub fuzzy_match_count: usize,
    pub store_name: Option<String>,
    pub store_names: Vec<String>,
    pub detected_date: Option<NaiveDate>,
    pub business_date_source: Option<BusinessDateSource>,
    pub payment_methods: Vec<PaymentMethodMeta>,
}

impl ReportSummary {
    pub fn new(report_type: ReportType) -> Self {
        Self {
            report_type,
            total_rows: 0,
            error_count: 0,
            warning_count: 0,
            fuzzy_match_count: 0,
            store_name: None,
            store_names: Vec::new(),
            detected_date: None,
            business_date_source: None,
            payment_methods: Vec::new(),
        }
    }

    fn absorb(&mut self, other: ReportSummary) {
        self.total_rows += other.total_rows;
        self.error_count += other.error_count;
        self.warning_count += other.warning_count;
        self.fuzzy_match_count += other.fuzzy_match_count;
        if self.store_name.is_none() {
            self.store_name = other.store_name;
        }
        for name in other.store_names {
            if !self.store_names.contains(&name) {
                self.store_names.push(name);
            }
        }
        self.store_names.sort();
        self.detected_date = self.detected_date.or(other.detected_date);
        self.business_date_source = self.business_date_source.or(other.business_date_source);
        let mut by_code: BTreeMap<String, PaymentMethodMeta> = self
            .payment_methods
            .drain(..)
            .map(|meta| (meta.code.clone(), meta))
            .collect();
        for meta in other.payment_methods {
            match by_code.get(&meta.code) {
                Some(existing) if existing.is_core || !meta.is_core => {}
                _ => {
                    by_code.insert(meta.code.clone(), meta);
                }
            }
        }
        self.payment_methods = by_code.into_values().collect();
        sort_payment_methods(&mut self.payment_methods);
    }
}

/// Orders payment methods core first, then by sort order and code.
pub fn sort_payment_methods(methods: &mut [PaymentMethodMeta]) {
    methods.sort_by(|a, b| {
        (!a.is_core, a.sort_order, &a.code).cmp(&(!b.is_core, b.sort_order, &b.code))
    });
}

/// Outcome of validating one file or chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub total_rows: usize,
    pub error_count: usize,
    pub issues: Vec<ValidationIssue>,
    pub summary: ReportSummary,
}

impl ValidationReport {
    /// Builds a report, deriving validity and counts from the issues.
    pub fn new(issues: Vec<ValidationIssue>, total_rows: usize, mut summary: ReportSummary) -> Self {
        let error_count = issues.iter().filter(|issue| issue.is_error()).count();
        summary.total_rows = total_rows;
        summary.error_count = error_count;
        summary.warning_count = issues.len() - error_count;
        summary.fuzzy_match_count = issues
            .iter()
            .filter(|issue| issue.kind == IssueKind::Warning && issue.raw_snapshot.contains_key("similarity"))
            .count();
        Self {
            is_valid: error_count == 0,
            total_rows,
            error_count,
            issues,
            summary,
        }
    }

    pub fn warning_count(&self) -> usize {
        self.issues.len() - self.error_count
    }

    /// Shifts every row-scoped issue by `offset`.
    #[must_use]
    pub fn renumbered(mut self, offset: i64) -> Self {
        self.issues = self
            .issues
            .into_iter()
            .map(|issue| issue.renumbered(offset))
            .collect();
        self
    }

    /// Appends another report, as produced by the next streaming chunk.
    pub fn merge(&mut self, other: ValidationReport) {
        self.is_valid = self.is_valid && other.is_valid;
        self.total_rows += other.total_rows;
        self.error_count += other.error_count;
        self.issues.extend(other.issues);
        self.summary.absorb(other.summary);
    }
}
