//! Validation issues and the per-run issue log.
//!
//! Every non-fatal problem found while cleaning a file becomes a
//! [`ValidationIssue`]. Stages never share a buffer: each run creates one
//! [`IssueLog`] and threads it by `&mut` through mapping, packing, coercion and
//! validation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Row index used for issues that concern the whole file.
pub const FILE_LEVEL_ROW: i64 = -1;

/// What kind of problem an issue reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind {
    /// Undecodable or unreadable input.
    Parse,
    /// Header row or business date could not be established.
    Header,
    /// A single cell failed coercion; a default was applied.
    Data,
    /// A business invariant does not hold for a row.
    Logic,
    /// Non-blocking anomaly such as a fuzzy rename or a date fallback.
    Warning,
}

impl IssueKind {
    pub fn default_severity(self) -> Severity {
        match self {
            Self::Warning => Severity::Warning,
            Self::Parse | Self::Header | Self::Data | Self::Logic => Severity::Error,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Parse => "parse",
            Self::Header => "header",
            Self::Data => "data",
            Self::Logic => "logic",
            Self::Warning => "warning",
        }
    }
}

/// Issue severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Marks the file invalid.
    Error,
    /// Recorded for review, never affects validity.
    Warning,
}

impl Severity {
    /// Parse severity from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "error" => Some(Self::Error),
            "warning" => Some(Self::Warning),
            _ => None,
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Error => "Error",
            Self::Warning => "Warning",
        }
    }
}

/// A single recorded problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Global data row index, or [`FILE_LEVEL_ROW`].
    pub row_index: i64,
    pub column: String,
    pub message: String,
    pub kind: IssueKind,
    pub severity: Severity,
    /// Values involved in the problem, for audit.
    #[serde(default)]
    pub raw_snapshot: BTreeMap<String, Value>,
}

impl ValidationIssue {
    pub fn new(
        kind: IssueKind,
        row_index: i64,
        column: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            row_index,
            column: column.into(),
            message: message.into(),
            kind,
            severity: kind.default_severity(),
            raw_snapshot: BTreeMap::new(),
        }
    }

    /// Adds one snapshot value.
    #[must_use]
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.raw_snapshot.insert(key.into(), value.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn is_file_level(&self) -> bool {
        self.row_index == FILE_LEVEL_ROW
    }

    /// Shifts a row-scoped issue by `offset`; file-level issues are unchanged.
    #[must_use]
    pub fn renumbered(mut self, offset: i64) -> Self {
        if !self.is_file_level() {
            self.row_index += offset;
        }
        self
    }
}

/// Ordered issue buffer owned by one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct IssueLog {
    issues: Vec<ValidationIssue>,
}

impl IssueLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    pub fn extend(&mut self, issues: impl IntoIterator<Item = ValidationIssue>) {
        self.issues.extend(issues);
    }

    /// Records a non-blocking warning.
    pub fn warn(&mut self, row_index: i64, column: impl Into<String>, message: impl Into<String>) {
        self.push(ValidationIssue::new(
            IssueKind::Warning,
            row_index,
            column,
            message,
        ));
    }

    /// Records a single-cell coercion failure.
    pub fn data_error(
        &mut self,
        row_index: i64,
        column: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.push(ValidationIssue::new(IssueKind::Data, row_index, column, message));
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.issues.iter().filter(|issue| issue.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues.len() - self.error_count()
    }

    pub fn into_vec(self) -> Vec<ValidationIssue> {
        self.issues
    }
}
