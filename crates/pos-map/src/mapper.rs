//! Source label to canonical field mapping.
//!
//! Mapping runs in two passes over the table's columns:
//!
//! 1. Exact: labels found verbatim in the profile dictionary.
//! 2. Fuzzy: every remaining label is compared against the dictionary keys
//!    whose target is still unused. The best score wins, the earliest key on
//!    ties, and it is accepted only above the threshold. Each accepted fuzzy
//!    match is recorded as a warning.
//!
//! A target receives at most one column. Columns left over are dropped with
//! a warning.

use std::collections::BTreeSet;

use rapidfuzz::distance::indel;
use serde::Serialize;
use tracing::{debug, warn};

use pos_model::{FILE_LEVEL_ROW, IssueKind, IssueLog, RawTable, ReportProfile, ValidationIssue};

/// How a column was matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Exact,
    Fuzzy,
}

/// One accepted column mapping.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnMatch {
    /// Label as it appears in the source.
    pub source: String,
    /// Dictionary key the label was matched to.
    pub key: &'static str,
    pub target: &'static str,
    pub similarity: f64,
    pub kind: MatchKind,
}

/// Outcome of mapping one table.
#[derive(Debug, Clone, Default)]
pub struct MappedTable {
    /// The input rows under canonical field names, unmatched columns removed.
    pub table: RawTable,
    pub matches: Vec<ColumnMatch>,
    pub dropped: Vec<String>,
}

impl MappedTable {
    pub fn fuzzy_matches(&self) -> impl Iterator<Item = &ColumnMatch> + '_ {
        self.matches
            .iter()
            .filter(|matched| matched.kind == MatchKind::Fuzzy)
    }
}

/// Trimmed, lowercased form used for similarity scoring.
pub fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase()
}

/// Normalized similarity of two labels in `[0, 1]`.
pub fn label_similarity(a: &str, b: &str) -> f64 {
    let a = normalize_label(a);
    let b = normalize_label(b);
    indel::normalized_similarity(a.chars(), b.chars())
}

/// Maps source columns of one report type onto canonical fields.
#[derive(Debug, Clone, Copy)]
pub struct FieldMapper {
    profile: &'static ReportProfile,
    threshold: f64,
}

impl FieldMapper {
    pub fn new(profile: &'static ReportProfile, threshold: f64) -> Self {
        Self { profile, threshold }
    }

    pub fn profile(&self) -> &'static ReportProfile {
        self.profile
    }

    /// Best unused dictionary key for `label`, if it clears the threshold.
    fn best_fuzzy_key(
        &self,
        label: &str,
        used_targets: &BTreeSet<&'static str>,
        used_keys: &BTreeSet<&'static str>,
    ) -> Option<(&'static str, &'static str, f64)> {
        let mut best: Option<(&'static str, &'static str, f64)> = None;
        for &(key, target) in self.profile.mapping {
            if used_targets.contains(&target) || used_keys.contains(&key) {
                continue;
            }
            let similarity = label_similarity(label, key);
            if similarity > self.threshold && best.is_none_or(|(_, _, score)| similarity > score) {
                best = Some((key, target, similarity));
            }
        }
        best
    }

    /// Decides the mapping for a list of labels, recording issues.
    pub fn plan(&self, labels: &[String], issues: &mut IssueLog) -> Vec<Option<ColumnMatch>> {
        let mut used_targets: BTreeSet<&'static str> = BTreeSet::new();
        let mut used_keys: BTreeSet<&'static str> = BTreeSet::new();
        let mut plan: Vec<Option<ColumnMatch>> = Vec::with_capacity(labels.len());

        for label in labels {
            let exact = self
                .profile
                .mapping
                .iter()
                .find(|(key, _)| *key == label.as_str())
                .filter(|(_, target)| !used_targets.contains(target));
            plan.push(exact.map(|&(key, target)| {
                used_targets.insert(target);
                used_keys.insert(key);
                ColumnMatch {
                    source: label.clone(),
                    key,
                    target,
                    similarity: 1.0,
                    kind: MatchKind::Exact,
                }
            }));
        }

        for (label, slot) in labels.iter().zip(plan.iter_mut()) {
            if slot.is_some() {
                continue;
            }
            let Some((key, target, similarity)) =
                self.best_fuzzy_key(label, &used_targets, &used_keys)
            else {
                continue;
            };
            used_targets.insert(target);
            used_keys.insert(key);
            warn!(source = %label, key, target, similarity, "fuzzy column match");
            issues.push(
                ValidationIssue::new(
                    IssueKind::Warning,
                    FILE_LEVEL_ROW,
                    label.clone(),
                    format!(
                        "column '{label}' matched to '{key}' (field {target}, similarity {:.2}%)",
                        similarity * 100.0
                    ),
                )
                .with_value("source", label.clone())
                .with_value("key", key)
                .with_value("target", target)
                .with_value("similarity", (similarity * 10_000.0).round() / 10_000.0),
            );
            *slot = Some(ColumnMatch {
                source: label.clone(),
                key,
                target,
                similarity,
                kind: MatchKind::Fuzzy,
            });
        }

        for (label, slot) in labels.iter().zip(&plan) {
            if slot.is_none() {
                issues.push(
                    ValidationIssue::new(
                        IssueKind::Warning,
                        FILE_LEVEL_ROW,
                        label.clone(),
                        format!("column '{label}' is not a known field and was dropped"),
                    )
                    .with_value("source", label.clone()),
                );
            }
        }
        plan
    }

    /// Renames mapped columns to their canonical fields and drops the rest.
    pub fn map_table(&self, mut table: RawTable, issues: &mut IssueLog) -> MappedTable {
        let plan = self.plan(&table.columns, issues);
        let dropped: Vec<String> = table
            .columns
            .iter()
            .zip(&plan)
            .filter(|(_, slot)| slot.is_none())
            .map(|(label, _)| label.clone())
            .collect();
        table.retain_columns(|idx, _| plan[idx].is_some());
        let matches: Vec<ColumnMatch> = plan.into_iter().flatten().collect();
        table.columns = matches
            .iter()
            .map(|matched| matched.target.to_string())
            .collect();
        debug!(
            report_type = %self.profile.report_type,
            mapped = matches.len(),
            dropped = dropped.len(),
            "mapped columns"
        );
        MappedTable {
            table,
            matches,
            dropped,
        }
    }
}
