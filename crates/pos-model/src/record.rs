//! Canonical row records produced by the pipeline.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::value::{parse_amount, round_cents};

/// Record key holding the per-row side-channel entry.
pub const SIDE_CHANNEL_KEY: &str = "extra_info";

/// Per-row bucket of dynamic payment amounts keyed by derived field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SideChannelEntry(BTreeMap<String, f64>);

impl SideChannelEntry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an amount to a field, summing repeated contributions.
    pub fn add(&mut self, field: impl Into<String>, amount: f64) {
        *self.0.entry(field.into()).or_insert(0.0) += amount;
    }

    pub fn get(&self, field: &str) -> Option<f64> {
        self.0.get(field).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.0.iter().map(|(key, value)| (key.as_str(), *value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.keys().map(String::as_str)
    }

    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Applies `f` to every amount in place.
    pub fn map_amounts(&mut self, f: impl Fn(f64) -> f64) {
        for value in self.0.values_mut() {
            *value = f(*value);
        }
    }
}

/// A typed canonical value.
///
/// Serialized untagged so that a record is a plain JSON object. Variant order
/// matters for deserialization: dates are tried before free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CanonicalValue {
    Null,
    Integer(i64),
    Number(f64),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Text(String),
    SideChannel(SideChannelEntry),
}

impl CanonicalValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(value) => Some(*value as f64),
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Self::DateTime(dt) => Some(*dt),
            Self::Date(date) => date.and_hms_opt(0, 0, 0),
            _ => None,
        }
    }
}

/// One output row: canonical field name to typed value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalRecord(BTreeMap<String, CanonicalValue>);

impl CanonicalRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, value: CanonicalValue) {
        self.0.insert(field.into(), value);
    }

    pub fn get(&self, field: &str) -> Option<&CanonicalValue> {
        self.0.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Numeric value of a field. Text is read as currency; missing and
    /// unreadable fields read as 0.
    pub fn amount(&self, field: &str) -> f64 {
        match self.get(field) {
            Some(CanonicalValue::Text(text)) => parse_amount(text).map_or(0.0, round_cents),
            Some(value) => value.as_f64().unwrap_or(0.0),
            None => 0.0,
        }
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(CanonicalValue::as_str)
    }

    pub fn datetime(&self, field: &str) -> Option<NaiveDateTime> {
        self.get(field).and_then(CanonicalValue::as_datetime)
    }

    pub fn side_channel(&self) -> Option<&SideChannelEntry> {
        match self.get(SIDE_CHANNEL_KEY) {
            Some(CanonicalValue::SideChannel(entry)) => Some(entry),
            _ => None,
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &CanonicalValue)> + '_ {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_reads_currency_text() {
        let mut record = CanonicalRecord::new();
        record.insert("actual_amount", CanonicalValue::Text("¥1,200.50".to_string()));
        record.insert("remark", CanonicalValue::Text("待定".to_string()));
        record.insert("booking_qty", CanonicalValue::Integer(3));
        assert_eq!(record.amount("actual_amount"), 1200.5);
        assert_eq!(record.amount("remark"), 0.0);
        assert_eq!(record.amount("booking_qty"), 3.0);
        assert_eq!(record.amount("missing"), 0.0);
    }

    #[test]
    fn test_side_channel_sums_repeated_fields() {
        let mut entry = SideChannelEntry::new();
        entry.add("pay_xiaohongshu", 10.0);
        entry.add("pay_xiaohongshu", 5.5);
        assert_eq!(entry.get("pay_xiaohongshu"), Some(15.5));
        assert_eq!(entry.total(), 15.5);
    }

    #[test]
    fn test_record_serializes_as_plain_map() {
        let mut record = CanonicalRecord::new();
        record.insert("actual_amount", CanonicalValue::Number(100.5));
        record.insert("booking_qty", CanonicalValue::Integer(3));
        record.insert(
            "biz_date",
            CanonicalValue::Date(NaiveDate::from_ymd_opt(2025, 12, 1).unwrap()),
        );
        record.insert(SIDE_CHANNEL_KEY, CanonicalValue::SideChannel(SideChannelEntry::new()));
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"actual_amount":100.5,"biz_date":"2025-12-01","booking_qty":3,"extra_info":{}}"#
        );
    }

    #[test]
    fn test_record_round_trip_keeps_types() {
        let mut record = CanonicalRecord::new();
        record.insert("actual_amount", CanonicalValue::Number(100.0));
        record.insert(
            "open_time",
            CanonicalValue::DateTime(
                NaiveDate::from_ymd_opt(2025, 1, 2)
                    .unwrap()
                    .and_hms_opt(21, 30, 0)
                    .unwrap(),
            ),
        );
        record.insert("room_no", CanonicalValue::Text("A01".into()));
        let json = serde_json::to_string(&record).unwrap();
        let back: CanonicalRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
        assert_eq!(back.amount("actual_amount"), 100.0);
        assert_eq!(back.amount("missing"), 0.0);
    }
}
