//! File-level metadata: dates and store names from filenames, store lists
//! from member-change rows, and the payment methods seen in a file.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use pos_model::payment::{PAYMENT_FIELD_PREFIX, display_name, payment_code, sort_order};
use pos_model::{
    CanonicalRecord, PaymentCategory, PaymentMethodMeta, PaymentSource, sort_payment_methods,
};

static SEPARATED_FILENAME_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(20\d{2})[-._](\d{1,2})[-._](\d{1,2})").expect("valid filename date regex")
});

static COMPACT_FILENAME_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(20\d{2})(\d{2})(\d{2})").expect("valid compact filename date regex")
});

static FULLWIDTH_BRACKET_STORE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"（([^（）]{2,20}?(?:店|KTV))）").expect("valid bracket store regex")
});

static ASCII_BRACKET_STORE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(([^()]{2,20}?(?:店|KTV))\)").expect("valid bracket store regex")
});

static SUFFIX_STORE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\x{4e00}-\x{9fa5}·]{2,12}(?:店|KTV)").expect("valid store suffix regex")
});

static FULLWIDTH_BRACKET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"（([^（）]+)）").expect("valid bracket regex"));

static ASCII_BRACKET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^()]+)\)").expect("valid bracket regex"));

/// Fallback store keywords and the store name each stands for.
pub const STORE_KEYWORDS: &[(&str, &str)] = &[
    ("万象城", "万象城店"),
    ("青年路", "青年路店"),
    ("高新", "高新店"),
    ("曲江", "曲江店"),
];

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

/// First valid calendar date embedded in a filename.
///
/// Separated forms (`2025-12-01`, `2025_12_1`, `2025.12.01`) win over a bare
/// `20251201`.
pub fn date_from_filename(filename: &str) -> Option<NaiveDate> {
    [&*SEPARATED_FILENAME_DATE, &*COMPACT_FILENAME_DATE]
        .iter()
        .find_map(|pattern| {
            pattern
                .captures_iter(filename)
                .find_map(|caps| ymd(&caps[1], &caps[2], &caps[3]))
        })
}

/// Store name embedded in a filename, if any.
pub fn store_from_filename(filename: &str) -> Option<String> {
    let stem = Path::new(filename)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(filename);
    if stem.is_empty() {
        return None;
    }
    for pattern in [&*FULLWIDTH_BRACKET_STORE, &*ASCII_BRACKET_STORE] {
        if let Some(caps) = pattern.captures(stem) {
            let candidate = caps[1].trim();
            if !candidate.is_empty() {
                return Some(candidate.to_string());
            }
        }
    }
    let longest = SUFFIX_STORE
        .find_iter(stem)
        .map(|found| found.as_str())
        .reduce(|best, next| {
            if next.chars().count() > best.chars().count() {
                next
            } else {
                best
            }
        });
    if let Some(name) = longest {
        return Some(name.to_string());
    }
    STORE_KEYWORDS
        .iter()
        .find(|(keyword, _)| stem.contains(keyword))
        .map(|(_, store)| (*store).to_string())
}

/// Bracketed part of a chain store name: `空境KTV（万象城店）` gives `万象城店`.
///
/// Names without brackets are returned trimmed.
pub fn store_from_brackets(name: &str) -> String {
    let name = name.trim();
    for pattern in [&*FULLWIDTH_BRACKET, &*ASCII_BRACKET] {
        if let Some(caps) = pattern.captures(name) {
            let inner = caps[1].trim();
            if !inner.is_empty() {
                return inner.to_string();
            }
        }
    }
    name.to_string()
}

/// Sorted distinct stores named in a text field of the records.
pub fn stores_from_records(records: &[CanonicalRecord], field: &str) -> Vec<String> {
    records
        .iter()
        .filter_map(|record| record.text(field))
        .filter(|value| !value.trim().is_empty())
        .map(store_from_brackets)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Summary store name for a list of stores.
pub fn summarize_stores(stores: &[String]) -> Option<String> {
    match stores {
        [] => None,
        [single] => Some(single.clone()),
        many => Some(format!("多门店 ({}个)", many.len())),
    }
}

fn payment_meta(field: &str, source: PaymentSource) -> Option<PaymentMethodMeta> {
    let code = payment_code(field)?;
    Some(PaymentMethodMeta {
        name: display_name(&code),
        is_core: source == PaymentSource::Fixed,
        category: PaymentCategory::classify(field),
        source,
        field_name: field.to_string(),
        sort_order: sort_order(&code, source),
        code,
    })
}

/// Payment methods present in a file: fixed payment columns plus every
/// side-channel key seen in any row.
///
/// A code seen as a fixed column is never repeated as dynamic.
pub fn collect_payment_methods<S: AsRef<str>>(
    fields: &[S],
    records: &[CanonicalRecord],
) -> Vec<PaymentMethodMeta> {
    let mut by_code: BTreeMap<String, PaymentMethodMeta> = BTreeMap::new();
    for field in fields.iter().map(AsRef::as_ref) {
        if !field.starts_with(PAYMENT_FIELD_PREFIX) {
            continue;
        }
        if let Some(meta) = payment_meta(field, PaymentSource::Fixed) {
            by_code.insert(meta.code.clone(), meta);
        }
    }
    let dynamic: BTreeSet<&str> = records
        .iter()
        .filter_map(CanonicalRecord::side_channel)
        .flat_map(|entry| entry.keys())
        .filter(|key| key.starts_with(PAYMENT_FIELD_PREFIX))
        .collect();
    for field in dynamic {
        if let Some(meta) = payment_meta(field, PaymentSource::Dynamic) {
            by_code.entry(meta.code.clone()).or_insert(meta);
        }
    }
    let mut methods: Vec<PaymentMethodMeta> = by_code.into_values().collect();
    sort_payment_methods(&mut methods);
    methods
}
