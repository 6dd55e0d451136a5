//! Dynamic payment-column packing.
//!
//! Exports grow new payment channels over time (`支付方式_小红书`, ...). Any
//! payment-prefixed column the profile dictionary does not know is melted
//! into a per-row [`SideChannelEntry`] instead of being dropped.

use tracing::debug;

use pos_model::payment::{PAYMENT_FIELD_PREFIX, PAYMENT_LABEL_PREFIX};
use pos_model::value::round_cents;
use pos_model::{RawTable, ReportProfile, SideChannelEntry};

/// Known channel names and their short codes, matched by substring in order.
pub const CHANNEL_SLUGS: &[(&str, &str)] = &[
    ("微信", "wechat"),
    ("支付宝", "alipay"),
    ("现金", "cash"),
    ("会员", "member"),
    ("团购", "groupon"),
    ("抖音", "douyin"),
    ("美团", "meituan"),
    ("高德", "gaode"),
    ("小红书", "xiaohongshu"),
    ("快手", "kuaishou"),
    ("拼多多", "pinduoduo"),
    ("银行卡", "card"),
    ("pos", "pos"),
    ("付呗", "fubei"),
];

/// Field name for a dynamic channel, given the label without its prefix.
pub fn dynamic_field_name(channel: &str) -> String {
    let lower = channel.to_lowercase();
    if let Some((_, slug)) = CHANNEL_SLUGS
        .iter()
        .find(|(name, _)| channel.contains(name) || lower.contains(name))
    {
        return format!("{PAYMENT_FIELD_PREFIX}{slug}");
    }
    if !channel.is_empty()
        && channel
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return format!("{PAYMENT_FIELD_PREFIX}{lower}");
    }
    let slug = channel.split_whitespace().collect::<Vec<_>>().join("_");
    format!("{PAYMENT_FIELD_PREFIX}{slug}")
}

/// True for payment-prefixed labels missing from the profile dictionary.
pub fn is_dynamic_label(label: &str, profile: &ReportProfile) -> bool {
    label.starts_with(PAYMENT_LABEL_PREFIX) && !profile.is_source_label(label)
}

/// A source column packed into the side channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicColumn {
    pub label: String,
    pub field: String,
}

/// Side-channel entries, one per table row, and the columns they came from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackedColumns {
    pub columns: Vec<DynamicColumn>,
    pub entries: Vec<SideChannelEntry>,
}

impl PackedColumns {
    /// Distinct dynamic field names in column order.
    pub fn fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = Vec::new();
        for column in &self.columns {
            if !fields.contains(&column.field.as_str()) {
                fields.push(&column.field);
            }
        }
        fields
    }
}

/// Removes the dynamic columns from `table` and packs their amounts.
///
/// Blank, unparseable and zero cells contribute nothing. Columns that share a
/// field name are summed. Every row gets an entry, empty when it has no
/// dynamic amounts.
pub fn pack_dynamic_columns(table: &mut RawTable, profile: &ReportProfile) -> PackedColumns {
    let mut entries = vec![SideChannelEntry::new(); table.row_count()];
    let mut columns = Vec::new();
    let mut idx = 0;
    while idx < table.column_count() {
        if !is_dynamic_label(&table.columns[idx], profile) {
            idx += 1;
            continue;
        }
        let (label, cells) = table.take_column(idx);
        let channel = label.strip_prefix(PAYMENT_LABEL_PREFIX).unwrap_or(&label).trim();
        let field = dynamic_field_name(channel);
        for (entry, cell) in entries.iter_mut().zip(&cells) {
            if let Some(amount) = cell.as_number().filter(|amount| *amount != 0.0) {
                entry.add(field.clone(), amount);
            }
        }
        columns.push(DynamicColumn { label, field });
    }
    for entry in &mut entries {
        entry.map_amounts(round_cents);
    }
    if !columns.is_empty() {
        debug!(
            report_type = %profile.report_type,
            columns = columns.len(),
            "packed dynamic payment columns"
        );
    }
    PackedColumns { columns, entries }
}
