//! Column mapping for POS reports.
//!
//! [`pack_dynamic_columns`] runs first and moves unknown payment-method
//! columns into the per-row side channel; [`FieldMapper`] then maps the
//! remaining labels onto canonical fields.

pub mod mapper;
pub mod packer;

pub use mapper::{ColumnMatch, FieldMapper, MappedTable, MatchKind, label_similarity, normalize_label};
pub use packer::{
    CHANNEL_SLUGS, DynamicColumn, PackedColumns, dynamic_field_name, is_dynamic_label,
    pack_dynamic_columns,
};
