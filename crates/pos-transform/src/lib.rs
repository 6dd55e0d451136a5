//! Coercion of mapped POS report rows into canonical records.
//!
//! [`TypeCoercer`] turns the cells of a mapped table into typed values by
//! field role, [`backfill_business_date`] assigns each row its operating
//! date, and [`metadata`] derives store names and the payment-method catalog.

pub mod business_date;
pub mod coerce;
pub mod datetime;
pub mod metadata;

// === Coercion ===
pub use coerce::{CoercedTable, NUMERIC_SAMPLE_SIZE, TypeCoercer, repair_identifier};
pub use datetime::{
    PRIMARY_DATE_FORMATS, PRIMARY_DATETIME_FORMATS, parse_datetime, parse_datetime_text,
};

// === Business date ===
pub use business_date::{backfill_business_date, file_level_date};

// === File metadata ===
pub use metadata::{
    STORE_KEYWORDS, collect_payment_methods, date_from_filename, store_from_brackets,
    store_from_filename, stores_from_records, summarize_stores,
};
