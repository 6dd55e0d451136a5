//! Reading POS report exports into normalized raw tables.
//!
//! Stages, in order: encoding detection, header location, header
//! flattening, table normalization. [`read_sheet`] runs them over a whole
//! file; [`StreamReader`] runs them per fixed-size chunk of a CSV export.

pub mod detect;
pub mod encoding;
pub mod error;
pub mod flatten;
pub mod locate;
pub mod narrow;
pub mod normalize;
pub mod reader;
pub mod source;
pub mod streaming;

// === Errors ===
pub use error::{IngestError, Result};

// === Sources ===
pub use encoding::{CANDIDATE_ENCODINGS, DecodedText, decode_text};
pub use source::{SheetSource, SourceFormat, data_to_cell, read_workbook_rows};

// === Header handling ===
pub use flatten::{FlatHeader, flatten_header, flatten_single, flatten_two_level, is_sub_header};
pub use locate::{HEADER_KEYWORDS, HeaderLocation, find_date, locate_header, normalize_match_text};

// === Normalization ===
pub use narrow::{CATEGORY_CARDINALITY_RATIO, ColumnStorage, NarrowedFrame, narrow_table};
pub use normalize::{NormalizeStats, TOTAL_ROW_MARKERS, UNNAMED_COLUMN, dedupe_labels, normalize_table};

// === Reading ===
pub use detect::detect_report_type;
pub use reader::{ParsedSheet, read_sheet};
pub use streaming::{ChunkMeta, StreamReader, TableChunk};
