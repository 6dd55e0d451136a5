//! End-to-end ingestion of POS report exports.
//!
//! [`IngestPipeline`] turns the bytes of one export into canonical records
//! and a validation report, either as a whole or chunk by chunk.

pub mod pipeline;

pub use pipeline::{IngestPipeline, PipelineOutput};
