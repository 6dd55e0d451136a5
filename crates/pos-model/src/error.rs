//! Fatal errors that abort processing of a file.

use thiserror::Error;

/// Errors that stop a pipeline run with no partial result.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The file could not be decoded or read.
    #[error("failed to parse {filename}: {message}")]
    Parse { filename: String, message: String },

    /// No header row was found, or no business date could be derived.
    #[error("header error in {filename}: {message}")]
    Header { filename: String, message: String },

    /// The report type key is not one of the supported types.
    #[error("unsupported report type '{0}'")]
    UnknownReportType(String),
}

impl PipelineError {
    pub fn parse(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            filename: filename.into(),
            message: message.into(),
        }
    }

    pub fn header(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Header {
            filename: filename.into(),
            message: message.into(),
        }
    }
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = PipelineError::header("booking.csv", "no header row in the first 20 rows");
        assert_eq!(
            err.to_string(),
            "header error in booking.csv: no header row in the first 20 rows"
        );
        let err = PipelineError::UnknownReportType("inventory".into());
        assert_eq!(err.to_string(), "unsupported report type 'inventory'");
    }
}
