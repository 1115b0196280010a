//! Error types for CSV input and output.

use std::path::PathBuf;

use sgmt_core::CoreError;
use thiserror::Error;

/// Errors that can occur while reading or writing CSV streams.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Input file not found.
    #[error("CSV file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to open or read a file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create an output file.
    #[error("failed to create file {path}: {source}")]
    FileCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === CSV Errors ===
    /// Malformed CSV or undecodable bytes.
    #[error("failed to parse CSV {path}: {source}")]
    CsvParse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Failed to write CSV output.
    #[error("failed to write CSV {path}: {source}")]
    CsvWrite {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Dialect name not in the supported list.
    #[error("unknown CSV dialect '{name}' (expected one of: {expected})")]
    UnknownDialect { name: String, expected: String },

    /// Required column not found in a header.
    #[error("required column '{column}' not found in {path}")]
    MissingColumn { column: String, path: PathBuf },
}

impl From<IngestError> for CoreError {
    fn from(err: IngestError) -> Self {
        CoreError::Source(Box::new(err))
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IngestError::FileNotFound {
            path: PathBuf::from("/path/to/edges.csv"),
        };
        assert_eq!(err.to_string(), "CSV file not found: /path/to/edges.csv");
    }

    #[test]
    fn test_error_into_core() {
        let err = IngestError::MissingColumn {
            column: "node".into(),
            path: PathBuf::from("nodes.csv"),
        };
        let core: CoreError = err.into();
        assert!(matches!(core, CoreError::Source(_)));
        assert_eq!(
            core.to_string(),
            "required column 'node' not found in nodes.csv"
        );
    }
}
