//! Schema and configuration errors
//!
//! Loader failures that should stop a report build before any statistics are
//! computed. I/O and parser failures travel as `anyhow::Error` with context;
//! these variants are the ones callers may want to match on.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    /// A declared column is absent after name normalization
    #[error("{context}: missing expected column '{column}'. Available columns: {available:?}")]
    MissingColumn {
        context: String,
        column: String,
        available: Vec<String>,
    },

    /// Fewer replicate columns than the baseline estimator needs
    #[error("at least 2 replicate columns are required, {0} declared")]
    TooFewReplicateColumns(usize),

    #[error("control identifier '{0}' must not be empty")]
    EmptyControlId(&'static str),

    #[error("significance level must lie in (0, 1), got {0}")]
    InvalidSignificance(String),

    #[error("unsupported input format for {path}: expected .csv, .tsv, .xlsx or .xls")]
    UnsupportedFormat { path: String },

    #[error("{path}: worksheet is empty")]
    EmptyWorksheet { path: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_column_message_lists_available() {
        let err = SchemaError::MissingColumn {
            context: "CV readings".to_string(),
            column: "cv_2".to_string(),
            available: vec!["source".to_string(), "cv_1".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("cv_2"));
        assert!(msg.contains("CV readings"));
        assert!(msg.contains("source"));
    }
}
