//! Error types for the bibdex library.
//!
//! Every fallible operation returns [`Result`], whose error side is the
//! [`BibdexError`] enum. Only configuration errors are meant to stop a
//! process; query errors are rejected queries, and shard errors are usually
//! absorbed by the postings store after being logged.
//!
//! # Examples
//!
//! ```
//! use bibdex::error::{BibdexError, Result};
//!
//! fn check_range(low: u32, high: u32) -> Result<()> {
//!     if low > high {
//!         return Err(BibdexError::query("range is reversed"));
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_range(2022, 2020).is_err());
//! ```

use std::io;

use thiserror::Error;

/// The main error type for bibdex operations.
#[derive(Error, Debug)]
pub enum BibdexError {
    /// I/O errors (file operations, pipes).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Archive root, postings directory or schema file is missing or unusable.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A query was rejected by the parser.
    #[error("Query error: {0}")]
    Query(String),

    /// A shard or bundle file does not follow the on-disk format.
    #[error("Format error: {0}")]
    Format(String),

    /// Schema-related errors (unknown fields, bad field definitions).
    #[error("Schema error: {0}")]
    Schema(String),

    /// Another writer holds the archive.
    #[error("Lock error: {0}")]
    Lock(String),

    /// A pipeline worker panicked or a stage hung up early.
    #[error("Pipeline error: {0}")]
    Pipeline(String),

    /// Binary serialization errors.
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// JSON serialization/deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Regex compilation errors for wildcard patterns.
    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),
}

/// Result type alias for operations that may fail with BibdexError.
pub type Result<T> = std::result::Result<T, BibdexError>;

impl BibdexError {
    /// Create a new configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        BibdexError::Config(msg.into())
    }

    /// Create a new query error.
    pub fn query<S: Into<String>>(msg: S) -> Self {
        BibdexError::Query(msg.into())
    }

    /// Create a new format error.
    pub fn format<S: Into<String>>(msg: S) -> Self {
        BibdexError::Format(msg.into())
    }

    /// Create a new schema error.
    pub fn schema<S: Into<String>>(msg: S) -> Self {
        BibdexError::Schema(msg.into())
    }

    /// Create a new lock error.
    pub fn lock<S: Into<String>>(msg: S) -> Self {
        BibdexError::Lock(msg.into())
    }

    /// Create a new pipeline error.
    pub fn pipeline<S: Into<String>>(msg: S) -> Self {
        BibdexError::Pipeline(msg.into())
    }

    /// Whether this error should stop the whole process.
    pub fn is_fatal(&self) -> bool {
        matches!(self, BibdexError::Config(_) | BibdexError::Lock(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = BibdexError::query("unbalanced parentheses");
        assert_eq!(error.to_string(), "Query error: unbalanced parentheses");

        let error = BibdexError::format("truncated master index");
        assert_eq!(error.to_string(), "Format error: truncated master index");

        let error = BibdexError::config("archive root not found");
        assert_eq!(
            error.to_string(),
            "Configuration error: archive root not found"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let bibdex_error = BibdexError::from(io_error);

        match bibdex_error {
            BibdexError::Io(_) => {}
            _ => panic!("Expected IO error variant"),
        }
    }

    #[test]
    fn test_fatal_classification() {
        assert!(BibdexError::config("missing root").is_fatal());
        assert!(BibdexError::lock("held").is_fatal());
        assert!(!BibdexError::query("bad").is_fatal());
        assert!(!BibdexError::format("bad").is_fatal());
    }
}
