//! Error types for the Lancea library.
//!
//! All errors are represented by the [`LanceaError`] enum. Each failure mode
//! the engine can surface has its own variant, so callers can branch without
//! string matching.
//!
//! # Examples
//!
//! ```
//! use lancea::error::{LanceaError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(LanceaError::invalid_argument("limit must be at least 1"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for Lancea operations.
#[derive(Error, Debug)]
pub enum LanceaError {
    /// I/O errors from the backing store. A failed commit surfaces this
    /// variant; the previously committed state is intact and the commit may
    /// be retried.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Input text or persisted bytes with invalid encoding.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Malformed query text (empty query, unbalanced quotes).
    #[error("Query syntax error: {0}")]
    QuerySyntax(String),

    /// Bad call parameters, rejected before any state change.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Index-related errors
    #[error("Index error: {0}")]
    Index(String),

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Analysis-related errors (tokenization, filtering, etc.)
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for operations that may fail with LanceaError.
pub type Result<T> = std::result::Result<T, LanceaError>;

impl LanceaError {
    /// Create a new malformed input error.
    pub fn malformed_input<S: Into<String>>(msg: S) -> Self {
        LanceaError::MalformedInput(msg.into())
    }

    /// Create a new query syntax error.
    pub fn query_syntax<S: Into<String>>(msg: S) -> Self {
        LanceaError::QuerySyntax(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        LanceaError::InvalidArgument(msg.into())
    }

    /// Create a new index error.
    pub fn index<S: Into<String>>(msg: S) -> Self {
        LanceaError::Index(msg.into())
    }

    /// Create a new storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        LanceaError::Storage(msg.into())
    }

    /// Create a new analysis error.
    pub fn analysis<S: Into<String>>(msg: S) -> Self {
        LanceaError::Analysis(msg.into())
    }
}
