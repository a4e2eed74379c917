//! Error types for the Quarry library.
//!
//! Every fallible operation returns [`Result`], whose error type is
//! [`QuarryError`]. Each variant maps to a stable [`ErrorKind`] so that
//! callers of the command surface can tell error replies apart from
//! (possibly empty) result sets.
//!
//! # Examples
//!
//! ```
//! use quarry::error::{ErrorKind, QuarryError, Result};
//!
//! fn lookup(name: &str) -> Result<()> {
//!     Err(QuarryError::index_not_found(name))
//! }
//!
//! let err = lookup("products").unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::IndexNotFound);
//! assert_eq!(err.kind().code(), "ERR_INDEX_NOT_FOUND");
//! ```

use std::fmt;
use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The main error type for Quarry operations.
#[derive(Error, Debug)]
pub enum QuarryError {
    /// Malformed query string.
    #[error("Query syntax error at position {position} near '{token}': {message}")]
    QuerySyntax {
        message: String,
        token: String,
        position: usize,
    },

    /// The named index does not exist.
    #[error("Index not found: {0}")]
    IndexNotFound(String),

    /// An index with this name already exists.
    #[error("Index already exists: {0}")]
    IndexAlreadyExists(String),

    /// A value does not match the type declared for its field.
    #[error("Field type mismatch for '{field}': expected {expected}, found {found}")]
    FieldTypeMismatch {
        field: String,
        expected: String,
        found: String,
    },

    /// Highlighting or value materialization on a field that is not stored.
    #[error("Field not stored: {0}")]
    FieldNotStored(String),

    /// A field that the schema does not know about.
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// Index size or document count limits.
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    /// A deadline expired or the caller cancelled the operation.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// The referenced document does not exist.
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    /// Analysis-related errors (tokenization, filtering, analyzer lookup).
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// Invalid argument or configuration.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// I/O errors (config files, command scripts).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for operations that may fail with QuarryError.
pub type Result<T> = std::result::Result<T, QuarryError>;

/// Stable classification of a [`QuarryError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    QuerySyntax,
    IndexNotFound,
    IndexAlreadyExists,
    FieldTypeMismatch,
    FieldNotStored,
    UnknownField,
    ResourceExhausted,
    Timeout,
    DocumentNotFound,
    Analysis,
    InvalidArgument,
    Io,
    Json,
}

impl ErrorKind {
    /// Wire code used in command replies.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::QuerySyntax => "ERR_QUERY_SYNTAX",
            ErrorKind::IndexNotFound => "ERR_INDEX_NOT_FOUND",
            ErrorKind::IndexAlreadyExists => "ERR_INDEX_EXISTS",
            ErrorKind::FieldTypeMismatch => "ERR_FIELD_TYPE",
            ErrorKind::FieldNotStored => "ERR_FIELD_NOT_STORED",
            ErrorKind::UnknownField => "ERR_UNKNOWN_FIELD",
            ErrorKind::ResourceExhausted => "ERR_RESOURCE_EXHAUSTED",
            ErrorKind::Timeout => "ERR_TIMEOUT",
            ErrorKind::DocumentNotFound => "ERR_DOCUMENT_NOT_FOUND",
            ErrorKind::Analysis => "ERR_ANALYSIS",
            ErrorKind::InvalidArgument => "ERR_INVALID_ARGUMENT",
            ErrorKind::Io => "ERR_IO",
            ErrorKind::Json => "ERR_JSON",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl QuarryError {
    /// Create a new query syntax error.
    pub fn query_syntax<M, T>(message: M, token: T, position: usize) -> Self
    where
        M: Into<String>,
        T: Into<String>,
    {
        QuarryError::QuerySyntax {
            message: message.into(),
            token: token.into(),
            position,
        }
    }

    /// Create a new index-not-found error.
    pub fn index_not_found<S: Into<String>>(name: S) -> Self {
        QuarryError::IndexNotFound(name.into())
    }

    /// Create a new index-already-exists error.
    pub fn index_already_exists<S: Into<String>>(name: S) -> Self {
        QuarryError::IndexAlreadyExists(name.into())
    }

    /// Create a new field type mismatch error.
    pub fn field_type_mismatch<F, E, V>(field: F, expected: E, found: V) -> Self
    where
        F: Into<String>,
        E: Into<String>,
        V: Into<String>,
    {
        QuarryError::FieldTypeMismatch {
            field: field.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create a new field-not-stored error.
    pub fn field_not_stored<S: Into<String>>(field: S) -> Self {
        QuarryError::FieldNotStored(field.into())
    }

    /// Create a new unknown field error.
    pub fn unknown_field<S: Into<String>>(field: S) -> Self {
        QuarryError::UnknownField(field.into())
    }

    /// Create a new resource exhausted error.
    pub fn resource_exhausted<S: Into<String>>(msg: S) -> Self {
        QuarryError::ResourceExhausted(msg.into())
    }

    /// Create a new timeout error.
    pub fn timeout<S: Into<String>>(msg: S) -> Self {
        QuarryError::Timeout(msg.into())
    }

    /// Create a new document-not-found error.
    pub fn document_not_found<S: Into<String>>(id: S) -> Self {
        QuarryError::DocumentNotFound(id.into())
    }

    /// Create a new analysis error.
    pub fn analysis<S: Into<String>>(msg: S) -> Self {
        QuarryError::Analysis(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        QuarryError::InvalidArgument(msg.into())
    }

    /// The stable kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            QuarryError::QuerySyntax { .. } => ErrorKind::QuerySyntax,
            QuarryError::IndexNotFound(_) => ErrorKind::IndexNotFound,
            QuarryError::IndexAlreadyExists(_) => ErrorKind::IndexAlreadyExists,
            QuarryError::FieldTypeMismatch { .. } => ErrorKind::FieldTypeMismatch,
            QuarryError::FieldNotStored(_) => ErrorKind::FieldNotStored,
            QuarryError::UnknownField(_) => ErrorKind::UnknownField,
            QuarryError::ResourceExhausted(_) => ErrorKind::ResourceExhausted,
            QuarryError::Timeout(_) => ErrorKind::Timeout,
            QuarryError::DocumentNotFound(_) => ErrorKind::DocumentNotFound,
            QuarryError::Analysis(_) => ErrorKind::Analysis,
            QuarryError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            QuarryError::Io(_) => ErrorKind::Io,
            QuarryError::Json(_) => ErrorKind::Json,
        }
    }

    /// Whether an optional (`should` / `must_not`) clause failing with this
    /// error may be treated as matching nothing.
    pub fn is_clause_recoverable(&self) -> bool {
        matches!(
            self,
            QuarryError::UnknownField(_) | QuarryError::FieldTypeMismatch { .. }
        )
    }
}
