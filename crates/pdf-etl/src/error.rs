//! Error types for the ETL pipeline
//!
//! Only fatal conditions are errors. Per-unit extraction problems and per-item
//! write rejections are recorded as data on the ingest report instead.

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The document could not be opened or parsed at all
    #[error("Failed to open document '{path}': {message}")]
    DocumentOpen { path: String, message: String },

    /// A single page or unit could not be extracted
    #[error("Extraction failed on page {page}: {message}")]
    Extraction { page: u32, message: String },

    /// Index drop/create failed
    #[error("Schema reset failed for index '{index}': {message}")]
    SchemaReset { index: String, message: String },

    /// The indexing engine rejected a request or answered unexpectedly
    #[error("Search backend error: {0}")]
    Backend(String),

    /// A backend call exceeded its deadline
    #[error("Search backend timed out: {0}")]
    Timeout(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a document open error
    pub fn document_open(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DocumentOpen {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a per-page extraction error
    pub fn extraction(page: u32, message: impl Into<String>) -> Self {
        Self::Extraction {
            page,
            message: message.into(),
        }
    }

    /// Create a schema reset error
    pub fn schema_reset(index: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SchemaReset {
            index: index.into(),
            message: message.into(),
        }
    }

    /// Create a backend error
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether this error was caused by a request deadline
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Timeout(_) => true,
            Error::Http(err) => err.is_timeout(),
            _ => false,
        }
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        Error::Internal(format!("PDF error: {}", err))
    }
}
