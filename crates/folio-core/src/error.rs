//! Error types for folio.

use thiserror::Error;

/// Result type alias using folio's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for folio operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Referenced input is missing or malformed (fails before any write)
    #[error("Invalid input: {0}")]
    Input(String),

    /// File type has no onboarding pipeline
    #[error("File type '{0}' is not yet supported")]
    UnsupportedFileType(String),

    /// Text extraction or page rasterization failed
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Text and image extraction disagree on the number of pages
    #[error("Page count mismatch: text extraction produced {text_pages} pages, rasterization produced {image_pages}")]
    PageCountMismatch {
        text_pages: usize,
        image_pages: usize,
    },

    /// Document summary generation failed
    #[error("Summary error: {0}")]
    Summary(String),

    /// Inference/generation failed
    #[error("Inference error: {0}")]
    Inference(String),

    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed
    #[error("Migration error: {0}")]
    Migration(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for errors raised by the persistence layer.
    pub fn is_persistence(&self) -> bool {
        matches!(self, Error::Database(_) | Error::Migration(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
