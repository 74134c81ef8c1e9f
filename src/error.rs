use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the library manager.
#[derive(Error, Debug)]
pub enum AppError {
    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// The library store could not be written.
    #[error("Failed to save library to {path}: {source}")]
    Persistence {
        /// Destination of the failed write.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },

    /// The library store exists but could not be parsed (strict mode only).
    #[error("Library store {path} is corrupt: {reason}")]
    CorruptStore {
        /// Store file.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },

    /// Copying a file into managed storage failed.
    #[error("Failed to copy {from} to {to}: {source}")]
    Copy {
        /// Source file picked by the user.
        from: PathBuf,
        /// Destination inside managed storage.
        to: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },

    /// Text content is not valid UTF-8.
    #[error("Cannot decode {path}: {reason}")]
    Decode {
        /// File being read.
        path: PathBuf,
        /// Decoder message.
        reason: String,
    },

    /// EPUB archive is malformed.
    #[error("Unsupported or malformed EPUB {path}: {reason}")]
    UnsupportedFormat {
        /// File being read.
        path: PathBuf,
        /// Underlying parse failure.
        reason: String,
    },

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP archive error.
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// XML parsing error.
    #[error("XML parsing error: {0}")]
    Xml(#[from] roxmltree::Error),

    /// JSON encoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Whether the reading view can show this error as text instead of failing.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::Decode { .. } | AppError::UnsupportedFormat { .. } | AppError::Io(_)
        )
    }
}

/// Result type alias for the application.
pub type Result<T> = std::result::Result<T, AppError>;
