mod epub;
mod text;

pub use epub::EpubHandler;
pub use text::TextHandler;

use crate::error::Result;
use std::path::Path;

/// Content returned for files that are neither text nor EPUB.
pub const UNSUPPORTED_FORMAT_MESSAGE: &str = "Unsupported file format.";

/// Trait for format-specific content readers.
pub trait ContentReader: Send + Sync {
    /// Extract the readable text of a book file.
    fn read_text(&self, path: &Path) -> Result<String>;
}

/// Formats the library can import and read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BookFormat {
    /// Plain UTF-8 text.
    Txt,
    /// EPUB archive.
    Epub,
}

impl BookFormat {
    /// Try to detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "txt" => Some(BookFormat::Txt),
            "epub" => Some(BookFormat::Epub),
            _ => None,
        }
    }

    /// Detect format from the extension of `path`.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }
}

/// Get the reader for a book format.
pub fn get_handler(format: BookFormat) -> Box<dyn ContentReader> {
    match format {
        BookFormat::Txt => Box::new(TextHandler),
        BookFormat::Epub => Box::new(EpubHandler),
    }
}

/// Read the text of a book, dispatching on its extension.
///
/// Unknown extensions yield [`UNSUPPORTED_FORMAT_MESSAGE`] rather than an error.
pub fn read_content(path: &Path) -> Result<String> {
    match BookFormat::from_path(path) {
        Some(format) => get_handler(format).read_text(path),
        None => {
            tracing::debug!(path = %path.display(), "No reader for file extension");
            Ok(UNSUPPORTED_FORMAT_MESSAGE.to_string())
        }
    }
}

/// Read the text of a book, turning any failure into a message for the reading view.
pub fn read_for_display(path: &Path) -> String {
    match read_content(path) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read book");
            format!("Error reading file: {}", e)
        }
    }
}
