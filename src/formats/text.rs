//! Plain text handler.

use crate::error::{AppError, Result};
use crate::formats::ContentReader;
use std::path::Path;

/// Handler for UTF-8 text files.
pub struct TextHandler;

impl ContentReader for TextHandler {
    fn read_text(&self, path: &Path) -> Result<String> {
        let bytes = std::fs::read(path)?;

        String::from_utf8(bytes).map_err(|e| AppError::Decode {
            path: path.to_path_buf(),
            reason: e.utf8_error().to_string(),
        })
    }
}
