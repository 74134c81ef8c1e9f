//! ebook-shelf: a personal library manager for text and EPUB books.
//!
//! Imported files are copied into a managed directory and tracked in a JSON
//! store holding per-book metadata and reading state.
//!
//! # Features
//!
//! - Import of `.txt` and `.epub` files, idempotent by filename
//! - Read, favorite and soft-delete flags with restore and purge
//! - Sidebar views: all, recently read, favorites, read, deleted
//! - Plain text extraction from EPUB archives
//! - Atomic rewrites of the library store

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Configuration and CLI.
pub mod config;
/// Error types.
pub mod error;
/// Book content readers.
pub mod formats;
/// Import pipeline.
pub mod import;
/// Library records and store.
pub mod library;
/// Opening books for reading.
pub mod reader;


pub use config::{Cli, Command, Config};
pub use error::{AppError, Result};
pub use import::Importer;
pub use library::{BookRecord, LibraryStore, Menu};
pub use reader::BookReader;
