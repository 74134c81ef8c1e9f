//! Import pipeline: copy picked files into managed storage and register them.

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::library::{BookRecord, LibraryStore};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Brings external files under management.
#[derive(Clone)]
pub struct Importer {
    store: LibraryStore,
    ebooks_dir: PathBuf,
}

impl Importer {
    /// Create an importer copying into `ebooks_dir` and registering in `store`.
    pub fn new(store: LibraryStore, ebooks_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            ebooks_dir: ebooks_dir.into(),
        }
    }

    /// Create an importer from configuration.
    pub fn from_config(store: LibraryStore, config: &Config) -> Self {
        Self::new(store, config.storage.ebooks_dir.clone())
    }

    /// Library store records are registered in.
    pub fn store(&self) -> &LibraryStore {
        &self.store
    }

    /// Managed storage directory.
    pub fn ebooks_dir(&self) -> &Path {
        &self.ebooks_dir
    }

    /// Path of a managed file.
    pub fn managed_path(&self, filename: &str) -> PathBuf {
        self.ebooks_dir.join(filename)
    }

    /// Copy `source` into managed storage and register it.
    ///
    /// The file is copied before the record is written, so a failed copy never
    /// leaves a record behind. Re-importing a filename overwrites the file but
    /// keeps the existing record untouched.
    pub fn import_file(&self, source: &Path) -> Result<BookRecord> {
        let filename = source
            .file_name()
            .and_then(|n| n.to_str())
            .map(String::from)
            .ok_or_else(|| AppError::Copy {
                from: source.to_path_buf(),
                to: self.ebooks_dir.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "file name is missing or not valid UTF-8",
                ),
            })?;

        let dest = self.managed_path(&filename);
        self.copy_into_storage(source, &dest)?;

        let record = self
            .store
            .upsert_with(BookRecord::new(filename), |_existing, _incoming| {})?;

        tracing::info!(
            source = %source.display(),
            filename = %record.filename,
            "Imported book"
        );
        Ok(record)
    }

    /// Copy through a temp file in the managed directory, then rename into place.
    fn copy_into_storage(&self, source: &Path, dest: &Path) -> Result<()> {
        let copy_error = |e: std::io::Error| AppError::Copy {
            from: source.to_path_buf(),
            to: dest.to_path_buf(),
            source: e,
        };

        std::fs::create_dir_all(&self.ebooks_dir).map_err(copy_error)?;

        if is_same_file(source, dest) {
            tracing::debug!(path = %dest.display(), "Source already in managed storage");
            return Ok(());
        }

        let mut input = File::open(source).map_err(copy_error)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.ebooks_dir).map_err(copy_error)?;
        std::io::copy(&mut input, &mut tmp).map_err(copy_error)?;
        tmp.as_file().sync_all().map_err(copy_error)?;
        tmp.persist(dest).map_err(|e| copy_error(e.error))?;

        Ok(())
    }

    /// Remove a book record and its managed file.
    ///
    /// A missing file is not an error; the record is still removed.
    pub fn purge(&self, filename: &str) -> Result<Option<BookRecord>> {
        if self.store.get(filename)?.is_none() {
            return Ok(None);
        }

        let path = self.managed_path(filename);
        match std::fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "Managed file already gone");
            }
            Err(e) => return Err(e.into()),
        }

        self.store.remove(filename)
    }
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
