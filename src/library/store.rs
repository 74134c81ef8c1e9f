//! JSON-backed library store.

use super::record::{BookRecord, Menu};
use super::DEFAULT_RECENT_DAYS;
use crate::config::Config;
use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Counts shown next to each menu entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LibraryStats {
    /// Books not deleted.
    pub all: usize,
    /// Books marked read.
    pub read: usize,
    /// Favorite books.
    pub favorite: usize,
    /// Books opened within the recency window.
    pub recent: usize,
    /// Soft-deleted books.
    pub deleted: usize,
}

impl LibraryStats {
    /// Count for a single menu.
    pub fn get(&self, menu: Menu) -> usize {
        match menu {
            Menu::All => self.all,
            Menu::Read => self.read,
            Menu::Favorite => self.favorite,
            Menu::Recent => self.recent,
            Menu::Deleted => self.deleted,
        }
    }
}

/// Owner of the persisted book collection.
///
/// Every mutation is a full load, modify, save cycle run under one
/// in-process lock. Cloning shares the lock.
#[derive(Clone)]
pub struct LibraryStore {
    path: PathBuf,
    strict: bool,
    recent_days: i64,
    lock: Arc<Mutex<()>>,
}

impl LibraryStore {
    /// Open a permissive store backed by the JSON file at `path`.
    ///
    /// The file does not need to exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            strict: false,
            recent_days: DEFAULT_RECENT_DAYS,
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Open the store described by the configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::open(config.storage.data_file.clone())
            .with_strict(config.storage.strict)
            .with_recent_days(config.library.recent_days)
    }

    /// Surface parse failures as [`AppError::CorruptStore`] instead of an empty library.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Set the recency window used by [`Menu::Recent`].
    pub fn with_recent_days(mut self, days: i64) -> Self {
        self.recent_days = days;
        self
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Recency window in days.
    pub fn recent_days(&self) -> i64 {
        self.recent_days
    }

    /// Read every record, deleted ones included, in persisted order.
    ///
    /// A missing file is an empty library. A corrupt file is an empty
    /// library too unless the store is strict.
    pub fn load_all(&self) -> Result<Vec<BookRecord>> {
        let content = match std::fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "Library store absent, starting empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        match parse_records(&content) {
            Ok(records) => {
                tracing::debug!(path = %self.path.display(), books = records.len(), "Loaded library");
                Ok(records)
            }
            Err(reason) if self.strict => Err(AppError::CorruptStore {
                path: self.path.clone(),
                reason,
            }),
            Err(reason) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %reason,
                    "Library store is corrupt, treating it as empty"
                );
                Ok(Vec::new())
            }
        }
    }

    /// Overwrite the backing file with `records`.
    pub fn save_all(&self, records: &[BookRecord]) -> Result<()> {
        let _guard = self.lock.lock();
        self.write_records(records)
    }

    /// Write through a temp file in the same directory, then rename over the store.
    fn write_records(&self, records: &[BookRecord]) -> Result<()> {
        let persistence = |source: std::io::Error| AppError::Persistence {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(persistence)?;

        let mut json = serde_json::to_vec_pretty(records)?;
        json.push(b'\n');

        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(persistence)?;
        tmp.write_all(&json).map_err(persistence)?;
        tmp.as_file().sync_all().map_err(persistence)?;
        tmp.persist(&self.path).map_err(|e| persistence(e.error))?;

        tracing::debug!(path = %self.path.display(), books = records.len(), "Saved library");
        Ok(())
    }

    /// Number of books not deleted.
    pub fn count_all(&self) -> Result<usize> {
        Ok(self.filter_by(Menu::All)?.len())
    }

    /// Number of books marked read.
    pub fn count_read(&self) -> Result<usize> {
        Ok(self.filter_by(Menu::Read)?.len())
    }

    /// Number of favorite books.
    pub fn count_favorite(&self) -> Result<usize> {
        Ok(self.filter_by(Menu::Favorite)?.len())
    }

    /// Number of soft-deleted books.
    pub fn count_deleted(&self) -> Result<usize> {
        Ok(self.filter_by(Menu::Deleted)?.len())
    }

    /// Number of books opened within `within_days` days.
    pub fn count_recently_read(&self, within_days: i64) -> Result<usize> {
        let now = Utc::now();
        Ok(self
            .load_all()?
            .iter()
            .filter(|r| r.matches(Menu::Recent, now, within_days))
            .count())
    }

    /// Every menu count from a single load.
    pub fn stats(&self) -> Result<LibraryStats> {
        let records = self.load_all()?;
        let now = Utc::now();
        let count = |menu: Menu| {
            records
                .iter()
                .filter(|r| r.matches(menu, now, self.recent_days))
                .count()
        };

        Ok(LibraryStats {
            all: count(Menu::All),
            read: count(Menu::Read),
            favorite: count(Menu::Favorite),
            recent: count(Menu::Recent),
            deleted: count(Menu::Deleted),
        })
    }

    /// Records shown under `menu`, in persisted order.
    ///
    /// Accepts a [`Menu`] or a menu key; unknown keys behave as `all`.
    pub fn filter_by(&self, menu: impl Into<Menu>) -> Result<Vec<BookRecord>> {
        let menu = menu.into();
        Ok(filter_records(self.load_all()?, menu, Utc::now(), self.recent_days))
    }

    /// Look up a record by filename, deleted ones included.
    pub fn get(&self, filename: &str) -> Result<Option<BookRecord>> {
        Ok(self
            .load_all()?
            .into_iter()
            .find(|r| r.filename == filename))
    }

    /// Insert `record`, or overwrite the mutable fields of the record with the same filename.
    pub fn upsert(&self, record: BookRecord) -> Result<BookRecord> {
        self.upsert_with(record, |existing, incoming| existing.replace_fields(incoming))
    }

    /// Insert `record`, or let `merge` fold it into the existing record with the same filename.
    ///
    /// Returns the record as stored.
    pub fn upsert_with<F>(&self, record: BookRecord, merge: F) -> Result<BookRecord>
    where
        F: FnOnce(&mut BookRecord, BookRecord),
    {
        let _guard = self.lock.lock();
        let mut records = self.load_all()?;

        let stored = match records.iter_mut().find(|r| r.filename == record.filename) {
            Some(existing) => {
                merge(existing, record);
                existing.clone()
            }
            None => {
                tracing::info!(filename = %record.filename, "Adding book to library");
                records.push(record.clone());
                record
            }
        };

        self.write_records(&records)?;
        Ok(stored)
    }

    /// Mark a book read and stamp `last_read` with the current time.
    pub fn mark_read(&self, filename: &str) -> Result<Option<BookRecord>> {
        let now = Utc::now();
        self.mutate(filename, |r| {
            r.is_read = true;
            r.touch(now);
        })
    }

    /// Stamp `last_read` without changing the read flag.
    pub fn touch(&self, filename: &str) -> Result<Option<BookRecord>> {
        let now = Utc::now();
        self.mutate(filename, |r| r.touch(now))
    }

    /// Flip the favorite flag.
    pub fn toggle_favorite(&self, filename: &str) -> Result<Option<BookRecord>> {
        self.mutate(filename, |r| r.is_favorite = !r.is_favorite)
    }

    /// Hide a book from every view except [`Menu::Deleted`].
    pub fn soft_delete(&self, filename: &str) -> Result<Option<BookRecord>> {
        self.mutate(filename, |r| r.is_deleted = true)
    }

    /// Undo a soft delete.
    pub fn restore(&self, filename: &str) -> Result<Option<BookRecord>> {
        self.mutate(filename, |r| r.is_deleted = false)
    }

    /// Change title and/or author.
    pub fn set_metadata(
        &self,
        filename: &str,
        title: Option<String>,
        author: Option<String>,
    ) -> Result<Option<BookRecord>> {
        self.mutate(filename, |r| {
            if let Some(title) = title {
                r.title = title;
            }
            if let Some(author) = author {
                r.author = author;
            }
        })
    }

    /// Drop a record from the store. Returns the removed record.
    pub fn remove(&self, filename: &str) -> Result<Option<BookRecord>> {
        let _guard = self.lock.lock();
        let mut records = self.load_all()?;

        let Some(pos) = records.iter().position(|r| r.filename == filename) else {
            return Ok(None);
        };
        let removed = records.remove(pos);

        self.write_records(&records)?;
        tracing::info!(filename, "Removed book from library");
        Ok(Some(removed))
    }

    /// Load, apply `f` to the named record, save. Missing records are a no-op.
    fn mutate<F>(&self, filename: &str, f: F) -> Result<Option<BookRecord>>
    where
        F: FnOnce(&mut BookRecord),
    {
        let _guard = self.lock.lock();
        let mut records = self.load_all()?;

        let Some(record) = records.iter_mut().find(|r| r.filename == filename) else {
            tracing::debug!(filename, "Book not in library, nothing to update");
            return Ok(None);
        };
        f(record);
        let updated = record.clone();

        self.write_records(&records)?;
        tracing::info!(
            filename,
            is_read = updated.is_read,
            is_favorite = updated.is_favorite,
            is_deleted = updated.is_deleted,
            "Updated book"
        );
        Ok(Some(updated))
    }
}

/// Keep the records visible under `menu`.
fn filter_records(
    records: Vec<BookRecord>,
    menu: Menu,
    now: DateTime<Utc>,
    recent_days: i64,
) -> Vec<BookRecord> {
    records
        .into_iter()
        .filter(|r| r.matches(menu, now, recent_days))
        .collect()
}

/// Decode the store file. Later duplicates of a filename are dropped.
fn parse_records(content: &[u8]) -> std::result::Result<Vec<BookRecord>, String> {
    let value: Value = serde_json::from_slice(content).map_err(|e| e.to_string())?;
    let Value::Array(entries) = value else {
        return Err("expected a JSON array of books".to_string());
    };

    let mut seen = HashSet::new();
    let mut records = Vec::with_capacity(entries.len());

    for (index, entry) in entries.into_iter().enumerate() {
        let Some(record) = BookRecord::from_value(entry) else {
            tracing::warn!(index, "Skipping library entry without a filename");
            continue;
        };
        if !seen.insert(record.filename.clone()) {
            tracing::warn!(filename = %record.filename, "Skipping duplicate library entry");
            continue;
        }
        records.push(record);
    }

    Ok(records)
}
