//! Book record model.

use super::UNKNOWN_AUTHOR;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// Keys owned by the typed fields of [`BookRecord`].
const KNOWN_KEYS: [&str; 7] = [
    "filename",
    "title",
    "author",
    "is_read",
    "is_favorite",
    "is_deleted",
    "last_read",
];

/// File suffixes stripped when deriving a title from a filename.
const KNOWN_EXTENSIONS: [&str; 2] = [".txt", ".epub"];

/// One managed ebook file and its reading state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookRecord {
    /// File name under managed storage, unique within the library.
    pub filename: String,

    /// Display title.
    pub title: String,

    /// Author name.
    pub author: String,

    /// Whether the book has been marked read.
    pub is_read: bool,

    /// Whether the book is a favorite.
    pub is_favorite: bool,

    /// Soft-delete marker.
    pub is_deleted: bool,

    /// Last time the book was opened, as an ISO-8601 string.
    pub last_read: Option<String>,

    /// Keys this version does not know about, written back untouched.
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl BookRecord {
    /// Create a record with default metadata for a freshly imported file.
    pub fn new(filename: impl Into<String>) -> Self {
        let filename = filename.into();
        Self {
            title: default_title(&filename),
            filename,
            author: UNKNOWN_AUTHOR.to_string(),
            is_read: false,
            is_favorite: false,
            is_deleted: false,
            last_read: None,
            extra: Map::new(),
        }
    }

    /// Build a record from one persisted JSON entry.
    ///
    /// Missing or mistyped fields fall back to their defaults. Returns `None`
    /// when the entry is not an object or has no usable `filename`.
    pub fn from_value(value: Value) -> Option<Self> {
        let Value::Object(mut map) = value else {
            return None;
        };

        let filename = match map.remove("filename") {
            Some(Value::String(name)) if !name.is_empty() => name,
            _ => return None,
        };

        let title = take_string(&mut map, "title").unwrap_or_else(|| default_title(&filename));
        let author = take_string(&mut map, "author").unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());
        let is_read = take_bool(&mut map, "is_read");
        let is_favorite = take_bool(&mut map, "is_favorite");
        let is_deleted = take_bool(&mut map, "is_deleted");
        let last_read = take_string(&mut map, "last_read");

        Some(Self {
            filename,
            title,
            author,
            is_read,
            is_favorite,
            is_deleted,
            last_read,
            extra: map,
        })
    }

    /// Keys carried over from the store that have no typed field.
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    /// Attach an extra key. Keys owned by a typed field are refused.
    pub fn insert_extra(&mut self, key: impl Into<String>, value: Value) -> bool {
        let key = key.into();
        if KNOWN_KEYS.contains(&key.as_str()) {
            return false;
        }
        self.extra.insert(key, value);
        true
    }

    /// Parsed `last_read`, if present and valid.
    pub fn last_read_at(&self) -> Option<DateTime<Utc>> {
        self.last_read.as_deref().and_then(parse_timestamp)
    }

    /// Whether the book was opened within `days` whole days of `now`.
    ///
    /// Unparseable timestamps never count as recent.
    pub fn is_recent(&self, now: DateTime<Utc>, days: i64) -> bool {
        self.last_read_at()
            .is_some_and(|at| now.signed_duration_since(at).num_days() <= days)
    }

    /// Stamp `last_read` with the given moment.
    pub fn touch(&mut self, at: DateTime<Utc>) {
        self.last_read = Some(at.to_rfc3339());
    }

    /// Whether this record is shown under `menu`.
    pub fn matches(&self, menu: Menu, now: DateTime<Utc>, recent_days: i64) -> bool {
        match menu {
            Menu::Deleted => self.is_deleted,
            _ if self.is_deleted => false,
            Menu::All => true,
            Menu::Recent => self.is_recent(now, recent_days),
            Menu::Favorite => self.is_favorite,
            Menu::Read => self.is_read,
        }
    }

    /// Copy title, author, flags and `last_read` from `other`.
    pub fn replace_fields(&mut self, other: BookRecord) {
        self.title = other.title;
        self.author = other.author;
        self.is_read = other.is_read;
        self.is_favorite = other.is_favorite;
        self.is_deleted = other.is_deleted;
        self.last_read = other.last_read;
        self.extra.extend(other.extra);
    }
}

fn take_string(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    match map.remove(key) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}

fn take_bool(map: &mut Map<String, Value>, key: &str) -> bool {
    matches!(map.remove(key), Some(Value::Bool(true)))
}

/// Derive a display title by stripping a known ebook extension.
pub fn default_title(filename: &str) -> String {
    let lower = filename.to_ascii_lowercase();
    for ext in KNOWN_EXTENSIONS {
        if lower.len() > ext.len() && lower.ends_with(ext) {
            return filename[..filename.len() - ext.len()].to_string();
        }
    }
    filename.to_string()
}

/// Parse an ISO-8601 timestamp.
///
/// Accepts RFC 3339 with an offset, naive date-times (read as local time,
/// with `T` or space separator) and bare dates (local midnight).
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    let naive = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Library views offered by the sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Menu {
    /// Every book not deleted.
    All,
    /// Books opened within the recency window.
    Recent,
    /// Favorite books.
    Favorite,
    /// Books marked read.
    Read,
    /// Soft-deleted books.
    Deleted,
}

impl Menu {
    /// Every menu, in sidebar order.
    pub const ALL: [Menu; 5] = [
        Menu::All,
        Menu::Recent,
        Menu::Favorite,
        Menu::Read,
        Menu::Deleted,
    ];

    /// Key used to select this menu.
    pub fn key(&self) -> &'static str {
        match self {
            Menu::All => "all",
            Menu::Recent => "recent",
            Menu::Favorite => "favorite",
            Menu::Read => "read",
            Menu::Deleted => "deleted",
        }
    }
}

/// Unknown keys select [`Menu::All`].
impl From<&str> for Menu {
    fn from(key: &str) -> Self {
        match key.trim().to_lowercase().as_str() {
            "recent" => Menu::Recent,
            "favorite" => Menu::Favorite,
            "read" => Menu::Read,
            "deleted" => Menu::Deleted,
            _ => Menu::All,
        }
    }
}

impl fmt::Display for Menu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
