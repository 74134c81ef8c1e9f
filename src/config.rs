use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Personal ebook library manager for text and EPUB files.
#[derive(Parser, Debug, Clone)]
#[command(name = "ebook-shelf")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file.
    #[arg(short, long, env = "EBOOK_SHELF_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create default config and storage directories.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },

    /// Copy a .txt or .epub file into the library.
    Import {
        /// Path to the file to import.
        path: PathBuf,
    },

    /// List books in a menu: all, recent, favorite, read, deleted.
    List {
        /// Menu to show (unknown values show all books).
        #[arg(default_value = "all")]
        menu: String,
    },

    /// Show book counts per menu.
    Stats,

    /// Print the content of a book and record when it was opened.
    Read {
        /// Filename of the book in the library.
        filename: String,
    },

    /// Mark a book as read.
    MarkRead {
        /// Filename of the book in the library.
        filename: String,
    },

    /// Toggle the favorite flag of a book.
    Favorite {
        /// Filename of the book in the library.
        filename: String,
    },

    /// Move a book to the deleted menu.
    Delete {
        /// Filename of the book in the library.
        filename: String,
    },

    /// Bring a deleted book back.
    Restore {
        /// Filename of the book in the library.
        filename: String,
    },

    /// Remove a book record and its file for good.
    Purge {
        /// Filename of the book in the library.
        filename: String,
    },

    /// Change the title or author of a book.
    Edit {
        /// Filename of the book in the library.
        filename: String,
        /// New title.
        #[arg(short, long)]
        title: Option<String>,
        /// New author.
        #[arg(short, long)]
        author: Option<String>,
    },
}

/// Main configuration from TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Library view configuration.
    #[serde(default)]
    pub library: LibraryConfig,
}

/// Where the store and the managed files live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the JSON library store.
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,

    /// Directory holding imported ebook files.
    #[serde(default = "default_ebooks_dir")]
    pub ebooks_dir: PathBuf,

    /// Fail on a corrupt store instead of treating it as an empty library.
    #[serde(default)]
    pub strict: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            ebooks_dir: default_ebooks_dir(),
            strict: false,
        }
    }
}

fn default_data_file() -> PathBuf {
    PathBuf::from("data/ebooks.json")
}

fn default_ebooks_dir() -> PathBuf {
    PathBuf::from("ebooks")
}

/// Library view configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Recency window in days for the "recent" menu.
    #[serde(default = "default_recent_days")]
    pub recent_days: i64,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            recent_days: default_recent_days(),
        }
    }
}

fn default_recent_days() -> i64 {
    crate::library::DEFAULT_RECENT_DAYS
}

impl Config {
    /// Load configuration from file.
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::error::AppError::Config(format!("Failed to read config file: {}", e))
        })?;

        Self::parse(&content)
    }

    /// Parse configuration from TOML text.
    pub fn parse(content: &str) -> crate::error::Result<Self> {
        let config: Config = toml::from_str(content).map_err(|e| {
            crate::error::AppError::Config(format!("Failed to parse config file: {}", e))
        })?;

        if config.library.recent_days < 0 {
            return Err(crate::error::AppError::Config(
                "library.recent_days must not be negative".to_string(),
            ));
        }

        Ok(config)
    }

    /// Find config file in default locations.
    pub fn find_config_file() -> Option<PathBuf> {
        let candidates = [
            PathBuf::from("config.toml"),
            PathBuf::from("ebook-shelf.toml"),
            dirs::config_dir()
                .map(|p| p.join("ebook-shelf").join("config.toml"))
                .unwrap_or_default(),
        ];

        candidates
            .into_iter()
            .find(|p| !p.as_os_str().is_empty() && p.exists())
    }

    /// Generate default config file content.
    pub fn generate_default() -> String {
        r#"# ebook-shelf configuration

[storage]
# JSON file holding book records
data_file = "data/ebooks.json"
# Directory imported books are copied into
ebooks_dir = "ebooks"
# Refuse to start on a corrupt store instead of showing an empty library
strict = false

[library]
# Books opened within this many days show up under "recent"
recent_days = 7
"#
        .to_string()
    }
}
