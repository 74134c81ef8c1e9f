//! ebook-shelf command line entry point.

use clap::Parser;
use ebook_shelf::{
    BookReader, BookRecord, Importer, LibraryStore, Menu,
    config::{Cli, Command, Config},
    formats::BookFormat,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ebook_shelf=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Find or load config
    let config_path = cli.config.clone().or_else(Config::find_config_file);

    let config = if let Some(ref path) = config_path {
        Config::load(path)?
    } else {
        Config::default()
    };

    let store = LibraryStore::from_config(&config);
    let importer = Importer::from_config(store.clone(), &config);

    match cli.command {
        Command::Init { force } => cmd_init(force),
        Command::Import { path } => cmd_import(&importer, &path),
        Command::List { menu } => cmd_list(&store, &menu),
        Command::Stats => cmd_stats(&store),
        Command::Read { filename } => cmd_read(&importer, &filename).await,
        Command::MarkRead { filename } => report(&filename, store.mark_read(&filename)?),
        Command::Favorite { filename } => report(&filename, store.toggle_favorite(&filename)?),
        Command::Delete { filename } => report(&filename, store.soft_delete(&filename)?),
        Command::Restore { filename } => report(&filename, store.restore(&filename)?),
        Command::Purge { filename } => match importer.purge(&filename)? {
            Some(record) => {
                println!("Purged: {}", record.filename);
                Ok(())
            }
            None => {
                println!("Book not found: {}", filename);
                Ok(())
            }
        },
        Command::Edit {
            filename,
            title,
            author,
        } => report(&filename, store.set_metadata(&filename, title, author)?),
    }
}

/// Write the default config and create storage directories.
fn cmd_init(force: bool) -> anyhow::Result<()> {
    let config_path = PathBuf::from("config.toml");

    if config_path.exists() && !force {
        anyhow::bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(&config_path, Config::generate_default())?;
    println!("Created config file: {}", config_path.display());

    let config = Config::default();
    if let Some(parent) = config.storage.data_file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::create_dir_all(&config.storage.ebooks_dir)?;
    println!(
        "Created storage: {} and {}",
        config.storage.data_file.display(),
        config.storage.ebooks_dir.display()
    );

    println!("\nImport a book with: ebook-shelf import /path/to/book.epub");

    Ok(())
}

fn cmd_import(importer: &Importer, path: &Path) -> anyhow::Result<()> {
    if BookFormat::from_path(path).is_none() {
        anyhow::bail!("Only .txt and .epub files can be imported: {}", path.display());
    }

    let record = importer.import_file(path)?;
    println!("Imported: {} ({})", record.title, record.filename);
    Ok(())
}

fn cmd_list(store: &LibraryStore, menu: &str) -> anyhow::Result<()> {
    let menu = Menu::from(menu);
    let books = store.filter_by(menu)?;

    if books.is_empty() {
        println!("No books in {}.", menu);
        return Ok(());
    }

    println!("{:<40} {:<30} {:<5} {:<5} LAST READ", "FILENAME", "TITLE", "READ", "FAV");
    println!("{}", "-".repeat(100));
    for book in books {
        let last_read = book
            .last_read_at()
            .map(|ts| {
                ts.with_timezone(&chrono::Local)
                    .format("%Y-%m-%d %H:%M")
                    .to_string()
            })
            .unwrap_or_else(|| "never".to_string());
        println!(
            "{:<40} {:<30} {:<5} {:<5} {}",
            book.filename,
            book.title,
            if book.is_read { "yes" } else { "no" },
            if book.is_favorite { "yes" } else { "no" },
            last_read
        );
    }

    Ok(())
}

fn cmd_stats(store: &LibraryStore) -> anyhow::Result<()> {
    let stats = store.stats()?;

    for menu in Menu::ALL {
        println!("{:<10} {}", menu, stats.get(menu));
    }

    Ok(())
}

/// Print a book's content; a read error is printed in place of the content.
async fn cmd_read(importer: &Importer, filename: &str) -> anyhow::Result<()> {
    let reader = BookReader::new(importer);
    let handle = reader.spawn_open(filename);
    let cancel = handle.cancellation_token();

    tokio::select! {
        content = handle.content() => {
            if let Some(text) = content {
                println!("{}", text);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            cancel.cancel();
            tracing::info!(filename, "Reading interrupted");
        }
    }

    Ok(())
}

fn report(filename: &str, updated: Option<BookRecord>) -> anyhow::Result<()> {
    match updated {
        Some(book) => println!(
            "{}: read={} favorite={} deleted={} title=\"{}\" author=\"{}\"",
            book.filename, book.is_read, book.is_favorite, book.is_deleted, book.title, book.author
        ),
        None => println!("Book not found: {}", filename),
    }
    Ok(())
}
