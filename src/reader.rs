//! Opening books for the reading view.

use crate::formats;
use crate::import::Importer;
use crate::library::LibraryStore;
use std::path::PathBuf;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Reads managed books and records when they were opened.
#[derive(Clone)]
pub struct BookReader {
    store: LibraryStore,
    ebooks_dir: PathBuf,
}

impl BookReader {
    /// Create a reader over the importer's store and managed directory.
    pub fn new(importer: &Importer) -> Self {
        Self {
            store: importer.store().clone(),
            ebooks_dir: importer.ebooks_dir().to_path_buf(),
        }
    }

    /// Content of `filename` for display, stamping its `last_read`.
    ///
    /// Always returns something to show: the text, or an error message.
    pub fn open(&self, filename: &str) -> String {
        let text = formats::read_for_display(&self.ebooks_dir.join(filename));
        self.stamp(filename);
        text
    }

    /// Run [`BookReader::open`] on the blocking pool.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn_open(&self, filename: &str) -> ReadHandle {
        let token = CancellationToken::new();
        let reader = self.clone();
        let filename = filename.to_string();
        let task_token = token.clone();

        let task = tokio::task::spawn_blocking(move || {
            let text = formats::read_for_display(&reader.ebooks_dir.join(&filename));
            if task_token.is_cancelled() {
                tracing::debug!(filename = %filename, "Read abandoned");
                return None;
            }
            reader.stamp(&filename);
            Some(text)
        });

        ReadHandle { token, task }
    }

    fn stamp(&self, filename: &str) {
        if let Err(e) = self.store.touch(filename) {
            tracing::warn!(filename, error = %e, "Failed to record last read time");
        }
    }
}

/// A read running off the calling thread.
pub struct ReadHandle {
    token: CancellationToken,
    task: JoinHandle<Option<String>>,
}

impl ReadHandle {
    /// Abandon the result. The underlying file read is left to finish.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Token that abandons this read when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Whether the read was abandoned.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait for the content; `None` if the read was abandoned.
    pub async fn content(self) -> Option<String> {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => None,
            result = self.task => match result {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!(error = %e, "Read task failed");
                    None
                }
            },
        }
    }
}
