//! Whole-document JSON persistence.
//!
//! Every mutation persists the full document (no per-channel files, no
//! journal): the in-memory state is authoritative between writes and the
//! last completed write wins. Loading is self-healing -- a missing, empty or
//! corrupt file falls back to a freshly seeded document which is persisted
//! immediately.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::error::StoreError;

/// Serialize a document and write it to disk in one shot.
pub async fn write_document<T: Serialize>(path: &Path, document: &T) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec(document)?;
    tokio::fs::write(path, bytes).await?;
    Ok(())
}

/// Load a JSON document, falling back to `seed` when the file is missing or
/// unreadable. The fallback is persisted right away so the next start finds
/// a valid file.
pub async fn load_or_seed<T>(path: &Path, seed: impl FnOnce() -> T) -> T
where
    T: Serialize + DeserializeOwned,
{
    match tokio::fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(document) => {
                info!(path = %path.display(), "loaded persisted document");
                document
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "corrupt document, reseeding");
                seed_and_persist(path, seed).await
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "no persisted document, seeding");
            seed_and_persist(path, seed).await
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "unreadable document, reseeding");
            seed_and_persist(path, seed).await
        }
    }
}

async fn seed_and_persist<T: Serialize>(path: &Path, seed: impl FnOnce() -> T) -> T {
    let document = seed();
    if let Err(e) = write_document(path, &document).await {
        error!(path = %path.display(), error = %e, "failed to persist seeded document");
    }
    document
}

/// Handle to a background writer task for one document file.
///
/// Mutating code enqueues a snapshot of the document and moves on; the task
/// owns all disk I/O. Enqueueing never blocks and write failures are logged,
/// never surfaced -- durability here is best-effort by design.
#[derive(Debug, Clone)]
pub struct DocumentWriter<T> {
    tx: mpsc::UnboundedSender<T>,
}

impl<T> DocumentWriter<T>
where
    T: Serialize + Send + Sync + 'static,
{
    /// Spawn the writer task for `path`.
    pub fn spawn(path: PathBuf) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<T>();

        tokio::spawn(async move {
            while let Some(mut document) = rx.recv().await {
                // Coalesce bursts: only the newest snapshot matters, every
                // earlier one would be overwritten immediately anyway.
                while let Ok(newer) = rx.try_recv() {
                    document = newer;
                }

                match write_document(&path, &document).await {
                    Ok(()) => debug!(path = %path.display(), "persisted document"),
                    Err(e) => {
                        error!(path = %path.display(), error = %e, "failed to persist document");
                    }
                }
            }
        });

        Self { tx }
    }

    /// Queue a snapshot for writing. Fire-and-forget.
    pub fn enqueue(&self, document: T) {
        // Send only fails if the writer task is gone; the in-memory state
        // stays authoritative either way.
        let _ = self.tx.send(document);
    }
}
