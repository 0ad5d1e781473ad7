//! Media upload storage.
//!
//! Uploaded blobs land as files under the uploads directory and are served
//! back at `/uploads/<name>`; the chat core treats the resulting URL as an
//! opaque string in a message's `media` field.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ServerError;

#[derive(Debug, Clone)]
pub struct UploadStore {
    base_path: PathBuf,
    max_size: usize,
}

impl UploadStore {
    pub async fn new(base_path: PathBuf, max_size: usize) -> Result<Self, ServerError> {
        fs::create_dir_all(&base_path).await.map_err(|e| {
            ServerError::UploadStorage(format!(
                "Failed to create uploads directory '{}': {}",
                base_path.display(),
                e
            ))
        })?;

        info!(path = %base_path.display(), "Upload store initialized");

        Ok(Self {
            base_path,
            max_size,
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Store an uploaded blob and return the generated file name.
    ///
    /// The name is a fresh UUID plus a sanitized copy of the original
    /// extension, so nothing client-controlled ever reaches the filesystem
    /// as a path.
    pub async fn store_media(
        &self,
        data: &[u8],
        original_name: Option<&str>,
    ) -> Result<String, ServerError> {
        if data.is_empty() {
            return Err(ServerError::BadRequest("Empty upload".to_string()));
        }
        if data.len() > self.max_size {
            return Err(ServerError::UploadTooLarge {
                size: data.len(),
                max: self.max_size,
            });
        }

        let ext = original_name.map(sanitize_extension).unwrap_or_default();
        let file_name = if ext.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            format!("{}.{}", Uuid::new_v4(), ext)
        };

        let path = self.base_path.join(&file_name);
        fs::write(&path, data).await.map_err(|e| {
            ServerError::UploadStorage(format!("Failed to write upload {}: {}", file_name, e))
        })?;

        debug!(file = %file_name, size = data.len(), "Stored upload");
        Ok(file_name)
    }
}

/// Lower-cased alphanumeric extension of an uploaded file name, or empty.
fn sanitize_extension(original_name: &str) -> String {
    Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            e.chars()
                .filter(char::is_ascii_alphanumeric)
                .flat_map(char::to_lowercase)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn test_store() -> (UploadStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = UploadStore::new(dir.path().to_path_buf(), 1024 * 1024)
            .await
            .unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn test_store_keeps_extension() {
        let (store, _dir) = test_store().await;
        let name = store
            .store_media(b"png-bytes", Some("holiday.PNG"))
            .await
            .unwrap();
        assert!(name.ends_with(".png"));
        assert!(store.base_path().join(&name).exists());
    }

    #[tokio::test]
    async fn test_traversal_characters_are_stripped() {
        let (store, _dir) = test_store().await;
        let name = store
            .store_media(b"data", Some("../../etc/passwd"))
            .await
            .unwrap();
        assert!(!name.contains('/'));
        assert!(!name.contains(".."));
    }

    #[tokio::test]
    async fn test_empty_upload_rejected() {
        let (store, _dir) = test_store().await;
        assert!(store.store_media(b"", Some("x.png")).await.is_err());
    }

    #[tokio::test]
    async fn test_oversized_upload_rejected() {
        let dir = TempDir::new().unwrap();
        let store = UploadStore::new(dir.path().to_path_buf(), 4).await.unwrap();
        assert!(matches!(
            store.store_media(b"too big", Some("x.bin")).await,
            Err(ServerError::UploadTooLarge { .. })
        ));
    }

    #[test]
    fn test_sanitize_extension() {
        assert_eq!(sanitize_extension("movie.MP4"), "mp4");
        assert_eq!(sanitize_extension("noext"), "");
        assert_eq!(sanitize_extension("archive.tar.gz"), "gz");
    }
}
