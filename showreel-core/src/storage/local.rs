//! Local filesystem media store.
//!
//! Resolves resource ids to regular files directly under a configured root
//! directory.

use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::{debug, warn};

use super::{
    MediaEntry, MediaMetadata, MediaReader, MediaStore, StorageError, validate_resource_id,
};

/// Media store backed by a directory of uploaded files.
///
/// Only regular files are served; symlinks, directories and hidden entries
/// under the root are treated as absent.
#[derive(Debug, Clone)]
pub struct LocalMediaStore {
    root: PathBuf,
}

impl LocalMediaStore {
    /// Creates a store rooted at `root`. The directory is not required to
    /// exist yet; lookups simply report resources as missing.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory this store resolves ids against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, id: &str) -> Result<PathBuf, StorageError> {
        validate_resource_id(id)?;
        Ok(self.root.join(id))
    }
}

fn map_io_error(id: &str, error: std::io::Error) -> StorageError {
    if error.kind() == ErrorKind::NotFound {
        StorageError::NotFound { id: id.to_string() }
    } else {
        StorageError::Io(error)
    }
}

fn skip_vanished<T>(id: &str, result: std::io::Result<T>) -> Result<Option<T>, StorageError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("{} disappeared while listing", id);
            Ok(None)
        }
        Err(e) => Err(StorageError::Io(e)),
    }
}

fn modified_time(metadata: &std::fs::Metadata) -> Option<DateTime<Utc>> {
    metadata.modified().ok().map(DateTime::<Utc>::from)
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn stat(&self, id: &str) -> Result<MediaMetadata, StorageError> {
        let path = self.resolve(id)?;
        let metadata = tokio::fs::symlink_metadata(&path)
            .await
            .map_err(|e| map_io_error(id, e))?;

        if !metadata.is_file() {
            debug!("Refusing to serve non-regular file {}", path.display());
            return Err(StorageError::NotFound { id: id.to_string() });
        }

        Ok(MediaMetadata {
            length: metadata.len(),
            modified: modified_time(&metadata),
        })
    }

    async fn open_range(
        &self,
        id: &str,
        start: u64,
        length: u64,
    ) -> Result<MediaReader, StorageError> {
        let path = self.resolve(id)?;
        let mut file = tokio::fs::File::open(&path)
            .await
            .map_err(|e| map_io_error(id, e))?;

        if start > 0 {
            file.seek(SeekFrom::Start(start)).await?;
        }

        debug!(
            "Opened {} for bytes {}..{} ({} bytes)",
            path.display(),
            start,
            start.saturating_add(length),
            length
        );

        Ok(Box::pin(file.take(length)))
    }

    async fn list(&self) -> Result<Vec<MediaEntry>, StorageError> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("Media root {} does not exist", self.root.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(StorageError::Io(e)),
        };

        let mut items = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let Some(id) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if validate_resource_id(&id).is_err() {
                continue;
            }

            // Entries removed mid-scan are skipped, not fatal to the listing
            let Some(file_type) = skip_vanished(&id, entry.file_type().await)? else {
                continue;
            };
            if !file_type.is_file() {
                continue;
            }
            let Some(metadata) = skip_vanished(&id, entry.metadata().await)? else {
                continue;
            };

            items.push(MediaEntry {
                id,
                length: metadata.len(),
                modified: modified_time(&metadata),
            });
        }

        items.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::AsyncReadExt;

    use super::*;
    use crate::storage::test_fixtures::{create_media_library, patterned_bytes};

    #[tokio::test]
    async fn test_stat_reports_length() {
        let (_dir, root) = create_media_library(&[("clip.mp4", patterned_bytes(1000))]);
        let store = LocalMediaStore::new(root);

        let metadata = store.stat("clip.mp4").await.unwrap();
        assert_eq!(metadata.length, 1000);
        assert!(metadata.modified.is_some());
        assert!(store.exists("clip.mp4").await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_resource() {
        let (_dir, root) = create_media_library(&[]);
        let store = LocalMediaStore::new(root);

        assert!(matches!(
            store.stat("missing.mp4").await,
            Err(StorageError::NotFound { .. })
        ));
        assert!(!store.exists("missing.mp4").await.unwrap());
        assert!(matches!(
            store.open_range("missing.mp4", 0, 10).await,
            Err(StorageError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_directories_are_not_served() {
        let (_dir, root) = create_media_library(&[]);
        std::fs::create_dir(root.join("nested.mp4")).unwrap();
        let store = LocalMediaStore::new(root);

        assert!(matches!(
            store.stat("nested.mp4").await,
            Err(StorageError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_traversal_never_touches_filesystem() {
        let (dir, root) = create_media_library(&[]);
        std::fs::write(dir.path().join("secret.txt"), b"secret").unwrap();
        let store = LocalMediaStore::new(root);

        assert!(matches!(
            store.stat("../secret.txt").await,
            Err(StorageError::InvalidId { .. })
        ));
        assert!(matches!(
            store.open_range("../secret.txt", 0, 6).await,
            Err(StorageError::InvalidId { .. })
        ));
    }

    #[tokio::test]
    async fn test_open_range_reads_exact_span() {
        let data = patterned_bytes(1000);
        let (_dir, root) = create_media_library(&[("clip.mp4", data.clone())]);
        let store = LocalMediaStore::new(root);

        let mut reader = store.open_range("clip.mp4", 200, 300).await.unwrap();
        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer).await.unwrap();

        assert_eq!(buffer, data[200..500]);
    }

    #[tokio::test]
    async fn test_list_skips_hidden_and_directories() {
        let (_dir, root) = create_media_library(&[
            ("b.mp4", vec![0u8; 20]),
            ("a.mp4", vec![0u8; 10]),
            (".partial.mp4", vec![0u8; 5]),
        ]);
        std::fs::create_dir(root.join("thumbnails")).unwrap();
        let store = LocalMediaStore::new(root);

        let items = store.list().await.unwrap();
        let ids: Vec<&str> = items.iter().map(|item| item.id.as_str()).collect();
        assert_eq!(ids, vec!["a.mp4", "b.mp4"]);
        assert_eq!(items[0].length, 10);
        assert_eq!(items[1].length, 20);
    }

    #[tokio::test]
    async fn test_list_missing_root_is_empty() {
        let store = LocalMediaStore::new("/nonexistent/showreel/videos");
        assert!(store.list().await.unwrap().is_empty());
    }

    #[test]
    fn test_entries_vanishing_mid_listing_are_skipped() {
        let gone = std::io::Error::from(ErrorKind::NotFound);
        assert!(matches!(skip_vanished::<u64>("gone.mp4", Err(gone)), Ok(None)));

        let denied = std::io::Error::from(ErrorKind::PermissionDenied);
        assert!(matches!(
            skip_vanished::<u64>("locked.mp4", Err(denied)),
            Err(StorageError::Io(_))
        ));

        assert!(matches!(skip_vanished("clip.mp4", Ok(7u64)), Ok(Some(7))));
    }
}
