//! Test fixtures for storage and streaming tests.
//!
//! Provides temporary media libraries on disk and an in-memory store that
//! records how often it was asked to open resources.

use std::collections::HashMap;
use std::io::{Cursor, ErrorKind};
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use super::{
    MediaEntry, MediaMetadata, MediaReader, MediaStore, StorageError, validate_resource_id,
};

/// Deterministic, non-repeating-at-256 byte pattern so misplaced slices are
/// detected by content comparison.
pub fn patterned_bytes(length: usize) -> Vec<u8> {
    (0..length).map(|i| (i % 251) as u8).collect()
}

/// Creates a temporary media root populated with `files`.
///
/// # Panics
///
/// Panics if the temporary directory or any file cannot be created.
/// This is acceptable in test fixtures where failures indicate environment issues.
pub fn create_media_library(files: &[(&str, Vec<u8>)]) -> (tempfile::TempDir, PathBuf) {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path().join("videos");
    std::fs::create_dir_all(&root).unwrap();

    for (name, data) in files {
        std::fs::write(root.join(name), data).unwrap();
    }

    (temp_dir, root)
}

/// In-memory media store with injectable open failures.
#[derive(Debug, Default)]
pub struct InMemoryMediaStore {
    files: RwLock<HashMap<String, Bytes>>,
    open_count: AtomicUsize,
    open_failure: Mutex<Option<ErrorKind>>,
}

impl InMemoryMediaStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a resource.
    pub async fn insert(&self, id: &str, data: impl Into<Bytes>) {
        self.files.write().await.insert(id.to_string(), data.into());
    }

    /// Number of `open_range` calls that reached the store.
    pub fn open_count(&self) -> usize {
        self.open_count.load(Ordering::SeqCst)
    }

    /// Makes every subsequent `open_range` fail with `kind`.
    ///
    /// `ErrorKind::NotFound` simulates a resource deleted between lookup
    /// and open.
    ///
    /// # Panics
    ///
    /// Panics if the failure lock is poisoned.
    pub fn fail_opens_with(&self, kind: ErrorKind) {
        *self.open_failure.lock().unwrap() = Some(kind);
    }
}

#[async_trait]
impl MediaStore for InMemoryMediaStore {
    async fn stat(&self, id: &str) -> Result<MediaMetadata, StorageError> {
        validate_resource_id(id)?;
        let files = self.files.read().await;
        files
            .get(id)
            .map(|data| MediaMetadata {
                length: data.len() as u64,
                modified: None,
            })
            .ok_or_else(|| StorageError::NotFound { id: id.to_string() })
    }

    async fn open_range(
        &self,
        id: &str,
        start: u64,
        length: u64,
    ) -> Result<MediaReader, StorageError> {
        validate_resource_id(id)?;
        self.open_count.fetch_add(1, Ordering::SeqCst);

        let failure = *self.open_failure.lock().unwrap();
        match failure {
            Some(ErrorKind::NotFound) => {
                return Err(StorageError::NotFound { id: id.to_string() });
            }
            Some(kind) => return Err(StorageError::Io(std::io::Error::from(kind))),
            None => {}
        }

        let files = self.files.read().await;
        let data = files
            .get(id)
            .ok_or_else(|| StorageError::NotFound { id: id.to_string() })?;

        let size = data.len() as u64;
        let begin = start.min(size) as usize;
        let end = start.saturating_add(length).min(size) as usize;
        Ok(Box::pin(Cursor::new(data.slice(begin..end))))
    }

    async fn list(&self) -> Result<Vec<MediaEntry>, StorageError> {
        let files = self.files.read().await;
        let mut items: Vec<MediaEntry> = files
            .iter()
            .map(|(id, data)| MediaEntry {
                id: id.clone(),
                length: data.len() as u64,
                modified: None,
            })
            .collect();
        items.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::AsyncReadExt;

    use super::*;

    #[test]
    fn test_media_library_layout() {
        let (_temp_dir, root) = create_media_library(&[("clip.mp4", patterned_bytes(10))]);

        assert!(root.is_dir());
        assert_eq!(std::fs::read(root.join("clip.mp4")).unwrap().len(), 10);
    }

    #[tokio::test]
    async fn test_in_memory_store_counts_opens() {
        let store = InMemoryMediaStore::new();
        store.insert("clip.mp4", patterned_bytes(100)).await;

        let mut reader = store.open_range("clip.mp4", 90, 50).await.unwrap();
        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer).await.unwrap();

        assert_eq!(buffer.len(), 10);
        assert_eq!(store.open_count(), 1);
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let store = InMemoryMediaStore::new();
        store.insert("clip.mp4", patterned_bytes(100)).await;

        store.fail_opens_with(ErrorKind::NotFound);
        assert!(matches!(
            store.open_range("clip.mp4", 0, 1).await,
            Err(StorageError::NotFound { .. })
        ));

        store.fail_opens_with(ErrorKind::PermissionDenied);
        assert!(matches!(
            store.open_range("clip.mp4", 0, 1).await,
            Err(StorageError::Io(_))
        ));
    }
}
