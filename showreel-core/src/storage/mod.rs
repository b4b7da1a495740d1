//! Storage layer for uploaded media.
//!
//! Defines the storage interface the streaming responder reads from, with a
//! local-filesystem implementation. Resource creation and deletion belong to
//! the upload pipeline; this layer only looks resources up and reads them.

pub mod local;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_fixtures;

use std::pin::Pin;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
pub use local::LocalMediaStore;
use serde::Serialize;
use tokio::io::AsyncRead;

/// Longest resource id accepted, matching common filesystem name limits.
const MAX_RESOURCE_ID_LEN: usize = 255;

/// Byte reader over one span of a media resource.
///
/// Yields exactly the requested span unless the underlying resource shrinks
/// while it is being read.
pub type MediaReader = Pin<Box<dyn AsyncRead + Send>>;

/// Metadata describing a stored media resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaMetadata {
    /// Total size in bytes
    pub length: u64,
    /// Last modification time, when the backend tracks it
    pub modified: Option<DateTime<Utc>>,
}

/// Library listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaEntry {
    pub id: String,
    pub length: u64,
    pub modified: Option<DateTime<Utc>>,
}

/// Read-only access to stored media resources.
///
/// Implementations must be safe for concurrent reads of the same resource.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Checks whether a resource exists.
    ///
    /// # Errors
    ///
    /// - `StorageError::InvalidId` - If `id` could escape the storage root
    /// - `StorageError::Io` - If the lookup itself failed
    async fn exists(&self, id: &str) -> Result<bool, StorageError> {
        match self.stat(id).await {
            Ok(_) => Ok(true),
            Err(StorageError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Looks up metadata for a resource.
    ///
    /// # Errors
    ///
    /// - `StorageError::NotFound` - If no resource has this id
    /// - `StorageError::InvalidId` - If `id` could escape the storage root
    /// - `StorageError::Io` - If the lookup itself failed
    async fn stat(&self, id: &str) -> Result<MediaMetadata, StorageError>;

    /// Opens a reader over `length` bytes starting at byte `start`.
    ///
    /// # Errors
    ///
    /// - `StorageError::NotFound` - If the resource no longer exists
    /// - `StorageError::InvalidId` - If `id` could escape the storage root
    /// - `StorageError::Io` - If opening or seeking failed
    async fn open_range(
        &self,
        id: &str,
        start: u64,
        length: u64,
    ) -> Result<MediaReader, StorageError>;

    /// Lists all servable resources, sorted by id.
    ///
    /// # Errors
    ///
    /// - `StorageError::Io` - If the library could not be enumerated
    async fn list(&self) -> Result<Vec<MediaEntry>, StorageError>;
}

/// Errors that occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No resource exists under this id
    #[error("Media resource {id} not found")]
    NotFound {
        /// Requested resource id
        id: String,
    },

    /// The id is not a plain file name inside the storage root
    #[error("Invalid media id {id:?}: {reason}")]
    InvalidId {
        /// Rejected resource id
        id: String,
        /// Which rule the id broke
        reason: &'static str,
    },

    /// Standard I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Validates that `id` names a single visible entry of the storage root.
///
/// # Errors
///
/// - `StorageError::InvalidId` - If the id is empty, too long, hidden, or
///   contains a path separator or NUL byte
pub fn validate_resource_id(id: &str) -> Result<(), StorageError> {
    let reason = if id.is_empty() {
        Some("empty id")
    } else if id.len() > MAX_RESOURCE_ID_LEN {
        Some("id too long")
    } else if id.contains(['/', '\\', '\0']) {
        Some("path separators are not allowed")
    } else if id.starts_with('.') {
        Some("hidden or relative names are not allowed")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(StorageError::InvalidId {
            id: id.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_file_names_are_valid() {
        assert!(validate_resource_id("clip.mp4").is_ok());
        assert!(validate_resource_id("event 2024 - highlights.mp4").is_ok());
        assert!(validate_resource_id("a..b.mp4").is_ok());
    }

    #[test]
    fn test_traversal_attempts_are_rejected() {
        for id in ["", ".", "..", "../secret", "a/b.mp4", "..\\win.ini", ".env", "x\0y"] {
            assert!(
                matches!(
                    validate_resource_id(id),
                    Err(StorageError::InvalidId { .. })
                ),
                "{id:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_overlong_ids_are_rejected() {
        let id = "a".repeat(MAX_RESOURCE_ID_LEN + 1);
        assert!(validate_resource_id(&id).is_err());
        assert!(validate_resource_id(&id[1..]).is_ok());
    }
}
