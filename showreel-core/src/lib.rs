//! Showreel Core - media storage and range-request streaming
//!
//! This crate provides the building blocks of the Showreel media backend:
//! configuration, a storage abstraction over the uploaded video library,
//! HTTP `Range` parsing, and the responder that turns a resource id plus an
//! optional range into a streaming HTTP response.

pub mod config;
pub mod storage;
pub mod streaming;
pub mod tracing_setup;

// Re-export main types for convenient access
pub use config::{MediaConfig, RangePolicy, ServerConfig, ShowreelConfig};
pub use storage::{LocalMediaStore, MediaEntry, MediaMetadata, MediaStore, StorageError};
pub use streaming::{MediaError, MediaResponder, RangeSpec};

/// Core errors that can bubble up from any Showreel subsystem.
///
/// High-level error types representing failures in core functionality.
#[derive(Debug, thiserror::Error)]
pub enum ShowreelError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ShowreelError {
    /// Returns a user-friendly error message suitable for display.
    pub fn user_message(&self) -> String {
        match self {
            ShowreelError::Storage(StorageError::NotFound { id }) => {
                format!("Video {id} not found")
            }
            ShowreelError::Storage(StorageError::InvalidId { id, .. }) => {
                format!("Invalid video id: {id}")
            }
            ShowreelError::Storage(_) => "Storage error occurred".to_string(),
            ShowreelError::Media(e) => e.public_message().to_string(),
            ShowreelError::Configuration { reason } => format!("Configuration error: {reason}"),
            ShowreelError::Io(_) => "File system error occurred".to_string(),
        }
    }

    /// Checks if this error is due to user input validation.
    pub fn is_user_error(&self) -> bool {
        match self {
            ShowreelError::Configuration { .. }
            | ShowreelError::Storage(StorageError::InvalidId { .. }) => true,
            ShowreelError::Media(e) => e.status_code().is_client_error(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ShowreelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_for_missing_video() {
        let error = ShowreelError::from(StorageError::NotFound {
            id: "clip.mp4".to_string(),
        });
        assert_eq!(error.user_message(), "Video clip.mp4 not found");
        assert!(!error.is_user_error());
    }

    #[test]
    fn test_configuration_errors_are_user_errors() {
        let error = ShowreelError::Configuration {
            reason: "media root missing".to_string(),
        };
        assert!(error.is_user_error());
        assert_eq!(
            error.user_message(),
            "Configuration error: media root missing"
        );
    }

    #[test]
    fn test_range_errors_are_user_errors() {
        let error = ShowreelError::from(MediaError::MalformedRange {
            header: "items=0-1".to_string(),
            length: 10,
            reason: streaming::RangeParseError::UnsupportedUnit {
                unit: "items".to_string(),
            },
        });
        assert!(error.is_user_error());
    }
}
