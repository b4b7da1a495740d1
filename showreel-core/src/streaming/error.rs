//! Media serving errors and their HTTP representation.

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;

use super::range::RangeParseError;
use crate::storage::StorageError;

/// Errors produced while serving a media request.
///
/// Every variant maps to exactly one status code and a JSON body of the
/// form `{"status": "error", "message": ...}`; server-side failures add an
/// `error` field with the underlying cause.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    /// Resource absent at lookup time
    #[error("Video {id} not found")]
    NotFound {
        /// Requested resource id
        id: String,
    },

    /// Resource id could escape the storage root
    #[error("Invalid video id {id:?}: {reason}")]
    InvalidId {
        /// Rejected resource id
        id: String,
        /// Which rule the id broke
        reason: &'static str,
    },

    /// `Range` header did not match `bytes=<start>-[<end>]`
    #[error("Malformed range header {header:?}: {reason}")]
    MalformedRange {
        /// Raw header value
        header: String,
        /// Length of the addressed resource
        length: u64,
        /// Parse failure
        reason: RangeParseError,
    },

    /// Range parsed but falls outside the resource
    #[error("Range {start}-{} not satisfiable for {length} bytes", .end.map(|e| e.to_string()).unwrap_or_default())]
    RangeNotSatisfiable {
        /// Requested first byte
        start: u64,
        /// Requested last byte, if given
        end: Option<u64>,
        /// Length of the addressed resource
        length: u64,
    },

    /// Resource existed at lookup but was gone when opened
    #[error("Video {id} was removed before it could be opened")]
    Vanished {
        /// Requested resource id
        id: String,
    },

    /// Storage failure after the existence check
    #[error("Storage failure for {id}: {source}")]
    Storage {
        /// Requested resource id
        id: String,
        /// Underlying storage error
        source: StorageError,
    },
}

impl MediaError {
    /// Maps a storage lookup failure for `id` onto the media taxonomy.
    pub fn from_storage(id: &str, error: StorageError) -> Self {
        match error {
            StorageError::NotFound { .. } => MediaError::NotFound { id: id.to_string() },
            StorageError::InvalidId { reason, .. } => MediaError::InvalidId {
                id: id.to_string(),
                reason,
            },
            source => MediaError::Storage {
                id: id.to_string(),
                source,
            },
        }
    }

    /// HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            MediaError::NotFound { .. } => StatusCode::NOT_FOUND,
            MediaError::InvalidId { .. } => StatusCode::BAD_REQUEST,
            MediaError::MalformedRange { .. } | MediaError::RangeNotSatisfiable { .. } => {
                StatusCode::RANGE_NOT_SATISFIABLE
            }
            MediaError::Vanished { .. } | MediaError::Storage { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message exposed to clients in the `message` field.
    pub fn public_message(&self) -> &'static str {
        match self {
            MediaError::NotFound { .. } => "Video not found",
            MediaError::InvalidId { .. } => "Invalid video id",
            MediaError::MalformedRange { .. } | MediaError::RangeNotSatisfiable { .. } => {
                "Requested range not satisfiable"
            }
            MediaError::Vanished { .. } | MediaError::Storage { .. } => "Error streaming video",
        }
    }

    /// Total resource length, when it was known at failure time.
    fn known_length(&self) -> Option<u64> {
        match self {
            MediaError::MalformedRange { length, .. }
            | MediaError::RangeNotSatisfiable { length, .. } => Some(*length),
            _ => None,
        }
    }
}

impl IntoResponse for MediaError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = if status.is_server_error() {
            json!({
                "status": "error",
                "message": self.public_message(),
                "error": self.to_string(),
            })
        } else {
            json!({
                "status": "error",
                "message": self.public_message(),
            })
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(length) = self.known_length()
            && let Ok(value) = HeaderValue::from_str(&format!("bytes */{length}"))
        {
            response.headers_mut().insert(header::CONTENT_RANGE, value);
        }
        response
    }
}
