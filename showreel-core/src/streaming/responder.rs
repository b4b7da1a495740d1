//! Range-request media responder.
//!
//! Resolves a resource id against a [`MediaStore`], applies an optional
//! `Range` header and produces either a full (200) or partial (206)
//! streaming response.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use tracing::{debug, error};

use super::MediaError;
use super::body::media_body_stream;
use super::range::{ByteRange, RangeSpec};
use crate::config::MediaConfig;
use crate::storage::{MediaStore, StorageError};

/// What a request resolved to before any byte is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ServePlan {
    length: u64,
    range: Option<ByteRange>,
}

impl ServePlan {
    /// Offset and byte count to read from storage.
    fn span(&self) -> (u64, u64) {
        match self.range {
            Some(range) => (range.start, range.len()),
            None => (0, self.length),
        }
    }
}

/// Serves media resources with HTTP range semantics.
///
/// Holds no per-request state; one responder is shared by all handlers.
#[derive(Clone)]
pub struct MediaResponder {
    store: Arc<dyn MediaStore>,
    config: MediaConfig,
}

impl MediaResponder {
    /// Creates a responder reading from `store`.
    pub fn new(store: Arc<dyn MediaStore>, config: MediaConfig) -> Self {
        Self { store, config }
    }

    /// Storage backend this responder reads from.
    pub fn store(&self) -> &Arc<dyn MediaStore> {
        &self.store
    }

    /// Media configuration in effect.
    pub fn config(&self) -> &MediaConfig {
        &self.config
    }

    /// Serves `resource_id`, honouring `range_header` when present.
    ///
    /// Failures are converted to their JSON error responses; nothing is
    /// opened unless the resource exists and the range is satisfiable.
    pub async fn serve(&self, resource_id: &str, range_header: Option<&str>) -> Response {
        match self.try_serve(resource_id, range_header).await {
            Ok(response) => response,
            Err(e) => self.reject(resource_id, e),
        }
    }

    /// Like [`serve`](Self::serve) but never opens the resource; the
    /// response carries the headers a `GET` would and an empty body.
    pub async fn serve_headers(&self, resource_id: &str, range_header: Option<&str>) -> Response {
        match self.plan(resource_id, range_header).await {
            Ok(plan) => self.build_response(plan, Body::empty()),
            Err(e) => self.reject(resource_id, e),
        }
    }

    /// Serves a request, returning the error instead of its response.
    ///
    /// # Errors
    ///
    /// - `MediaError::NotFound` - Resource absent; no stream was opened
    /// - `MediaError::InvalidId` - Id could escape the storage root
    /// - `MediaError::MalformedRange` / `RangeNotSatisfiable` - Bad range
    /// - `MediaError::Vanished` - Resource removed between lookup and open
    /// - `MediaError::Storage` - I/O failure after the existence check
    pub async fn try_serve(
        &self,
        resource_id: &str,
        range_header: Option<&str>,
    ) -> Result<Response, MediaError> {
        let plan = self.plan(resource_id, range_header).await?;
        let (start, length) = plan.span();

        // Narrow race with deletion between stat and open; reported, not masked
        let reader = self
            .store
            .open_range(resource_id, start, length)
            .await
            .map_err(|e| match e {
                StorageError::NotFound { .. } => MediaError::Vanished {
                    id: resource_id.to_string(),
                },
                other => MediaError::from_storage(resource_id, other),
            })?;

        let stream = media_body_stream(reader, length, self.config.chunk_size, resource_id);
        Ok(self.build_response(plan, Body::from_stream(stream)))
    }

    async fn plan(
        &self,
        resource_id: &str,
        range_header: Option<&str>,
    ) -> Result<ServePlan, MediaError> {
        let metadata = self
            .store
            .stat(resource_id)
            .await
            .map_err(|e| MediaError::from_storage(resource_id, e))?;
        let length = metadata.length;

        let range = match range_header {
            None => None,
            Some(header) => {
                let spec = RangeSpec::parse(header).map_err(|reason| MediaError::MalformedRange {
                    header: header.to_string(),
                    length,
                    reason,
                })?;
                Some(spec.resolve(length, self.config.range_policy)?)
            }
        };

        debug!(
            "Serving {} ({} bytes), range={:?}",
            resource_id, length, range
        );

        Ok(ServePlan { length, range })
    }

    fn build_response(&self, plan: ServePlan, body: Body) -> Response {
        let mut response = Response::builder()
            .header(header::CONTENT_TYPE, self.config.content_type.as_str())
            .header(header::ACCEPT_RANGES, "bytes");

        response = match plan.range {
            Some(range) => response
                .status(StatusCode::PARTIAL_CONTENT)
                .header(header::CONTENT_RANGE, range.content_range(plan.length))
                .header(header::CONTENT_LENGTH, range.len().to_string()),
            None => response
                .status(StatusCode::OK)
                .header(header::CONTENT_LENGTH, plan.length.to_string()),
        };

        response.body(body).unwrap_or_else(|e| {
            error!("Failed to build media response: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        })
    }

    fn reject(&self, resource_id: &str, error: MediaError) -> Response {
        if error.status_code().is_server_error() {
            error!("Failed to serve {}: {}", resource_id, error);
        } else {
            debug!("Rejected request for {}: {}", resource_id, error);
        }
        error.into_response()
    }
}
