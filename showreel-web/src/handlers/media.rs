//! Media streaming handlers
//!
//! Thin adapters from axum extractors onto [`MediaResponder`]; all range
//! and error semantics live in `showreel-core`.
//!
//! [`MediaResponder`]: showreel_core::MediaResponder

use std::borrow::Cow;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, header};
use axum::response::Response;

use crate::server::AppState;

/// Streams a video, honouring a `Range` header when present.
pub async fn stream_media(
    State(state): State<AppState>,
    Path(resource_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let range = extract_range_header(&headers);
    state
        .responder
        .serve(&resource_id, range.as_deref())
        .await
}

/// Answers `HEAD` with the headers `GET` would send, without opening the file.
pub async fn stream_media_headers(
    State(state): State<AppState>,
    Path(resource_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let range = extract_range_header(&headers);
    state
        .responder
        .serve_headers(&resource_id, range.as_deref())
        .await
}

/// Extract the `Range` header value.
///
/// Non-UTF-8 bytes are replaced rather than dropped so a garbled header is
/// still rejected as malformed instead of silently serving the full file.
pub fn extract_range_header(headers: &HeaderMap) -> Option<Cow<'_, str>> {
    headers
        .get(header::RANGE)
        .map(|value| String::from_utf8_lossy(value.as_bytes()))
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_extract_range_header() {
        let mut headers = HeaderMap::new();
        assert!(extract_range_header(&headers).is_none());

        headers.insert(header::RANGE, HeaderValue::from_static("bytes=0-99"));
        assert_eq!(extract_range_header(&headers).as_deref(), Some("bytes=0-99"));
    }

    #[test]
    fn test_extract_non_utf8_range_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::RANGE,
            HeaderValue::from_bytes(b"bytes=\xff-1").unwrap(),
        );

        let value = extract_range_header(&headers).unwrap();
        assert!(value.starts_with("bytes="));
        assert!(value.contains('\u{FFFD}'));
    }
}
