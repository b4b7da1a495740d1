//! Shared helpers for router-level tests

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, Bytes, to_bytes};
use axum::http::{HeaderMap, Request, StatusCode, header};
use showreel_core::config::ShowreelConfig;
use showreel_core::storage::test_fixtures::create_media_library;
use showreel_core::{LocalMediaStore, MediaStore};
use showreel_web::{AppState, build_router};
use tempfile::TempDir;
use tower::ServiceExt;

/// Response parts collected for assertions.
pub struct Collected {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Collected {
    pub fn header(&self, name: header::HeaderName) -> &str {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

/// Router over a temporary library holding `files`.
pub fn library_router(files: &[(&str, Vec<u8>)]) -> (TempDir, Router) {
    let (dir, root) = create_media_library(files);
    let config = ShowreelConfig::for_testing(root);
    (dir, build_router(AppState::new(&config)))
}

/// Router over a caller-supplied store, with test configuration.
pub fn store_router(store: Arc<dyn MediaStore>, root: std::path::PathBuf) -> Router {
    let config = ShowreelConfig::for_testing(root);
    build_router(AppState::with_store(store, config.media))
}

/// Local store for `root`, boxed as a trait object.
pub fn local_store(root: std::path::PathBuf) -> Arc<dyn MediaStore> {
    Arc::new(LocalMediaStore::new(root))
}

/// Sends a GET for `uri` with an optional `Range` header.
pub async fn get(router: Router, uri: &str, range: Option<&str>) -> Collected {
    let mut request = Request::get(uri);
    if let Some(range) = range {
        request = request.header(header::RANGE, range);
    }

    let response = router
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), 64 << 20).await.unwrap();

    Collected {
        status,
        headers,
        body,
    }
}
