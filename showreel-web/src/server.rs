//! Axum server for Showreel
//!
//! Wires the media responder and JSON API into a router and runs it until
//! Ctrl-C.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::routing::get;
use showreel_core::config::{MediaConfig, ShowreelConfig};
use showreel_core::{LocalMediaStore, MediaResponder, MediaStore, ShowreelError};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::handlers::{api_health, api_media_list, stream_media, stream_media_headers};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Range-aware media responder
    pub responder: MediaResponder,
    /// Media root reported by the health endpoint
    pub media_root: PathBuf,
    /// Server start time, for uptime reporting
    pub server_started_at: Instant,
}

impl AppState {
    /// Creates state serving files from `config.media.root`.
    pub fn new(config: &ShowreelConfig) -> Self {
        let store = Arc::new(LocalMediaStore::new(config.media.root.clone()));
        Self::with_store(store, config.media.clone())
    }

    /// Creates state over an arbitrary storage backend.
    pub fn with_store(store: Arc<dyn MediaStore>, media: MediaConfig) -> Self {
        let media_root = media.root.clone();
        Self {
            responder: MediaResponder::new(store, media),
            media_root,
            server_started_at: Instant::now(),
        }
    }
}

/// Builds the application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Media streaming
        .route(
            "/media/{resource_id}",
            get(stream_media).head(stream_media_headers),
        )
        // JSON API endpoints
        .route("/api/media", get(api_media_list))
        .route("/api/health", get(api_health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Runs the server described by `config` until Ctrl-C.
///
/// # Errors
///
/// - `ShowreelError::Configuration` - If the bind address is invalid
/// - `ShowreelError::Io` - If the listener cannot be bound or the server fails
pub async fn run_server(config: ShowreelConfig) -> Result<(), ShowreelError> {
    let addr = config
        .server
        .socket_addr()
        .map_err(|e| ShowreelError::Configuration {
            reason: format!("invalid bind address {}: {e}", config.server.host),
        })?;

    if !config.media.root.is_dir() {
        warn!(
            "Media root {} is not a directory; every video will 404",
            config.media.root.display()
        );
    }

    let app = build_router(AppState::new(&config));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        "Showreel media server running on http://{} (media root: {})",
        listener.local_addr()?,
        config.media.root.display()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Showreel media server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request, StatusCode, header};
    use showreel_core::storage::test_fixtures::{InMemoryMediaStore, patterned_bytes};
    use tower::ServiceExt;

    use super::*;

    async fn test_router() -> Router {
        let store = Arc::new(InMemoryMediaStore::new());
        store.insert("clip.mp4", patterned_bytes(1000)).await;
        build_router(AppState::with_store(store, MediaConfig::default()))
    }

    #[tokio::test]
    async fn test_media_route_serves_ranges() {
        let response = test_router()
            .await
            .oneshot(
                Request::get("/media/clip.mp4")
                    .header(header::RANGE, "bytes=200-499")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(
            response.headers()[header::CONTENT_RANGE],
            "bytes 200-499/1000"
        );
        let body = to_bytes(response.into_body(), 4096).await.unwrap();
        assert_eq!(body, patterned_bytes(1000)[200..500]);
    }

    #[tokio::test]
    async fn test_head_route_has_no_body() {
        let response = test_router()
            .await
            .oneshot(
                Request::builder()
                    .method(Method::HEAD)
                    .uri("/media/clip.mp4")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "1000");
        let body = to_bytes(response.into_body(), 4096).await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let response = test_router()
            .await
            .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
