//! JSON API handlers for the media library

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use tracing::error;

use crate::server::AppState;

/// Lists every servable video with its size.
pub async fn api_media_list(State(state): State<AppState>) -> Response {
    match state.responder.store().list().await {
        Ok(items) => {
            let total = items.len();
            Json(json!({
                "status": "ok",
                "items": items,
                "total": total,
            }))
            .into_response()
        }
        Err(e) => {
            error!("Failed to list media library: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "status": "error",
                    "message": "Failed to list videos",
                    "error": e.to_string(),
                })),
            )
                .into_response()
        }
    }
}

/// Liveness probe with uptime and configured media root.
pub async fn api_health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "uptime_seconds": state.server_started_at.elapsed().as_secs(),
        "media_root": state.media_root.display().to_string(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::to_bytes;
    use showreel_core::config::MediaConfig;
    use showreel_core::storage::test_fixtures::InMemoryMediaStore;

    use super::*;

    #[tokio::test]
    async fn test_media_list() {
        let store = Arc::new(InMemoryMediaStore::new());
        store.insert("b.mp4", vec![0u8; 20]).await;
        store.insert("a.mp4", vec![0u8; 10]).await;
        let state = AppState::with_store(store, MediaConfig::default());

        let response = api_media_list(State(state)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), 4096).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["total"], 2);
        assert_eq!(body["items"][0]["id"], "a.mp4");
        assert_eq!(body["items"][0]["length"], 10);
        assert_eq!(body["items"][1]["id"], "b.mp4");
    }

    #[tokio::test]
    async fn test_health() {
        let state = AppState::with_store(
            Arc::new(InMemoryMediaStore::new()),
            MediaConfig::default(),
        );

        let Json(body) = api_health(State(state)).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["media_root"], "uploads/videos");
    }
}
