//! Integration tests for the JSON API and HEAD probing

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use showreel_core::storage::test_fixtures::patterned_bytes;
use tower::ServiceExt;

use crate::support::{get, library_router};

#[tokio::test]
async fn test_media_list_reports_library_contents() {
    let (dir, router) = library_router(&[
        ("b-roll.mp4", patterned_bytes(2048)),
        ("aftermovie.mp4", patterned_bytes(512)),
    ]);
    let videos = dir.path().join("videos");
    std::fs::write(videos.join(".upload-in-progress"), b"partial").unwrap();
    std::fs::create_dir(videos.join("thumbnails")).unwrap();

    let response = get(router, "/api/media", None).await;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["total"], 2);
    assert_eq!(body["items"][0]["id"], "aftermovie.mp4");
    assert_eq!(body["items"][0]["length"], 512);
    assert_eq!(body["items"][1]["id"], "b-roll.mp4");
    assert_eq!(body["items"][1]["length"], 2048);
}

#[tokio::test]
async fn test_media_list_on_empty_library() {
    let (_dir, router) = library_router(&[]);

    let response = get(router, "/api/media", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["total"], 0);
}

#[tokio::test]
async fn test_health_reports_media_root() {
    let (dir, router) = library_router(&[]);

    let response = get(router, "/api/health", None).await;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(
        body["media_root"],
        dir.path().join("videos").display().to_string()
    );
}

#[tokio::test]
async fn test_head_matches_get_headers_without_body() {
    let (_dir, router) = library_router(&[("clip.mp4", patterned_bytes(1000))]);

    let request = Request::head("/media/clip.mp4")
        .header(header::RANGE, "bytes=100-199")
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        response.headers()[header::CONTENT_RANGE],
        "bytes 100-199/1000"
    );
    assert_eq!(response.headers()[header::CONTENT_LENGTH], "100");
    let body = to_bytes(response.into_body(), 1024).await.unwrap();
    assert!(body.is_empty());

    let full = get(router, "/media/clip.mp4", Some("bytes=100-199")).await;
    assert_eq!(full.body.len(), 100);
}

#[tokio::test]
async fn test_head_on_missing_video() {
    let (_dir, router) = library_router(&[]);

    let request = Request::head("/media/missing.mp4")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
