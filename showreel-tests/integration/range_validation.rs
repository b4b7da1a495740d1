//! Integration tests for HTTP range handling
//!
//! Every test runs the real router over files on disk, so the store, the
//! responder and the body stream are all exercised together.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{StatusCode, header};
use proptest::prelude::*;
use showreel_core::storage::test_fixtures::{create_media_library, patterned_bytes};
use showreel_core::storage::{MediaReader, validate_resource_id};
use showreel_core::{LocalMediaStore, MediaEntry, MediaMetadata, MediaStore, StorageError};

use crate::support::{get, library_router, local_store, store_router};

const CLIP_LEN: usize = 1000;

fn clip_library() -> (tempfile::TempDir, axum::Router, Vec<u8>) {
    let data = patterned_bytes(CLIP_LEN);
    let (dir, router) = library_router(&[("clip.mp4", data.clone())]);
    (dir, router, data)
}

#[tokio::test]
async fn test_closed_range_returns_partial_content() {
    let (_dir, router, data) = clip_library();

    let response = get(router, "/media/clip.mp4", Some("bytes=200-499")).await;

    assert_eq!(response.status, StatusCode::PARTIAL_CONTENT);
    assert_eq!(response.header(header::CONTENT_RANGE), "bytes 200-499/1000");
    assert_eq!(response.header(header::CONTENT_LENGTH), "300");
    assert_eq!(response.header(header::ACCEPT_RANGES), "bytes");
    assert_eq!(response.header(header::CONTENT_TYPE), "video/mp4");
    assert_eq!(&response.body[..], &data[200..500]);
}

#[tokio::test]
async fn test_no_range_returns_whole_file() {
    let (_dir, router, data) = clip_library();

    let response = get(router, "/media/clip.mp4", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header(header::CONTENT_LENGTH), "1000");
    assert_eq!(response.header(header::CONTENT_TYPE), "video/mp4");
    assert!(response.headers.get(header::CONTENT_RANGE).is_none());
    assert_eq!(&response.body[..], &data[..]);
}

#[tokio::test]
async fn test_open_ended_range_runs_to_end_of_file() {
    let (_dir, router, data) = clip_library();

    let response = get(router, "/media/clip.mp4", Some("bytes=900-")).await;

    assert_eq!(response.status, StatusCode::PARTIAL_CONTENT);
    assert_eq!(response.header(header::CONTENT_RANGE), "bytes 900-999/1000");
    assert_eq!(response.header(header::CONTENT_LENGTH), "100");
    assert_eq!(&response.body[..], &data[900..]);
}

#[tokio::test]
async fn test_missing_video_returns_not_found_json() {
    let (_dir, router, _data) = clip_library();

    let response = get(router, "/media/missing.mp4", Some("bytes=0-")).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(
        response.json(),
        serde_json::json!({"status": "error", "message": "Video not found"})
    );
}

#[tokio::test]
async fn test_unsatisfiable_ranges_are_rejected() {
    let (_dir, router, _data) = clip_library();

    for value in ["bytes=1000-", "bytes=500-200", "bytes=0-1000", "bytes=5000-6000"] {
        let response = get(router.clone(), "/media/clip.mp4", Some(value)).await;

        assert_eq!(
            response.status,
            StatusCode::RANGE_NOT_SATISFIABLE,
            "range {value}"
        );
        assert_eq!(response.header(header::CONTENT_RANGE), "bytes */1000");
        assert_eq!(response.json()["status"], "error");
    }
}

#[tokio::test]
async fn test_malformed_ranges_are_rejected() {
    let (_dir, router, _data) = clip_library();

    for value in ["bytes=abc-def", "items=0-10", "bytes=-500", "0-10", "bytes="] {
        let response = get(router.clone(), "/media/clip.mp4", Some(value)).await;

        assert_eq!(
            response.status,
            StatusCode::RANGE_NOT_SATISFIABLE,
            "range {value}"
        );
    }
}

#[tokio::test]
async fn test_first_of_multiple_ranges_is_served() {
    let (_dir, router, data) = clip_library();

    let response = get(router, "/media/clip.mp4", Some("bytes=0-9, 20-29")).await;

    assert_eq!(response.status, StatusCode::PARTIAL_CONTENT);
    assert_eq!(response.header(header::CONTENT_RANGE), "bytes 0-9/1000");
    assert_eq!(&response.body[..], &data[..10]);
}

#[tokio::test]
async fn test_traversal_attempt_is_rejected() {
    let (dir, root) = create_media_library(&[("clip.mp4", patterned_bytes(16))]);
    std::fs::write(dir.path().join("secret.txt"), b"not a video").unwrap();
    let router = store_router(local_store(root.clone()), root);

    let response = get(router, "/media/..%2Fsecret.txt", None).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["message"], "Invalid video id");
}

#[tokio::test]
async fn test_complementary_ranges_reassemble_file() {
    let (_dir, router, data) = clip_library();

    for split in [1usize, 64, 333, 999] {
        let head = get(
            router.clone(),
            "/media/clip.mp4",
            Some(&format!("bytes=0-{}", split - 1)),
        )
        .await;
        let tail = get(
            router.clone(),
            "/media/clip.mp4",
            Some(&format!("bytes={split}-")),
        )
        .await;

        assert_eq!(head.status, StatusCode::PARTIAL_CONTENT);
        assert_eq!(tail.status, StatusCode::PARTIAL_CONTENT);

        let mut joined = head.body.to_vec();
        joined.extend_from_slice(&tail.body);
        assert_eq!(joined, data, "split at {split}");
    }
}

#[tokio::test]
async fn test_concurrent_range_requests_on_same_file() {
    let data = patterned_bytes(256 * 1024);
    let (_dir, router) = library_router(&[("reel.mp4", data.clone())]);
    let data = Arc::new(data);

    let mut handles = Vec::new();
    for i in 0..16u64 {
        let router = router.clone();
        let data = Arc::clone(&data);
        handles.push(tokio::spawn(async move {
            let start = i * 16 * 1024;
            let end = start + 12 * 1024 - 1;
            let response = get(
                router,
                "/media/reel.mp4",
                Some(&format!("bytes={start}-{end}")),
            )
            .await;

            assert_eq!(response.status, StatusCode::PARTIAL_CONTENT);
            assert_eq!(
                &response.body[..],
                &data[start as usize..=end as usize]
            );
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }
}

/// Store that deletes each file right after reporting its metadata.
struct VanishingStore {
    inner: LocalMediaStore,
}

#[async_trait]
impl MediaStore for VanishingStore {
    async fn stat(&self, id: &str) -> Result<MediaMetadata, StorageError> {
        let metadata = self.inner.stat(id).await?;
        validate_resource_id(id)?;
        std::fs::remove_file(self.inner.root().join(id))?;
        Ok(metadata)
    }

    async fn open_range(
        &self,
        id: &str,
        start: u64,
        length: u64,
    ) -> Result<MediaReader, StorageError> {
        self.inner.open_range(id, start, length).await
    }

    async fn list(&self) -> Result<Vec<MediaEntry>, StorageError> {
        self.inner.list().await
    }
}

#[tokio::test]
async fn test_file_deleted_between_stat_and_open() {
    let (_dir, root) = create_media_library(&[("clip.mp4", patterned_bytes(CLIP_LEN))]);
    let store = Arc::new(VanishingStore {
        inner: LocalMediaStore::new(root.clone()),
    });
    let router = store_router(store, root);

    let response = get(router, "/media/clip.mp4", Some("bytes=0-99")).await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    let body = response.json();
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Error streaming video");
    assert!(body["error"].is_string());
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn served_bytes(root: PathBuf, range: String) -> (StatusCode, Vec<u8>) {
    runtime().block_on(async move {
        let router = store_router(local_store(root.clone()), root);
        let response = get(router, "/media/clip.mp4", Some(&range)).await;
        (response.status, response.body.to_vec())
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_satisfiable_range_serves_exact_slice(a in 0usize..CLIP_LEN, b in 0usize..CLIP_LEN) {
        let (start, end) = (a.min(b), a.max(b));
        let data = patterned_bytes(CLIP_LEN);
        let (_dir, root) = create_media_library(&[("clip.mp4", data.clone())]);

        let (status, body) = served_bytes(root, format!("bytes={start}-{end}"));

        prop_assert_eq!(status, StatusCode::PARTIAL_CONTENT);
        prop_assert_eq!(&body[..], &data[start..=end]);
    }

    #[test]
    fn prop_start_past_end_of_file_is_unsatisfiable(start in CLIP_LEN..CLIP_LEN * 4) {
        let (_dir, root) = create_media_library(&[("clip.mp4", patterned_bytes(CLIP_LEN))]);

        let (status, _body) = served_bytes(root, format!("bytes={start}-"));

        prop_assert_eq!(status, StatusCode::RANGE_NOT_SATISFIABLE);
    }
}
