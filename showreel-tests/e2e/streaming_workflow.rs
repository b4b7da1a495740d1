//! End-to-end playback workflow over a live socket

use std::net::SocketAddr;

use reqwest::StatusCode;
use reqwest::header::{CONTENT_LENGTH, CONTENT_RANGE, RANGE};
use showreel_core::config::ShowreelConfig;
use showreel_core::storage::test_fixtures::{create_media_library, patterned_bytes};
use showreel_web::{AppState, build_router};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

struct TestServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
    _library: TempDir,
}

impl TestServer {
    async fn start(files: &[(&str, Vec<u8>)]) -> Self {
        let (library, root) = create_media_library(files);
        let config = ShowreelConfig::for_testing(root);
        let app = build_router(AppState::new(&config));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            handle,
            _library: library,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[tokio::test]
async fn test_browser_style_playback() {
    let data = patterned_bytes(512 * 1024);
    let server = TestServer::start(&[("keynote.mp4", data.clone())]).await;
    let client = reqwest::Client::new();
    let url = server.url("/media/keynote.mp4");

    // Initial probe from the video element
    let probe = client.get(&url).header(RANGE, "bytes=0-").send().await.unwrap();
    assert_eq!(probe.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(probe.headers()[CONTENT_RANGE], "bytes 0-524287/524288");
    assert_eq!(probe.bytes().await.unwrap().len(), data.len());

    // Seek into the middle
    let seek = client
        .get(&url)
        .header(RANGE, "bytes=300000-300999")
        .send()
        .await
        .unwrap();
    assert_eq!(seek.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(seek.headers()[CONTENT_LENGTH], "1000");
    assert_eq!(&seek.bytes().await.unwrap()[..], &data[300_000..301_000]);

    // Plain download without a range
    let full = client.get(&url).send().await.unwrap();
    assert_eq!(full.status(), StatusCode::OK);
    assert_eq!(&full.bytes().await.unwrap()[..], &data[..]);
}

#[tokio::test]
async fn test_abandoned_stream_does_not_affect_later_requests() {
    let data = patterned_bytes(2 * 1024 * 1024);
    let server = TestServer::start(&[("gala.mp4", data.clone())]).await;
    let client = reqwest::Client::new();
    let url = server.url("/media/gala.mp4");

    for _ in 0..4 {
        let mut response = client.get(&url).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let first = response.chunk().await.unwrap();
        assert!(first.is_some_and(|chunk| !chunk.is_empty()));
        drop(response);
    }

    let tail = client
        .get(&url)
        .header(RANGE, "bytes=2097000-")
        .send()
        .await
        .unwrap();
    assert_eq!(tail.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(&tail.bytes().await.unwrap()[..], &data[2_097_000..]);
}

#[tokio::test]
async fn test_missing_and_unsatisfiable_over_http() {
    let server = TestServer::start(&[("clip.mp4", patterned_bytes(1000))]).await;
    let client = reqwest::Client::new();

    let missing = client
        .get(server.url("/media/missing.mp4"))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = missing.json().await.unwrap();
    assert_eq!(body["message"], "Video not found");

    let beyond = client
        .get(server.url("/media/clip.mp4"))
        .header(RANGE, "bytes=1000-")
        .send()
        .await
        .unwrap();
    assert_eq!(beyond.status(), StatusCode::RANGE_NOT_SATISFIABLE);
    assert_eq!(beyond.headers()[CONTENT_RANGE], "bytes */1000");
}

#[tokio::test]
async fn test_parallel_clients() {
    let data = patterned_bytes(128 * 1024);
    let server = TestServer::start(&[("reel.mp4", data.clone())]).await;
    let client = reqwest::Client::new();
    let url = server.url("/media/reel.mp4");

    let requests = (0..8u64).map(|i| {
        let client = client.clone();
        let url = url.clone();
        async move {
            let start = i * 16 * 1024;
            let end = start + 16 * 1024 - 1;
            let response = client
                .get(&url)
                .header(RANGE, format!("bytes={start}-{end}"))
                .send()
                .await
                .unwrap();
            (start as usize, response.bytes().await.unwrap())
        }
    });

    for (start, body) in futures::future::join_all(requests).await {
        assert_eq!(&body[..], &data[start..start + 16 * 1024]);
    }
}
