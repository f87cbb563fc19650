// SPDX-License-Identifier: Apache-2.0

use perilgrid_server::{build_router, AdjustPaths, AppState, FakeEngine};
use std::sync::Arc;
use tempfile::tempdir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nfake-chart-bytes";

fn fixture_paths(tmp: &std::path::Path) -> AdjustPaths {
    let data_dir = tmp.join("data");
    std::fs::create_dir_all(&data_dir).expect("data dir");
    for name in ["ylt.parquet", "counts.csv", "metrics.csv", "gates.csv"] {
        std::fs::write(data_dir.join(name), b"fixture").expect("seed input");
    }
    let save_dir = tmp.join("charts");
    std::fs::create_dir_all(&save_dir).expect("save dir");
    AdjustPaths::resolve(
        data_dir,
        "ylt.parquet",
        "counts.csv",
        "metrics.csv",
        "gates.csv",
        save_dir,
    )
}

async fn spawn_server(state: AppState) -> std::net::SocketAddr {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve app");
    });
    addr
}

async fn get_raw(addr: std::net::SocketAddr, path: &str) -> (u16, String, Vec<u8>) {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");
    let request =
        format!("GET {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    stream
        .write_all(request.as_bytes())
        .await
        .expect("write request");
    let mut response = Vec::new();
    stream
        .read_to_end(&mut response)
        .await
        .expect("read response");
    let split = response
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("http response must have separator");
    let head = String::from_utf8_lossy(&response[..split]).to_string();
    let body = response[split + 4..].to_vec();
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u16>().ok())
        .expect("http status");
    (status, head, body)
}

#[tokio::test]
async fn serves_an_existing_chart_as_png() {
    let tmp = tempdir().expect("tempdir");
    let paths = fixture_paths(tmp.path());
    std::fs::write(paths.save_dir.join("aal_curve.png"), PNG_BYTES).expect("seed chart");
    let addr = spawn_server(AppState::new(paths, Arc::new(FakeEngine::default()))).await;

    let (status, head, body) = get_raw(addr, "/get-image/aal_curve.png").await;
    assert_eq!(status, 200);
    assert!(
        head.to_lowercase().contains("content-type: image/png"),
        "png content type expected, got: {head}"
    );
    assert_eq!(body, PNG_BYTES);
}

#[tokio::test]
async fn traversal_attempts_are_not_found_never_served() {
    let tmp = tempdir().expect("tempdir");
    let paths = fixture_paths(tmp.path());
    std::fs::write(tmp.path().join("secret.txt"), b"outside-the-save-dir").expect("seed secret");
    let addr = spawn_server(AppState::new(paths, Arc::new(FakeEngine::default()))).await;

    for path in [
        "/get-image/..%2F..%2Fsecret.txt",
        "/get-image/%2e%2e%2fsecret.txt",
        "/get-image/../secret.txt",
        "/get-image/..%5C..%5Csecret.txt",
    ] {
        let (status, _head, body) = get_raw(addr, path).await;
        assert_eq!(status, 404, "{path} must not resolve");
        assert!(
            !body.windows(7).any(|w| w == b"outside"),
            "{path} must never leak file content"
        );
    }
}

#[tokio::test]
async fn names_with_no_safe_characters_are_not_found() {
    let tmp = tempdir().expect("tempdir");
    let addr = spawn_server(AppState::new(
        fixture_paths(tmp.path()),
        Arc::new(FakeEngine::default()),
    ))
    .await;

    for path in ["/get-image/%2F%2F%2F", "/get-image/...", "/get-image/%C2%A7"] {
        let (status, _head, _body) = get_raw(addr, path).await;
        assert_eq!(status, 404, "{path} must be not-found, not an error");
    }
}

#[tokio::test]
async fn directories_under_the_save_dir_are_not_found() {
    let tmp = tempdir().expect("tempdir");
    let paths = fixture_paths(tmp.path());
    std::fs::create_dir(paths.save_dir.join("thumbnails")).expect("nested dir");
    let addr = spawn_server(AppState::new(paths, Arc::new(FakeEngine::default()))).await;

    let (status, _head, _body) = get_raw(addr, "/get-image/thumbnails").await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn traversal_and_absence_are_indistinguishable() {
    let tmp = tempdir().expect("tempdir");
    let paths = fixture_paths(tmp.path());
    std::fs::write(tmp.path().join("secret.txt"), b"outside-the-save-dir").expect("seed secret");
    let addr = spawn_server(AppState::new(paths, Arc::new(FakeEngine::default()))).await;

    let (s1, _h1, b1) = get_raw(addr, "/get-image/..%2Fsecret.txt").await;
    let (s2, _h2, b2) = get_raw(addr, "/get-image/never-generated.png").await;
    assert_eq!((s1, b1), (s2, b2), "no information leakage between causes");
}
