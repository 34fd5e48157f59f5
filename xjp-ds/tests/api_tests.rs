//! Integration tests for xjp-ds API endpoints
//!
//! Each test runs the router against its own temporary root folder.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::io::Cursor;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot` method
use xjp_ds::{build_router, AppState, ServiceConfig};

const BOUNDARY: &str = "xjp-test-boundary";

/// Test helper: app over a fresh root folder
async fn setup_app(configure: impl FnOnce(&mut ServiceConfig)) -> (axum::Router, TempDir) {
    let root = tempfile::tempdir().unwrap();
    let mut config = ServiceConfig::with_root(root.path());
    configure(&mut config);
    let state = AppState::new(config).await.unwrap();
    (build_router(state), root)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

/// Test helper: single-file multipart request
fn post_file(uri: &str, field: &str, file_name: &str, bytes: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn body_bytes(body: Body) -> Vec<u8> {
    body.collect().await.unwrap().to_bytes().to_vec()
}

async fn extract_json(body: Body) -> Value {
    serde_json::from_slice(&body_bytes(body).await).expect("Should parse JSON")
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([10, 120, 200]));
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _root) = setup_app(|_| {}).await;
    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "xjp-ds");
    assert!(body["version"].is_string());
}

// =============================================================================
// Document
// =============================================================================

#[tokio::test]
async fn test_fresh_root_serves_empty_document() {
    let (app, root) = setup_app(|_| {}).await;
    let response = app.oneshot(get("/data")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body, json!({"members": [], "singles": [], "posts": []}));
    assert!(root.path().join("data/db.json").exists());
}

#[tokio::test]
async fn test_save_relativizes_and_keeps_unknown_fields() {
    let (app, _root) = setup_app(|_| {}).await;

    let document = json!({
        "members": [{
            "id": "m_a", "name": "Aki", "generation": "1期", "isActive": true,
            "avatar": "http://192.168.1.5:3001/uploads/aki.jpg",
            "nickname": "A"
        }],
        "singles": [{
            "id": "s1", "title": "1st Single · Neon Bloom", "release": "2025-09-01",
            "cover": "https://tunnel.example.app/uploads/s1.jpg",
            "tracks": [{"no": 1, "title": "Neon Bloom", "isAside": true,
                        "audio": "http://localhost:3001/uploads/audio/1-abc123.mp3"}],
            "asideLineup": {"rows": [5, 7], "slots": [], "slotRoles": {}}
        }],
        "posts": [],
        "theme": "dark"
    });

    let response = app
        .clone()
        .oneshot(post_json("/data", document.to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(extract_json(response.into_body()).await, json!({"ok": true}));

    let response = app.oneshot(get("/data")).await.unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["members"][0]["avatar"], "/uploads/aki.jpg");
    assert_eq!(body["members"][0]["nickname"], "A");
    assert_eq!(body["singles"][0]["cover"], "/uploads/s1.jpg");
    assert_eq!(
        body["singles"][0]["tracks"][0]["audio"],
        "/uploads/audio/1-abc123.mp3"
    );
    assert_eq!(body["theme"], "dark");
}

#[tokio::test]
async fn test_get_relativizes_stale_document() {
    let (app, root) = setup_app(|_| {}).await;
    std::fs::write(
        root.path().join("data/db.json"),
        r#"{"members":[],"singles":[],"posts":[{"id":"p1","cover":"http://old-host/uploads/p1.jpg"}]}"#,
    )
    .unwrap();

    let response = app.oneshot(get("/data")).await.unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["posts"][0]["cover"], "/uploads/p1.jpg");
}

#[tokio::test]
async fn test_save_rejects_invalid_json() {
    let (app, _root) = setup_app(|_| {}).await;
    let response = app
        .clone()
        .oneshot(post_json("/data", "{ nope"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(extract_json(response.into_body()).await["error"].is_string());

    let response = app.oneshot(post_json("/data", "[1, 2]")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_save_over_body_limit_is_413() {
    let (app, _root) = setup_app(|c| c.max_upload_bytes = 1024).await;
    let big = json!({"members": [], "singles": [], "posts": [], "pad": "x".repeat(4096)});
    let response = app.oneshot(post_json("/data", big.to_string())).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(extract_json(response.into_body()).await["error"].is_string());
}

// =============================================================================
// Uploads
// =============================================================================

#[tokio::test]
async fn test_image_upload_is_downscaled_jpeg() {
    let (app, root) = setup_app(|c| c.image_max_width = 16).await;

    let response = app
        .clone()
        .oneshot(post_file("/upload", "image", "cover.png", &png(40, 20)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    let url = body["url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/uploads/") && url.ends_with(".jpg"), "{}", url);

    let stored = std::fs::read(root.path().join(url.trim_start_matches('/'))).unwrap();
    let decoded = image::load_from_memory(&stored).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (16, 8));

    // Served back under the same path
    let response = app.oneshot(get(&url)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response.into_body()).await, stored);
}

#[tokio::test]
async fn test_image_upload_rejects_non_image() {
    let (app, _root) = setup_app(|_| {}).await;
    let response = app
        .oneshot(post_file("/upload", "image", "x.png", b"not an image"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_without_field_is_no_file() {
    let (app, _root) = setup_app(|_| {}).await;
    let response = app
        .oneshot(post_file("/upload", "picture", "x.png", &png(2, 2)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        extract_json(response.into_body()).await,
        json!({"error": "no file"})
    );
}

#[tokio::test]
async fn test_audio_upload_is_stored_verbatim() {
    let (app, root) = setup_app(|_| {}).await;
    let audio = b"RIFF....WAVEfmt fake audio payload".to_vec();

    let response = app
        .oneshot(post_file("/upload-audio", "audio", "Neon Bloom.wav", &audio))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    let url = body["url"].as_str().unwrap();
    assert!(url.starts_with("/uploads/audio/") && url.ends_with(".wav"), "{}", url);

    let stored = std::fs::read(root.path().join(url.trim_start_matches('/'))).unwrap();
    assert_eq!(stored, audio);
}

#[tokio::test]
async fn test_audio_upload_without_field_is_no_file() {
    let (app, _root) = setup_app(|_| {}).await;
    let response = app
        .oneshot(post_file("/upload-audio", "image", "a.mp3", b"abc"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        extract_json(response.into_body()).await,
        json!({"error": "no file"})
    );
}
