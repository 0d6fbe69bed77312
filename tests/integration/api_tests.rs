//! API integration tests for the split and post endpoints.
//!
//! Tests verify:
//! - Archive export: multipart upload in, readable ZIP out
//! - Grid validation and error mapping to HTTP responses
//! - Publishing against a call-tracking mock provider
//! - Session requirements on the protected post route

use std::io::Read;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use gridx::error::ProviderError;

use super::test_utils::{
    is_zip, make_test_png, multipart_request, MockPostClient, MultipartForm, TestApp,
};

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "healthy");
}

// =============================================================================
// Archive Export
// =============================================================================

#[tokio::test]
async fn test_split_returns_zip_with_all_pieces() {
    let app = TestApp::new();

    let form = MultipartForm::new()
        .file("image", "photo.png", "image/png", &make_test_png(100, 100))
        .text("rows", "2")
        .text("cols", "2");

    let response = app
        .router
        .oneshot(multipart_request("/split", form, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/zip"
    );
    let disposition = response
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(disposition.starts_with("attachment"));
    assert!(disposition.contains("image-pieces.zip"));

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert!(is_zip(&body), "response body should be a ZIP archive");

    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(body.to_vec())).unwrap();
    assert_eq!(archive.len(), 4);
    for name in [
        "piece_01_01.png",
        "piece_01_02.png",
        "piece_02_01.png",
        "piece_02_02.png",
    ] {
        assert!(archive.by_name(name).is_ok(), "missing entry {}", name);
    }
}

#[tokio::test]
async fn test_split_pieces_decode_to_expected_size() {
    let app = TestApp::new();

    let form = MultipartForm::new()
        .file("image", "photo.png", "image/png", &make_test_png(90, 60))
        .text("rows", "2")
        .text("cols", "3");

    let response = app
        .router
        .oneshot(multipart_request("/split", form, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(body.to_vec())).unwrap();
    assert_eq!(archive.len(), 6);

    let mut data = Vec::new();
    archive
        .by_name("piece_02_03.png")
        .unwrap()
        .read_to_end(&mut data)
        .unwrap();
    let piece = image::load_from_memory(&data).unwrap();
    assert_eq!((piece.width(), piece.height()), (30, 30));
}

#[tokio::test]
async fn test_split_defaults_to_three_by_three() {
    let app = TestApp::new();

    // No rows/cols fields at all
    let form = MultipartForm::new().file("image", "photo.png", "image/png", &make_test_png(90, 90));

    let response = app
        .router
        .oneshot(multipart_request("/split", form, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let archive = zip::ZipArchive::new(std::io::Cursor::new(body.to_vec())).unwrap();
    assert_eq!(archive.len(), 9);
}

#[tokio::test]
async fn test_split_rejects_invalid_grid() {
    for (rows, cols) in [("0", "3"), ("3", "0"), ("11", "3"), ("3", "11"), ("-1", "2")] {
        let app = TestApp::new();
        let form = MultipartForm::new()
            .file("image", "photo.png", "image/png", &make_test_png(100, 100))
            .text("rows", rows)
            .text("cols", cols);

        let response = app
            .router
            .oneshot(multipart_request("/split", form, None))
            .await
            .unwrap();

        assert_eq!(
            response.status(),
            StatusCode::BAD_REQUEST,
            "grid {}x{} should be rejected",
            rows,
            cols
        );
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "invalid_grid");
    }
}

#[tokio::test]
async fn test_split_rejects_image_too_small() {
    let app = TestApp::new();

    // 15x15 at 2x2 gives 7px tiles, under the 10px minimum
    let form = MultipartForm::new()
        .file("image", "photo.png", "image/png", &make_test_png(15, 15))
        .text("rows", "2")
        .text("cols", "2");

    let response = app
        .router
        .oneshot(multipart_request("/split", form, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "image_too_small");
}

#[tokio::test]
async fn test_split_rejects_missing_file() {
    let app = TestApp::new();

    let form = MultipartForm::new().text("rows", "2").text("cols", "2");

    let response = app
        .router
        .oneshot(multipart_request("/split", form, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "missing_file");
}

#[tokio::test]
async fn test_split_rejects_non_image_upload() {
    let app = TestApp::new();

    let form = MultipartForm::new()
        .file("image", "notes.txt", "text/plain", b"hello")
        .text("rows", "2")
        .text("cols", "2");

    let response = app
        .router
        .oneshot(multipart_request("/split", form, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "unsupported_media");
}

#[tokio::test]
async fn test_split_rejects_corrupt_image_bytes() {
    let app = TestApp::new();

    // Claims to be a PNG but isn't
    let form = MultipartForm::new()
        .file("image", "photo.png", "image/png", &[0u8; 64])
        .text("rows", "2")
        .text("cols", "2");

    let response = app
        .router
        .oneshot(multipart_request("/split", form, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "invalid_image");
}

// =============================================================================
// Publishing
// =============================================================================

#[tokio::test]
async fn test_post_requires_session() {
    let app = TestApp::new();

    let form = MultipartForm::new()
        .file("image", "photo.png", "image/png", &make_test_png(100, 100))
        .text("rows", "2")
        .text("cols", "2");

    let response = app
        .router
        .clone()
        .oneshot(multipart_request("/post", form, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "unauthorized");

    // Nothing reached the provider
    assert_eq!(app.client.upload_count(), 0);
}

#[tokio::test]
async fn test_post_success() {
    let app = TestApp::new();
    let cookie = app.seed_authenticated_session().await;

    let form = MultipartForm::new()
        .file("image", "photo.png", "image/png", &make_test_png(100, 100))
        .text("rows", "2")
        .text("cols", "2")
        .text("caption", "four pieces");

    let response = app
        .router
        .clone()
        .oneshot(multipart_request("/post", form, Some(&cookie)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["post_id"], "post-1");

    assert_eq!(app.client.upload_count(), 4);
    assert_eq!(app.client.post_count(), 1);
    assert_eq!(app.client.posted_text().as_deref(), Some("four pieces"));
    assert_eq!(
        app.client.posted_media(),
        vec!["media-1", "media-2", "media-3", "media-4"]
    );
}

#[tokio::test]
async fn test_post_rejects_grids_over_four_tiles() {
    let app = TestApp::new();
    let cookie = app.seed_authenticated_session().await;

    let form = MultipartForm::new()
        .file("image", "photo.png", "image/png", &make_test_png(120, 120))
        .text("rows", "3")
        .text("cols", "3");

    let response = app
        .router
        .clone()
        .oneshot(multipart_request("/post", form, Some(&cookie)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "too_many_tiles");

    // Rejected before any provider call
    assert_eq!(app.client.upload_count(), 0);
    assert_eq!(app.client.post_count(), 0);
}

#[tokio::test]
async fn test_post_upload_failure_aborts_without_post() {
    let app = TestApp::with_client(MockPostClient::failing_upload_at(2));
    let cookie = app.seed_authenticated_session().await;

    let form = MultipartForm::new()
        .file("image", "photo.png", "image/png", &make_test_png(100, 100))
        .text("rows", "2")
        .text("cols", "2");

    let response = app
        .router
        .clone()
        .oneshot(multipart_request("/post", form, Some(&cookie)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "upstream_unavailable");

    // Stopped at the failing upload; no post was created
    assert_eq!(app.client.upload_count(), 2);
    assert_eq!(app.client.post_count(), 0);
}

#[tokio::test]
async fn test_post_rate_limit_surfaced_as_429() {
    let app = TestApp::with_client(MockPostClient::failing_upload_with(
        1,
        ProviderError::RateLimited,
    ));
    let cookie = app.seed_authenticated_session().await;

    let form = MultipartForm::new()
        .file("image", "photo.png", "image/png", &make_test_png(100, 100))
        .text("rows", "1")
        .text("cols", "2");

    let response = app
        .router
        .clone()
        .oneshot(multipart_request("/post", form, Some(&cookie)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "rate_limited");
    assert_eq!(app.client.post_count(), 0);
}

#[tokio::test]
async fn test_post_rejected_token_surfaced_as_401() {
    let app = TestApp::with_client(MockPostClient::failing_upload_with(
        1,
        ProviderError::Unauthorized,
    ));
    let cookie = app.seed_authenticated_session().await;

    let form = MultipartForm::new()
        .file("image", "photo.png", "image/png", &make_test_png(100, 100))
        .text("rows", "1")
        .text("cols", "1");

    let response = app
        .router
        .clone()
        .oneshot(multipart_request("/post", form, Some(&cookie)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "upstream_auth");
}

#[tokio::test]
async fn test_post_caption_too_long_rejected_before_upload() {
    let app = TestApp::new();
    let cookie = app.seed_authenticated_session().await;

    let form = MultipartForm::new()
        .file("image", "photo.png", "image/png", &make_test_png(100, 100))
        .text("rows", "1")
        .text("cols", "1")
        .text("caption", &"x".repeat(281));

    let response = app
        .router
        .clone()
        .oneshot(multipart_request("/post", form, Some(&cookie)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "caption_too_long");
    assert_eq!(app.client.upload_count(), 0);
}
