//! Tests for `AppError` → HTTP response mapping.
//!
//! These tests call `IntoResponse` directly on `AppError` values; no HTTP
//! server is involved.

use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use zimplay_api::error::AppError;
use zimplay_core::error::CoreError;
use zimplay_pipeline::QueueError;
use zimplay_store::StoreError;

/// Helper: convert an `AppError` into its status code and parsed JSON body.
async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

// ---------------------------------------------------------------------------
// Test: StoreError::NotFound is a server error with NOT_FOUND code
// ---------------------------------------------------------------------------

#[tokio::test]
async fn store_not_found_returns_500_with_not_found_code() {
    let err = AppError::Store(StoreError::NotFound("abc123".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "Job abc123 not found");
}

// ---------------------------------------------------------------------------
// Test: an invalid fingerprint is indistinguishable from an unknown one
// ---------------------------------------------------------------------------

#[tokio::test]
async fn invalid_fingerprint_matches_unknown_job() {
    let err = AppError::Core(CoreError::InvalidFingerprint("../etc".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "Job ../etc not found");
}

// ---------------------------------------------------------------------------
// Test: store I/O errors map to 500 and hide the path
// ---------------------------------------------------------------------------

#[tokio::test]
async fn store_io_error_returns_500_and_sanitizes_message() {
    let err = AppError::Store(StoreError::Io {
        path: PathBuf::from("/srv/secret/results"),
        source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
    assert!(!json.to_string().contains("/srv/secret"));
}

// ---------------------------------------------------------------------------
// Test: a closed queue maps to 500
// ---------------------------------------------------------------------------

#[tokio::test]
async fn queue_closed_returns_500() {
    let (status, json) = error_to_response(AppError::Queue(QueueError::Closed)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
}

// ---------------------------------------------------------------------------
// Test: template errors map to 500
// ---------------------------------------------------------------------------

#[tokio::test]
async fn template_error_returns_500() {
    let err = minijinja::Error::new(minijinja::ErrorKind::TemplateNotFound, "missing.html");

    let (status, json) = error_to_response(AppError::Template(err)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
}
