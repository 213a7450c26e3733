//! # REST Client Integration Tests
//!
//! `ApiClient` against an axum mock of the chat backend.

mod common;

use axum::extract::{Multipart, Path};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chat_client::chat::{AttachmentFile, AttachmentUploader, HistoryLoader};
use chat_client::config::ChatConfig;
use chat_client::core::ChatError;
use chat_client::services::api::ApiClient;
use common::*;
use serde_json::{json, Value};
use std::sync::Arc;

async fn history(Path((sender, contact)): Path<(String, String)>) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    match contact.as_str() {
        "missing" => Err((StatusCode::NOT_FOUND, Json(json!({ "error": "no such user" })))),
        "broken" => Err((StatusCode::INTERNAL_SERVER_ERROR, Json(json!({})))),
        _ => Ok(Json(json!([
            message(&sender, &contact, "first"),
            message(&contact, &sender, "second"),
        ]))),
    }
}

async fn upload(mut multipart: Multipart) -> Result<Json<Value>, StatusCode> {
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let file_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(|_| StatusCode::BAD_REQUEST)?;
        if file_name == "huge.bin" {
            return Err(StatusCode::PAYLOAD_TOO_LARGE);
        }
        return Ok(Json(json!({
            "fileUrl": format!("http://files.local/{}", file_name),
            "fileName": file_name,
            "fileType": file_type,
            "fileSize": bytes.len(),
        })));
    }
    Err(StatusCode::BAD_REQUEST)
}

async fn client() -> Arc<ApiClient> {
    let app = Router::new()
        .route("/chat/history/{sender}/{contact}", get(history))
        .route("/chat/upload", post(upload));
    let base_url = serve(app).await;
    Arc::new(ApiClient::new(&ChatConfig::default().with_base_url(base_url)))
}

#[tokio::test]
async fn test_history_in_server_order() {
    // Arrange
    let api = client().await;

    // Act
    let messages = api.get_history("t-1", "s-9").await.unwrap();

    // Assert
    assert_eq!(messages, vec![message("t-1", "s-9", "first"), message("s-9", "t-1", "second")]);
}

#[tokio::test]
async fn test_history_error_uses_backend_message() {
    let api = client().await;

    let err = api.get_history("t-1", "missing").await.unwrap_err();
    assert_eq!(err, ChatError::Api("HTTP 404: no such user".to_string()));

    let loader = HistoryLoader::new(api);
    let err = loader.load("t-1", "broken").await.unwrap_err();
    assert!(matches!(err, ChatError::HistoryFetch(ref text) if text.contains("HTTP 500")), "{:?}", err);
}

#[tokio::test]
async fn test_upload_sends_multipart_file_part() {
    // Arrange
    let uploader = AttachmentUploader::new(client().await);
    let file = AttachmentFile::new("photo.png", "image/png", vec![1, 2, 3, 4, 5]);

    // Act
    let attachment = uploader.upload(&file).await.unwrap();

    // Assert
    assert_eq!(attachment.file_url, "http://files.local/photo.png");
    assert_eq!(attachment.file_name, "photo.png");
    assert_eq!(attachment.file_type, "image/png");
    assert_eq!(attachment.file_size, 5);
}

#[tokio::test]
async fn test_rejected_upload_is_an_upload_error() {
    let uploader = AttachmentUploader::new(client().await);
    let file = AttachmentFile::new("huge.bin", "application/octet-stream", vec![0; 16]);

    let err = uploader.upload(&file).await.unwrap_err();

    assert!(matches!(err, ChatError::Upload(ref text) if text.contains("HTTP 413")), "{:?}", err);
}

#[tokio::test]
async fn test_unreachable_backend_is_reported() {
    let api = ApiClient::new(&ChatConfig::default().with_base_url("http://127.0.0.1:9"));

    let err = api.get_history("t-1", "s-9").await.unwrap_err();

    assert!(matches!(err, ChatError::Api(ref text) if text.starts_with("Network error")), "{:?}", err);
}
