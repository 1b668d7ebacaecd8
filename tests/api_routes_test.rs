//! Router-level tests for the overlay-facing API

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use pagelens_core::api::{router, AppState};
use pagelens_core::config::Settings;
use pagelens_core::storage::Storage;
use std::sync::Arc;
use tower::ServiceExt;

fn test_router() -> Router {
    let settings = Settings::default();
    let storage = Arc::new(Storage::open_in_memory().expect("db"));
    router(AppState::new(&settings, storage))
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

#[tokio::test]
async fn health_reports_ok() {
    let response = test_router()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn anchor_marks_posted_markup() {
    let response = test_router()
        .oneshot(post_json(
            "/anchor",
            serde_json::json!({
                "html": "<html><head></head><body><p>The quick brown fox jumps over the lazy dog.</p></body></html>",
                "source": "The quick brown fox jumps over the lazy dog.",
            }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["matched"], true);
    assert_eq!(body["marker_count"], 1);
    assert!(body["html"]
        .as_str()
        .expect("html")
        .contains("__pagelens_mark__"));
}

#[tokio::test]
async fn anchor_reports_miss_without_markers() {
    let response = test_router()
        .oneshot(post_json(
            "/anchor",
            serde_json::json!({
                "html": "<html><head></head><body><p>Nothing related lives here.</p></body></html>",
                "source": "a snippet that genuinely does not appear",
            }),
        ))
        .await
        .expect("response");

    let body = json_body(response).await;
    assert_eq!(body["matched"], false);
    assert_eq!(body["marker_count"], 0);
}

#[tokio::test]
async fn track_price_roundtrip() {
    let app = test_router();

    let response = app
        .clone()
        .oneshot(post_json(
            "/track-price",
            serde_json::json!({
                "url": "https://shop.example/p/widget?ref=mail",
                "title": "Widget 3000",
                "price": "$129.99",
                "image_url": "https://img.example/w.jpg",
            }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["current"], 129.99);
    assert_eq!(body["currency"], "$");
    assert_eq!(body["trend"], "stable");
}

#[tokio::test]
async fn track_price_rejects_unparseable_price_in_band() {
    let response = test_router()
        .oneshot(post_json(
            "/track-price",
            serde_json::json!({
                "url": "https://shop.example/p/widget",
                "title": "Widget",
                "price": "currently unavailable",
            }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().expect("error").contains("price"));
}

#[tokio::test]
async fn youtube_load_rejects_non_video_urls_in_band() {
    let response = test_router()
        .oneshot(post_json(
            "/youtube/load",
            serde_json::json!({ "url": "https://example.com/not-a-video" }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn youtube_chat_for_unloaded_video_is_not_found() {
    let response = test_router()
        .oneshot(post_json(
            "/youtube/chat",
            serde_json::json!({ "video_id": "notloaded01", "message": "what happens" }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn chat_without_api_key_is_bad_gateway() {
    let response = test_router()
        .oneshot(post_json(
            "/chat",
            serde_json::json!({ "message": "hello", "context": "some page text" }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}
