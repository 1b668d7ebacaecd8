//! HTTP API server
//!
//! The fixed local endpoint the overlay scripts call (default
//! `127.0.0.1:8090`). CORS is wide open on purpose: the overlay runs inside
//! whatever origin the user is browsing. Handlers return the JSON shapes the
//! overlay's fetch sites expect; the price and transcript-load endpoints
//! report failure in-band (`success: false`) rather than via status codes.

use super::state::AppState;
use crate::anchor::Highlighter;
use crate::config::Settings;
use crate::error::{PagelensError, Result};
use crate::extract::{extract_title, page_text};
use crate::storage::Storage;
use crate::types::{LoadedPage, Timeline};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use scraper::Html;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info};

/// Error wrapper mapping service errors to HTTP responses
pub struct ApiError(PagelensError);

impl From<PagelensError> for ApiError {
    fn from(err: PagelensError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            PagelensError::NotFound(_) => StatusCode::NOT_FOUND,
            PagelensError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            PagelensError::LlmApi(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/chat", post(chat_handler))
        .route("/load-url", post(load_url_handler))
        .route("/track-price", post(track_price_handler))
        .route("/youtube/load", post(youtube_load_handler))
        .route("/youtube/chat", post(youtube_chat_handler))
        .route("/anchor", post(anchor_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the server until shutdown.
pub async fn serve(settings: Settings, storage: Arc<Storage>) -> Result<()> {
    let addr = settings.server.addr()?;
    let state = AppState::new(&settings, storage);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("pagelens listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: String,
    /// Page content sent by the overlay; falls back to the last loaded page
    #[serde(default)]
    context: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    answer: String,
    /// Chunks the answer was grounded in, for the overlay's highlighter
    sources: Vec<String>,
}

async fn chat_handler(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> std::result::Result<Json<ChatResponse>, ApiError> {
    let context = match req.context {
        Some(c) if !c.trim().is_empty() => c,
        _ => state
            .page
            .read()
            .await
            .as_ref()
            .map(|p| p.text.clone())
            .unwrap_or_default(),
    };

    let (grounding, sources) = if context.is_empty() {
        (String::new(), Vec::new())
    } else {
        state.rag.context_for(&context, &req.message)?
    };

    let answer = state.llm.answer_about_page(&grounding, &req.message).await?;
    Ok(Json(ChatResponse { answer, sources }))
}

#[derive(Debug, Deserialize)]
struct LoadUrlRequest {
    url: String,
}

#[derive(Debug, Serialize)]
struct LoadUrlResponse {
    success: bool,
    title: Option<String>,
    chars: usize,
}

async fn load_url_handler(
    State(state): State<AppState>,
    Json(req): Json<LoadUrlRequest>,
) -> std::result::Result<Json<LoadUrlResponse>, ApiError> {
    let body = state
        .http
        .get(&req.url)
        .send()
        .await
        .map_err(PagelensError::from)?
        .text()
        .await
        .map_err(PagelensError::from)?;

    let (title, text) = {
        let doc = Html::parse_document(&body);
        (extract_title(&doc), page_text(&doc))
    };
    debug!(url = %req.url, chars = text.len(), "page context loaded");

    let chars = text.chars().count();
    *state.page.write().await = Some(LoadedPage {
        url: req.url,
        title: title.clone(),
        text,
    });

    Ok(Json(LoadUrlResponse {
        success: true,
        title,
        chars,
    }))
}

#[derive(Debug, Deserialize)]
struct TrackPriceRequest {
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    price: String,
    #[serde(default)]
    image_url: String,
}

async fn track_price_handler(
    State(state): State<AppState>,
    Json(req): Json<TrackPriceRequest>,
) -> Json<serde_json::Value> {
    match state
        .price
        .record(&req.url, &req.title, &req.price, &req.image_url)
    {
        Ok(report) => match serde_json::to_value(&report) {
            Ok(value) => Json(value),
            Err(e) => Json(json!({ "success": false, "error": e.to_string() })),
        },
        Err(e) => Json(json!({ "success": false, "error": e.to_string() })),
    }
}

#[derive(Debug, Deserialize)]
struct YoutubeLoadRequest {
    url: String,
}

async fn youtube_load_handler(
    State(state): State<AppState>,
    Json(req): Json<YoutubeLoadRequest>,
) -> Json<serde_json::Value> {
    match state.transcript.load_video(&req.url).await {
        Ok(summary) => Json(json!({
            "success": true,
            "video_id": summary.video_id,
            "message": format!("Transcript loaded ({} sections)", summary.chunk_count),
            "total_duration": summary.total_duration,
        })),
        Err(e) => Json(json!({ "success": false, "error": e.to_string() })),
    }
}

#[derive(Debug, Deserialize)]
struct YoutubeChatRequest {
    video_id: String,
    message: String,
}

#[derive(Debug, Serialize)]
struct YoutubeChatResponse {
    answer: String,
    timelines: Vec<Timeline>,
}

async fn youtube_chat_handler(
    State(state): State<AppState>,
    Json(req): Json<YoutubeChatRequest>,
) -> std::result::Result<Json<YoutubeChatResponse>, ApiError> {
    let timelines = state.transcript.query(&req.video_id, &req.message)?;
    let excerpts = timelines
        .iter()
        .map(|t| format!("[{}] {}", t.label, t.text))
        .collect::<Vec<_>>()
        .join("\n\n");

    let answer = state.llm.answer_about_video(&excerpts, &req.message).await?;
    Ok(Json(YoutubeChatResponse { answer, timelines }))
}

#[derive(Debug, Deserialize)]
struct AnchorRequest {
    html: String,
    source: String,
}

#[derive(Debug, Serialize)]
struct AnchorResponse {
    matched: bool,
    marker_count: usize,
    html: String,
}

/// Server-side rendition of the highlight engine: anchor `source` inside the
/// posted markup and return it with markers applied.
async fn anchor_handler(Json(req): Json<AnchorRequest>) -> Json<AnchorResponse> {
    let mut engine = Highlighter::from_html(&req.html);
    let matched = engine.highlight(&req.source);
    Json(AnchorResponse {
        matched,
        marker_count: engine.marker_count(),
        html: engine.html(),
    })
}
