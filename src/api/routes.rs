use axum::{
    routing::{get, post},
    Router,
    extract::{Json, State},
    response::IntoResponse,
};
use chrono::{Duration, Local};
use serde_json::{json, Value};
use tower_http::cors::{CorsLayer, Any};
use tracing::info;

use crate::error::Result;
use crate::api::models::{FetchNewsRequest, ProcessNewsRequest};
use crate::api::response;
use crate::timeparse::format_datetime;
use crate::AppState;

pub const FETCH_NEWS_DESCRIPTION: &str = "Fetch the news published on the given pages within a time range. \
Without return_content each result carries the URL, publication time and title; \
with return_content it also carries the article text.";

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/tools", get(tools_handler))
        .route("/api/fetch-news", post(fetch_news_handler))
        .route("/api/process-news", post(process_news_handler))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(app_state)
}

async fn health_handler() -> &'static str {
    "OK"
}

/// Describes `fetch_news` for agent hosts that discover tools over HTTP.
pub fn fetch_news_tool() -> Value {
    json!({
        "name": "fetch_news",
        "description": FETCH_NEWS_DESCRIPTION,
        "endpoint": "/api/fetch-news",
        "input_schema": {
            "type": "object",
            "properties": {
                "urls": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "URLs of the pages to read"
                },
                "start_time": {
                    "type": "string",
                    "description": "Start of the range, YYYY-MM-DD HH:MM:SS (default: 24 hours ago)"
                },
                "end_time": {
                    "type": "string",
                    "description": "End of the range, YYYY-MM-DD HH:MM:SS (default: now)"
                },
                "return_content": {
                    "type": "boolean",
                    "description": "Whether to include the article text",
                    "default": true
                }
            },
            "required": ["urls"]
        }
    })
}

async fn tools_handler() -> impl IntoResponse {
    axum::Json(json!({ "tools": [fetch_news_tool()] }))
}

async fn fetch_news_handler(
    State(state): State<AppState>,
    Json(req): Json<FetchNewsRequest>,
) -> impl IntoResponse {
    let now = Local::now().naive_local();
    let start_time = req
        .start_time
        .unwrap_or_else(|| format_datetime(&(now - Duration::hours(24))));
    let end_time = req.end_time.unwrap_or_else(|| format_datetime(&now));

    info!(urls = req.urls.len(), %start_time, %end_time, return_content = req.return_content, "fetch_news called");
    let started = std::time::Instant::now();

    let results = state
        .pipeline
        .fetch_news(&req.urls, &start_time, &end_time, req.return_content)
        .await;

    info!(count = results.len(), elapsed = ?started.elapsed(), "fetch_news finished");
    response::success(results)
}

async fn process_news_handler(
    State(state): State<AppState>,
    Json(req): Json<ProcessNewsRequest>,
) -> Result<impl IntoResponse> {
    info!(url = %req.url, "process_news called");
    let started = std::time::Instant::now();

    let results = state
        .pipeline
        .process_news(
            &req.url,
            &req.start_time,
            &req.end_time,
            req.enable_summary,
            req.return_content,
        )
        .await?;

    info!(count = results.len(), elapsed = ?started.elapsed(), "process_news finished");
    Ok(response::success(results))
}
