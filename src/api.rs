//! HTTP API over the extraction service
//!
//! REST endpoints backed by a shared [`ExtractionService`]:
//! - `POST /api/v1/analyze`: run the extraction pass over a text blob
//! - `POST /api/v1/fields`: register a custom field name
//! - `GET  /api/v1/fields`: list known fields with counts and samples
//! - `GET  /api/v1/history`: recent extraction records, newest first
//! - `POST /api/v1/export`: flatten records into (Field, Value) rows
//! - `GET  /health`: liveness probe

use crate::extract::ExtractionRecord;
use crate::memory::HistoryEntry;
use crate::service::ExtractionService;
use axum::{
    extract::{Query, State},
    http::{header, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Shared state for all handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ExtractionService>,
}

/// Build the complete HTTP application
///
/// Mounts the health probe and the `/api/v1` routes, adds CORS middleware,
/// and returns a single `Router` ready to be served by `axum::serve`.
pub fn build_app(service: Arc<ExtractionService>, cors_origins: &[String]) -> Router {
    let cors = build_cors(cors_origins);
    let state = AppState { service };

    Router::new()
        .route("/health", get(health_check))
        .merge(api_router(state))
        .layer(cors)
}

fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/analyze", post(analyze))
        .route("/api/v1/fields", get(list_fields).post(register_field))
        .route("/api/v1/history", get(history))
        .route("/api/v1/export", post(export_rows))
        .with_state(state)
}

// =============================================================================
// Request / Response types
// =============================================================================

/// Request body for text analysis
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub text: String,
}

/// Request body for custom field registration
#[derive(Debug, Deserialize)]
pub struct RegisterFieldRequest {
    pub name: String,
}

/// Query params for the history endpoint
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

/// A known field with its observation stats
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldInfo {
    pub name: String,
    pub count: u64,
    pub samples: Vec<String>,
}

/// A history entry in API form
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntryResponse {
    pub id: String,
    pub created_at: String,
    pub record: ExtractionRecord,
}

impl From<&HistoryEntry> for HistoryEntryResponse {
    fn from(entry: &HistoryEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            created_at: entry.created_at.to_rfc3339(),
            record: entry.record.clone(),
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

// =============================================================================
// Handlers
// =============================================================================

async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// POST /api/v1/analyze — extract a record from raw text
async fn analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> impl IntoResponse {
    match state
        .service
        .analyze(&request.text)
        .await
        .and_then(|record| record.to_value())
    {
        Ok(value) => (StatusCode::OK, Json(value)),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": {"code": "ANALYZE_FAILED", "message": e.to_string()}})),
        ),
    }
}

/// POST /api/v1/fields — register a custom field name
async fn register_field(
    State(state): State<AppState>,
    Json(request): Json<RegisterFieldRequest>,
) -> impl IntoResponse {
    let name = request.name.trim();
    if name.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": {"code": "BAD_REQUEST", "message": "Field name must not be blank"}})),
        );
    }

    match state.service.register_field(name).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({"status": "registered", "name": name})),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": {"code": "REGISTER_FAILED", "message": e.to_string()}})),
        ),
    }
}

/// GET /api/v1/fields — known fields with counts and samples
async fn list_fields(State(state): State<AppState>) -> impl IntoResponse {
    let fields: Vec<FieldInfo> = state
        .service
        .field_stats()
        .await
        .into_iter()
        .map(|(name, stats)| FieldInfo {
            name,
            count: stats.count,
            samples: stats.samples,
        })
        .collect();

    Json(fields)
}

/// GET /api/v1/history?limit=n — recent extraction records, newest first
async fn history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> impl IntoResponse {
    let cap = state.service.history_capacity().await;
    let limit = query.limit.unwrap_or(cap).min(cap);

    let entries: Vec<HistoryEntryResponse> = state
        .service
        .history(limit)
        .await
        .iter()
        .map(HistoryEntryResponse::from)
        .collect();

    Json(entries)
}

/// POST /api/v1/export — flatten one record or a sequence into rows
async fn export_rows(
    State(state): State<AppState>,
    Json(payload): Json<serde_json::Value>,
) -> impl IntoResponse {
    Json(state.service.export(&payload))
}

// =============================================================================
// CORS
// =============================================================================

fn build_cors(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    if origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        let parsed: Vec<_> = origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(parsed)
    }
}
