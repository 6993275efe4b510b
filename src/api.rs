//! REST API Server for the utterance router
//!
//! Exposes classification and full transcript routing over HTTP

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::error::PipelineError;
use crate::pipeline::{ClassificationPipeline, ClassificationResult};

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub pipeline: Arc<ClassificationPipeline>,
}

/// =============================
/// Request Validation
/// =============================

/// Pull a string `text` field out of an arbitrary JSON body
fn extract_text(
    payload: std::result::Result<Json<serde_json::Value>, JsonRejection>,
) -> crate::Result<String> {
    let Json(body) = payload.map_err(|e| PipelineError::InvalidInput(e.body_text()))?;

    match body.get("text") {
        Some(serde_json::Value::String(text)) => Ok(text.clone()),
        Some(_) => Err(PipelineError::InvalidInput("`text` must be a string".to_string())),
        None => Err(PipelineError::InvalidInput("missing `text` field".to_string())),
    }
}

fn bad_request(error: PipelineError) -> (StatusCode, Json<ApiResponse>) {
    warn!("Rejected request: {}", error);
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::error(error.to_string())),
    )
}

/// =============================
/// Health Endpoint
/// =============================

async fn health(State(state): State<ApiState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "oracle": state.pipeline.oracle_name(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Classification Endpoint
/// =============================

async fn classify(
    State(state): State<ApiState>,
    payload: std::result::Result<Json<serde_json::Value>, JsonRejection>,
) -> std::result::Result<Json<ClassificationResult>, (StatusCode, Json<ApiResponse>)> {
    let text = extract_text(payload).map_err(bad_request)?;
    info!("Received classification request: {}", text);

    Ok(Json(state.pipeline.classify(&text).await))
}

/// =============================
/// Transcript Routing Endpoint
/// =============================

async fn route_transcript(
    State(state): State<ApiState>,
    payload: std::result::Result<Json<serde_json::Value>, JsonRejection>,
) -> (StatusCode, Json<ApiResponse>) {
    let text = match extract_text(payload) {
        Ok(text) => text,
        Err(e) => return bad_request(e),
    };
    info!("Received transcript: {}", text);

    let outcome = state.pipeline.process(&text).await;
    (StatusCode::OK, Json(ApiResponse::success(outcome)))
}

/// =============================
/// Router
/// =============================

pub fn create_router(pipeline: Arc<ClassificationPipeline>) -> Router {
    let state = ApiState { pipeline };

    Router::new()
        .route("/health", get(health))
        .route("/api/classify", post(classify))
        .route("/api/transcript", post(route_transcript))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    pipeline: Arc<ClassificationPipeline>,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(pipeline);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
