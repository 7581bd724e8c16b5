//! Web API Server
//!
//! HTTP surface for the effect-generation pipeline (feature `web-api`).
//!
//! ## Endpoints
//!
//! - `POST /api/v1/generate` — Submit an effect description (JSON), receive
//!   generated source plus selection metadata
//! - `GET  /health` — Health check with request counters
//! - `GET  /metrics` — Prometheus metrics (text exposition format)

use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::config::ServerSection;
use crate::generate::{GenerationOptions, Platform};
use crate::metrics;
use crate::pipeline::EffectPipeline;
use crate::selection::DecisionContext;
use crate::{EffectError, EffectRequest, EffectResponse};

// ============================================================================
// Types
// ============================================================================

/// JSON body for `POST /api/v1/generate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// The effect description to generate from.
    pub description: String,
    /// Optional client-supplied request identifier; one is generated if
    /// absent.
    #[serde(default)]
    pub request_id: Option<String>,
    /// Optional decision context for the selector.
    #[serde(default)]
    pub context: Option<DecisionContext>,
    /// Target platform (defaults to WebGL 2).
    #[serde(default)]
    pub platform: Platform,
    /// Generation tuning options.
    #[serde(default)]
    pub options: GenerationOptions,
}

/// JSON error body returned on failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error description.
    pub error: String,
}

/// JSON body for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"` when the server is responding.
    pub status: String,
    /// Requests processed so far, keyed by pipeline stage.
    pub requests_total: std::collections::HashMap<String, u64>,
    /// Requests served by the default-module fallback.
    pub fallbacks: u64,
}

/// Shared handler state.
#[derive(Clone)]
struct ApiState {
    pipeline: EffectPipeline,
}

// ============================================================================
// Handlers
// ============================================================================

async fn generate(
    State(state): State<ApiState>,
    Json(body): Json<GenerateRequest>,
) -> Result<Json<EffectResponse>, (StatusCode, Json<ErrorResponse>)> {
    let request = EffectRequest {
        request_id: body.request_id.unwrap_or_default(),
        description: body.description,
        context: body.context,
        platform: body.platform,
        options: body.options,
    };

    match state.pipeline.handle(request).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            let status = match &e {
                EffectError::ConceptExtraction(_) => StatusCode::BAD_GATEWAY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            Err((
                status,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            ))
        }
    }
}

async fn health() -> Json<HealthResponse> {
    let summary = metrics::get_metrics_summary();
    Json(HealthResponse {
        status: "ok".to_string(),
        requests_total: summary.requests_total,
        fallbacks: summary.fallbacks,
    })
}

async fn metrics_text() -> impl IntoResponse {
    metrics::gather_metrics()
}

// ============================================================================
// Router & server
// ============================================================================

/// Build the API router for the given pipeline.
///
/// # Panics
///
/// This function never panics.
pub fn router(pipeline: EffectPipeline, max_request_size: usize) -> Router {
    Router::new()
        .route("/api/v1/generate", post(generate))
        .route("/health", get(health))
        .route("/metrics", get(metrics_text))
        .layer(DefaultBodyLimit::max(max_request_size))
        .layer(CorsLayer::permissive())
        .with_state(ApiState { pipeline })
}

/// Bind and serve the API until the process exits.
///
/// # Errors
///
/// Returns [`EffectError::Other`] if the listener cannot bind or the server
/// loop fails.
///
/// # Panics
///
/// This function never panics.
pub async fn serve(config: &ServerSection, pipeline: EffectPipeline) -> Result<(), EffectError> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| EffectError::Other(format!("bind {addr} failed: {e}")))?;
    info!(addr = %addr, "web API listening");

    axum::serve(listener, router(pipeline, config.max_request_size))
        .await
        .map_err(|e| EffectError::Other(format!("server error: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_state() -> ApiState {
        ApiState {
            pipeline: EffectPipeline::with_defaults().expect("default pipeline builds"),
        }
    }

    #[tokio::test]
    async fn test_generate_handler_returns_source() {
        let state = make_state();
        let body = GenerateRequest {
            description: "fire explosion".to_string(),
            request_id: Some("req-http-1".to_string()),
            context: None,
            platform: Platform::default(),
            options: GenerationOptions::default(),
        };

        let result = generate(State(state), Json(body)).await;
        let Json(response) = result.expect("request succeeds");
        assert_eq!(response.request_id, "req-http-1");
        assert!(response.source.contains("registerEffectModule"));
    }

    #[tokio::test]
    async fn test_generate_handler_fills_request_id() {
        let state = make_state();
        let body = GenerateRequest {
            description: "glowing waves".to_string(),
            request_id: None,
            context: None,
            platform: Platform::default(),
            options: GenerationOptions::default(),
        };

        let Json(response) = generate(State(state), Json(body)).await.expect("succeeds");
        assert!(!response.request_id.is_empty());
    }

    #[tokio::test]
    async fn test_health_handler_reports_ok() {
        let Json(response) = health().await;
        assert_eq!(response.status, "ok");
    }

    #[test]
    fn test_generate_request_minimal_json() {
        let body: GenerateRequest =
            serde_json::from_str(r#"{"description":"sparks"}"#).expect("minimal body parses");
        assert_eq!(body.description, "sparks");
        assert!(body.request_id.is_none());
        assert_eq!(body.platform, Platform::Webgl2);
    }
}
