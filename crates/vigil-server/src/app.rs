//! HTTP surface
//!
//! Routes, all under the configured base path:
//!
//! - `POST /execute`: run a selection; 200, 206 or 500 by classification
//! - `GET /features`: ordered scenario paths
//! - `GET /health`: liveness
//! - `GET /info`: service description

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use vigil_core::effects::TimeEffects;
use vigil_engine::{ExecutionReport, ExecutionRequest, ExecutionService};

/// Service name reported by `/health` and `/info`
pub const SERVICE_NAME: &str = "vigil";

/// Shared state for handlers
#[derive(Clone)]
pub struct AppState {
    service: ExecutionService,
    time: Arc<dyn TimeEffects>,
}

impl AppState {
    /// State over an execution service; `time` stamps health responses
    pub fn new(service: ExecutionService, time: Arc<dyn TimeEffects>) -> Self {
        Self { service, time }
    }
}

/// Build the router for `state`, nested under the configured base path
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/execute", post(execute))
        .route("/features", get(features))
        .route("/health", get(health))
        .route("/info", get(service_info));

    let base_path = state.service.config().server.base_path.trim_end_matches('/').to_string();
    let app = if base_path.is_empty() {
        api
    } else {
        Router::new().nest(&base_path, api)
    };

    app.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    )
    .with_state(state)
}

fn report_response(report: ExecutionReport) -> Response {
    let status = StatusCode::from_u16(report.status.http_status())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(report.response)).into_response()
}

/// Run an execution request; an empty or `null` body means all defaults
async fn execute(State(state): State<AppState>, body: Bytes) -> Response {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        ExecutionRequest::default()
    } else {
        match serde_json::from_slice::<Option<ExecutionRequest>>(&body) {
            Ok(request) => request.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "rejecting malformed execution request");
                let report = state.service.fault(&format!("Invalid request body: {e}")).await;
                return report_response(report);
            }
        }
    };

    info!(
        tags = ?request.tags,
        feature = ?request.feature,
        threads = ?request.threads,
        "execution requested"
    );
    report_response(state.service.execute(request).await)
}

/// Catalog scenario paths in catalog order
async fn features(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.service.catalog().paths())
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "UP",
        "service": SERVICE_NAME,
        "timestamp": state.time.current_timestamp_millis().await,
    }))
}

async fn service_info(State(state): State<AppState>) -> impl IntoResponse {
    let config = state.service.config();
    let base = config.server.base_path.trim_end_matches('/');
    Json(json!({
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
        "defaultEnvironment": config.default_environment,
        "environments": config.environments.keys().collect::<Vec<_>>(),
        "scenarios": state.service.catalog().len(),
        "endpoints": [
            format!("POST {base}/execute"),
            format!("GET {base}/features"),
            format!("GET {base}/health"),
            format!("GET {base}/info"),
        ],
    }))
}
