//! REST API Server for the Financial Decision Orchestrator
//!
//! Thin transport over [`DecisionService`]: JSON in, `ApiResponse` out, and
//! one SSE endpoint for streaming analysis.

use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use futures::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::error::DecisionError;
use crate::models::{FinancialAction, UserProfile};
use crate::service::DecisionService;

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SimulateRequest {
    pub user: UserProfile,
    pub action: FinancialAction,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CompareRequest {
    pub user: UserProfile,
    pub actions: Vec<FinancialAction>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AnalyzeRequest {
    pub user: UserProfile,
    pub action: FinancialAction,
    #[serde(default = "default_true")]
    pub evaluate_with_agents: bool,
}

fn default_true() -> bool {
    true
}

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

type ApiResult = (StatusCode, Json<ApiResponse>);

/// Rejected input is reported as-is; anything else is a generic failure
fn failure(e: DecisionError) -> ApiResult {
    match e {
        DecisionError::InvalidInput(_) | DecisionError::DegenerateGoalState { .. } => {
            (StatusCode::BAD_REQUEST, Json(ApiResponse::error(e.to_string())))
        }
        other => {
            error!(error = %other, "Request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("Analysis is currently unavailable".into())),
            )
        }
    }
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub service: Arc<DecisionService>,
}

/// =============================
/// Health Endpoint
/// =============================

async fn health(State(state): State<ApiState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "agents": state.service.agent_set(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Decision Endpoints
/// =============================

async fn simulate(State(state): State<ApiState>, Json(req): Json<SimulateRequest>) -> ApiResult {
    info!(action = %req.action.kind(), amount = req.action.amount(), "Received simulate request");

    match state.service.evaluate(&req.user, &req.action, false).await {
        Ok(evaluation) => (StatusCode::OK, Json(ApiResponse::success(evaluation))),
        Err(e) => failure(e),
    }
}

async fn compare(State(state): State<ApiState>, Json(req): Json<CompareRequest>) -> ApiResult {
    info!(actions = req.actions.len(), "Received compare request");

    match state.service.compare(&req.user, &req.actions) {
        Ok(results) => (StatusCode::OK, Json(ApiResponse::success(results))),
        Err(e) => failure(e),
    }
}

async fn analyze(State(state): State<ApiState>, Json(req): Json<AnalyzeRequest>) -> ApiResult {
    info!(
        action = %req.action.kind(),
        amount = req.action.amount(),
        with_agents = req.evaluate_with_agents,
        "Received analyze request"
    );

    match state
        .service
        .evaluate(&req.user, &req.action, req.evaluate_with_agents)
        .await
    {
        Ok(evaluation) => (StatusCode::OK, Json(ApiResponse::success(evaluation))),
        Err(e) => failure(e),
    }
}

async fn analyze_stream(
    State(state): State<ApiState>,
    Json(req): Json<SimulateRequest>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!(action = %req.action.kind(), "Received streaming analyze request");

    let rx = state.service.clone().evaluate_streaming(req.user, req.action);

    let events = stream::unfold(rx, |mut rx| async move {
        let event = rx.recv().await?;
        let sse = Event::default()
            .event(event.event_name())
            .json_data(&event)
            .unwrap_or_else(|e| Event::default().event("error").data(e.to_string()));
        Some((Ok(sse), rx))
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

/// =============================
/// Router
/// =============================

pub fn create_router(service: Arc<DecisionService>) -> Router {
    let state = ApiState { service };

    Router::new()
        .route("/health", get(health))
        .route("/api/simulate", post(simulate))
        .route("/api/compare", post(compare))
        .route("/api/analyze", post(analyze))
        .route("/api/analyze/stream", post(analyze_stream))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    service: Arc<DecisionService>,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(service);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
