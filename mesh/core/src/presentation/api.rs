// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::application::status::{StatusError, StatusService};
use crate::domain::agent::AgentId;
use crate::domain::snapshot::{AgentStatusView, MeshSnapshot};

pub struct AppState {
    pub status_service: Arc<dyn StatusService>,
    pub start_time: Instant,
}

pub fn app(service: Arc<dyn StatusService>) -> Router {
    let state = Arc::new(AppState {
        status_service: service,
        start_time: Instant::now(),
    });

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/agents/status", get(mesh_status_handler))
        .route("/api/agents/status/{agent_id}", get(agent_status_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "uptime_seconds": state.start_time.elapsed().as_secs(),
    }))
}

async fn mesh_status_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MeshSnapshot>, StatusError> {
    Ok(Json(state.status_service.get_mesh_status().await?))
}

async fn agent_status_handler(
    State(state): State<Arc<AppState>>,
    Path(agent_id): Path<String>,
) -> Result<Json<AgentStatusView>, StatusError> {
    let id = AgentId::new(agent_id);
    Ok(Json(state.status_service.get_agent_status(&id).await?))
}

impl IntoResponse for StatusError {
    fn into_response(self) -> Response {
        let status = match &self {
            StatusError::NotFound(_) => StatusCode::NOT_FOUND,
            StatusError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            StatusError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!("Status request failed: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
