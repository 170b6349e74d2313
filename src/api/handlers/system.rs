use crate::{
    AppState,
    agents::CoordinatorMetrics,
    api::ApiDoc,
    memory::{MemoryStats, SessionStats},
    types::{HealthResponse, SystemStatus},
};
use axum::{Json, extract::State};
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub tools: Vec<String>,
    pub endpoints: Vec<String>,
}

#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Service information", body = ServiceInfo)),
    tag = "system"
)]
pub async fn root(State(state): State<AppState>) -> Json<ServiceInfo> {
    Json(ServiceInfo {
        name: "Scribe".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        description: "Multi-agent research and content pipeline".to_string(),
        tools: state.engine.tools().tool_names(),
        endpoints: [
            "POST /research",
            "GET /tasks",
            "GET /tasks/{task_id}",
            "GET /status",
            "GET /health",
            "GET /metrics",
            "GET /memory/stats",
            "GET /sessions/stats",
            "GET /api-docs/openapi.json",
        ]
        .iter()
        .map(|e| e.to_string())
        .collect(),
    })
}

#[utoipa::path(
    get,
    path = "/status",
    responses((status = 200, description = "Aggregate system status", body = SystemStatus)),
    tag = "system"
)]
pub async fn system_status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(state.engine.system_status().await)
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Component health", body = HealthResponse)),
    tag = "system"
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(state.engine.health().await)
}

#[utoipa::path(
    get,
    path = "/metrics",
    responses((status = 200, description = "Coordinator counters", body = CoordinatorMetrics)),
    tag = "system"
)]
pub async fn metrics(State(state): State<AppState>) -> Json<CoordinatorMetrics> {
    Json(state.engine.coordinator_metrics())
}

#[utoipa::path(
    get,
    path = "/memory/stats",
    responses((status = 200, description = "Memory bank statistics", body = MemoryStats)),
    tag = "system"
)]
pub async fn memory_stats(State(state): State<AppState>) -> Json<MemoryStats> {
    Json(state.engine.memory_stats().await)
}

#[utoipa::path(
    get,
    path = "/sessions/stats",
    responses((status = 200, description = "Session statistics", body = SessionStats)),
    tag = "system"
)]
pub async fn session_stats(State(state): State<AppState>) -> Json<SessionStats> {
    Json(state.engine.session_stats())
}

pub async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
