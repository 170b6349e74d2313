//! HTTP API Handlers and Routes
//!
//! A thin axum adapter over [`WorkflowEngine`](crate::workflows::WorkflowEngine).
//!
//! # API Endpoints
//!
//! - `POST /research` - Submit a topic, returns a task id immediately
//! - `GET /tasks` - List task summaries
//! - `GET /tasks/{task_id}` - Poll one task (404 when unknown)
//! - `GET /status` - Aggregate status
//! - `GET /health` - Component health
//! - `GET /metrics` - Coordinator counters
//! - `GET /memory/stats`, `GET /sessions/stats`
//!
//! The OpenAPI document is served at `/api-docs/openapi.json`.

/// Request and response handlers for all API endpoints.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;

use crate::agents::CoordinatorMetrics;
use crate::memory::{MemoryStats, SessionEvent, SessionInfo, SessionStats};
use crate::types::{
    AnalysisReport, GenerationSource, HealthResponse, ResearchResult, SearchAnalysis, Sentiment,
    SentimentReport, SubmitResponse, SystemStatus, Task, TaskListResponse, TaskRequest,
    TaskResult, TaskStatus, TaskSummary, Timeline,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Scribe API",
        description = "Multi-agent research, writing and analysis pipeline"
    ),
    paths(
        handlers::system::root,
        handlers::tasks::submit_research,
        handlers::tasks::list_tasks,
        handlers::tasks::get_task,
        handlers::system::system_status,
        handlers::system::health,
        handlers::system::metrics,
        handlers::system::memory_stats,
        handlers::system::session_stats,
    ),
    components(schemas(
        TaskRequest,
        SubmitResponse,
        Task,
        TaskStatus,
        TaskSummary,
        TaskListResponse,
        TaskResult,
        Timeline,
        ResearchResult,
        SearchAnalysis,
        AnalysisReport,
        SentimentReport,
        Sentiment,
        GenerationSource,
        SystemStatus,
        HealthResponse,
        CoordinatorMetrics,
        MemoryStats,
        SessionStats,
        SessionInfo,
        SessionEvent,
        handlers::system::ServiceInfo,
    )),
    tags(
        (name = "tasks", description = "Submit and poll content tasks"),
        (name = "system", description = "Status, health and statistics")
    )
)]
pub struct ApiDoc;
