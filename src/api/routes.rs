use crate::AppState;
use crate::api::handlers::{system, tasks};
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(system::root))
        .route("/research", post(tasks::submit_research))
        .route("/tasks", get(tasks::list_tasks))
        .route("/tasks/{task_id}", get(tasks::get_task))
        .route("/status", get(system::system_status))
        .route("/health", get(system::health))
        .route("/metrics", get(system::metrics))
        .route("/memory/stats", get(system::memory_stats))
        .route("/sessions/stats", get(system::session_stats))
        .route("/api-docs/openapi.json", get(system::openapi))
}

/// The complete application: routes, CORS, request tracing and state.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    create_router()
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
