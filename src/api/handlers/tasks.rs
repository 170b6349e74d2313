use crate::{
    AppState,
    types::{Result, SubmitResponse, Task, TaskListResponse, TaskRequest},
};
use axum::{
    Json,
    extract::{Path, State},
};

/// Start a content task. Returns immediately; poll `/tasks/{task_id}`.
#[utoipa::path(
    post,
    path = "/research",
    request_body = TaskRequest,
    responses(
        (status = 200, description = "Task accepted", body = SubmitResponse),
        (status = 400, description = "Empty topic")
    ),
    tag = "tasks"
)]
pub async fn submit_research(
    State(state): State<AppState>,
    Json(payload): Json<TaskRequest>,
) -> Result<Json<SubmitResponse>> {
    let task_id = state.engine.submit(payload).await?;

    Ok(Json(SubmitResponse {
        task_id,
        status: "started".to_string(),
        message: "Research and content creation task initiated".to_string(),
    }))
}

#[utoipa::path(
    get,
    path = "/tasks/{task_id}",
    params(("task_id" = String, Path, description = "Task identifier")),
    responses(
        (status = 200, description = "Task record", body = Task),
        (status = 404, description = "Unknown task")
    ),
    tag = "tasks"
)]
pub async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<Task>> {
    Ok(Json(state.engine.get(&task_id)?))
}

#[utoipa::path(
    get,
    path = "/tasks",
    responses((status = 200, description = "All tasks, oldest first", body = TaskListResponse)),
    tag = "tasks"
)]
pub async fn list_tasks(State(state): State<AppState>) -> Json<TaskListResponse> {
    let tasks = state.engine.list();
    Json(TaskListResponse {
        total_tasks: tasks.len(),
        tasks,
    })
}
