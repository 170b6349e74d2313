use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

// ============= API Request/Response Types =============

/// A request to turn a topic into a finished piece of content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TaskRequest {
    pub topic: String,
    #[serde(default = "default_content_type")]
    pub content_type: String,
    #[serde(default = "default_tone")]
    pub tone: String,
    #[serde(default = "default_length")]
    pub length: String,
    #[serde(default = "default_depth")]
    pub depth: String,
}

fn default_content_type() -> String {
    "article".to_string()
}

fn default_tone() -> String {
    "professional".to_string()
}

fn default_length() -> String {
    "medium".to_string()
}

fn default_depth() -> String {
    "comprehensive".to_string()
}

impl TaskRequest {
    /// Request for `topic` with every option left at its default.
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            content_type: default_content_type(),
            tone: default_tone(),
            length: default_length(),
            depth: default_depth(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn with_tone(mut self, tone: impl Into<String>) -> Self {
        self.tone = tone.into();
        self
    }

    pub fn with_length(mut self, length: impl Into<String>) -> Self {
        self.length = length.into();
        self
    }

    pub fn with_depth(mut self, depth: impl Into<String>) -> Self {
        self.depth = depth.into();
        self
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmitResponse {
    pub task_id: String,
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TaskListResponse {
    pub total_tasks: usize,
    pub tasks: Vec<TaskSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SystemStatus {
    pub status: String,
    /// Tasks that have not reached a terminal status yet
    pub active_tasks: usize,
    pub total_tasks: usize,
    pub agents_online: Vec<String>,
    pub memory_entries: usize,
    pub active_sessions: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub components: BTreeMap<String, String>,
}

// ============= Task Types =============

/// Lifecycle of a task. Only moves forward:
/// `Pending -> InProgress -> {Completed | Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    /// Whether the state machine allows moving from `self` to `next`.
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (TaskStatus::Pending, TaskStatus::InProgress)
                | (TaskStatus::InProgress, TaskStatus::Completed)
                | (TaskStatus::InProgress, TaskStatus::Failed)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Task {
    pub id: String,
    pub request: TaskRequest,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<TaskResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Task {
    pub fn new(id: impl Into<String>, request: TaskRequest) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            request,
            status: TaskStatus::Pending,
            created_at: now,
            updated_at: now,
            completed_at: None,
            result: None,
            error: None,
        }
    }

    pub fn summary(&self) -> TaskSummary {
        TaskSummary {
            task_id: self.id.clone(),
            topic: self.request.topic.clone(),
            status: self.status,
            created_at: self.created_at,
            content_type: self.request.content_type.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TaskSummary {
    pub task_id: String,
    pub topic: String,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub content_type: String,
}

/// Everything a completed task produced.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TaskResult {
    pub task_id: String,
    pub research: ResearchResult,
    pub content: String,
    pub analysis: AnalysisReport,
    pub timeline: Timeline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub struct Timeline {
    pub research_completed: bool,
    pub writing_completed: bool,
    pub analysis_completed: bool,
}

/// What a single `coordinate` call ended with.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskOutcome {
    Completed(Box<TaskResult>),
    Failed { task_id: String, error: String },
}

impl TaskOutcome {
    pub fn status(&self) -> TaskStatus {
        match self {
            TaskOutcome::Completed(_) => TaskStatus::Completed,
            TaskOutcome::Failed { .. } => TaskStatus::Failed,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, TaskOutcome::Completed(_))
    }
}

// ============= Agent Types =============

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum AgentType {
    Research,
    Writing,
    Analysis,
    Coordinator,
}

impl AgentType {
    pub fn as_str(self) -> &'static str {
        match self {
            AgentType::Research => "research",
            AgentType::Writing => "writing",
            AgentType::Analysis => "analysis",
            AgentType::Coordinator => "coordinator",
        }
    }
}

/// The three pipeline stages, in execution order.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum StageKind {
    Research,
    Writing,
    Analysis,
}

impl StageKind {
    pub fn agent_type(self) -> AgentType {
        match self {
            StageKind::Research => AgentType::Research,
            StageKind::Writing => AgentType::Writing,
            StageKind::Analysis => AgentType::Analysis,
        }
    }

    pub fn as_str(self) -> &'static str {
        self.agent_type().as_str()
    }
}

// ============= Stage Inputs =============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchInput {
    #[serde(default)]
    pub task_id: String,
    pub topic: String,
    #[serde(default = "default_depth")]
    pub depth: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WritingInput {
    pub research_content: String,
    #[serde(default = "default_content_type")]
    pub content_type: String,
    #[serde(default = "default_tone")]
    pub tone: String,
    #[serde(default = "default_length")]
    pub length: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisInput {
    pub content: String,
    #[serde(default = "default_analysis_type")]
    pub analysis_type: String,
}

fn default_analysis_type() -> String {
    "comprehensive".to_string()
}

// ============= Stage Results =============

/// Where a piece of stage text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum GenerationSource {
    Model,
    Fallback,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResearchResult {
    pub task_id: String,
    pub content: String,
    /// URLs of the search results that carried one
    pub sources: Vec<String>,
    pub key_findings: Vec<String>,
    pub confidence_score: f32,
    pub search_analysis: SearchAnalysis,
    pub generated_by: GenerationSource,
}

/// Aggregate view of the raw search results fed into research.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SearchAnalysis {
    pub total_items: usize,
    pub total_word_count: usize,
    pub average_words_per_item: f64,
    pub content_types: Vec<String>,
    pub quality_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WritingResult {
    pub content: String,
    pub content_type: String,
    pub tone: String,
    pub length: String,
    pub applied_rules: Vec<String>,
    pub generated_by: GenerationSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SentimentReport {
    pub sentiment: Sentiment,
    pub score: f64,
    pub positive_words: usize,
    pub negative_words: usize,
    pub total_words_analyzed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AnalysisReport {
    pub analysis: String,
    pub analysis_type: String,
    pub sentiment: SentimentReport,
    pub readability_score: f64,
    /// Length in characters
    pub content_length: usize,
    pub key_topics: Vec<String>,
    pub generated_by: GenerationSource,
}

/// A stage result tagged by the stage that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "stage", content = "payload", rename_all = "lowercase")]
pub enum StageResult {
    Research(ResearchResult),
    Writing(WritingResult),
    Analysis(AnalysisReport),
}

impl StageResult {
    pub fn kind(&self) -> StageKind {
        match self {
            StageResult::Research(_) => StageKind::Research,
            StageResult::Writing(_) => StageKind::Writing,
            StageResult::Analysis(_) => StageKind::Analysis,
        }
    }
}

impl From<ResearchResult> for StageResult {
    fn from(result: ResearchResult) -> Self {
        StageResult::Research(result)
    }
}

impl From<WritingResult> for StageResult {
    fn from(result: WritingResult) -> Self {
        StageResult::Writing(result)
    }
}

impl From<AnalysisReport> for StageResult {
    fn from(report: AnalysisReport) -> Self {
        StageResult::Analysis(report)
    }
}

// ============= Agent Messages =============

/// Structured handoff between agents. Lives for the duration of one call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentMessage {
    pub sender: AgentType,
    pub receiver: AgentType,
    #[serde(flatten)]
    pub payload: MessagePayload,
    pub timestamp: DateTime<Utc>,
}

impl AgentMessage {
    pub fn new(sender: AgentType, receiver: AgentType, payload: MessagePayload) -> Self {
        Self {
            sender,
            receiver,
            payload,
            timestamp: Utc::now(),
        }
    }

    pub fn message_type(&self) -> &'static str {
        self.payload.message_type()
    }
}

/// The fixed set of message kinds agents exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "message_type", content = "content", rename_all = "snake_case")]
pub enum MessagePayload {
    ResearchRequest(ResearchInput),
    ContentRequest(WritingInput),
    AnalysisRequest(AnalysisInput),
    NewTask { task_id: String, request: TaskRequest },
}

impl MessagePayload {
    pub fn message_type(&self) -> &'static str {
        match self {
            MessagePayload::ResearchRequest(_) => "research_request",
            MessagePayload::ContentRequest(_) => "content_request",
            MessagePayload::AnalysisRequest(_) => "analysis_request",
            MessagePayload::NewTask { .. } => "new_task",
        }
    }
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("LLM error: {0}")]
    LLM(String),

    #[error("{0}")]
    Stage(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::NotFound(_) => axum::http::StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => axum::http::StatusCode::BAD_REQUEST,
            AppError::LLM(_)
            | AppError::Stage(_)
            | AppError::Configuration(_)
            | AppError::Internal(_) => axum::http::StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = serde_json::json!({
            "error": self.to_string()
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
