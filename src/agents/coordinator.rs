//! Task Coordinator
//!
//! Drives one task through Research -> Writing -> Analysis. Each stage gets
//! its input as an [`AgentMessage`]; every handoff and state change is
//! mirrored into the task's session, and the final status is written to the
//! [`TaskRegistry`] exactly once.
//!
//! A stage that reports failure, or returns an error, ends the pipeline: the
//! task is marked `Failed` and later stages never run. Nothing is propagated
//! to the caller; the outcome is the return value.

use crate::agents::{
    AnalysisStage, MessageReply, ResearchStage, StageInput, StageOutcome, StageWorker,
    WorkerState, WritingStage,
};
use crate::memory::SessionManager;
use crate::tasks::TaskRegistry;
use crate::types::{
    AgentMessage, AgentType, AnalysisInput, AppError, MessagePayload, ResearchInput, Result,
    StageKind, StageResult, TaskOutcome, TaskRequest, TaskResult, Timeline, WritingInput,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use utoipa::ToSchema;

/// Analysis flavour requested for every finished piece of content.
const ANALYSIS_TYPE: &str = "quality";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CoordinatorMetrics {
    pub total_tasks: u64,
    pub completed_tasks: u64,
    pub failed_tasks: u64,
    pub success_rate: f64,
    pub active_sessions: usize,
}

/// How the stage sequence ended when no stage raised.
enum PipelineEnd {
    Completed(TaskResult),
    Aborted { stage: StageKind, reason: String },
}

pub struct TaskCoordinator {
    research: ResearchStage,
    writing: WritingStage,
    analysis: AnalysisStage,
    registry: Arc<TaskRegistry>,
    sessions: Arc<SessionManager>,
    state: WorkerState,
    total: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
}

impl TaskCoordinator {
    pub fn new(
        research: ResearchStage,
        writing: WritingStage,
        analysis: AnalysisStage,
        registry: Arc<TaskRegistry>,
        sessions: Arc<SessionManager>,
    ) -> Self {
        Self {
            research,
            writing,
            analysis,
            registry,
            sessions,
            state: WorkerState::new(),
            total: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    /// Start the coordinator and every stage worker.
    pub fn start(&self) {
        self.research.start();
        self.writing.start();
        self.analysis.start();
        self.state.set_running(true);
        tracing::info!("Coordinator started");
    }

    pub fn stop(&self) {
        self.research.stop();
        self.writing.stop();
        self.analysis.stop();
        self.state.set_running(false);
        tracing::info!("Coordinator stopped");
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// Running flag of each agent, keyed by agent name.
    pub fn agent_health(&self) -> BTreeMap<AgentType, bool> {
        BTreeMap::from([
            (AgentType::Research, self.research.is_running()),
            (AgentType::Writing, self.writing.is_running()),
            (AgentType::Analysis, self.analysis.is_running()),
            (AgentType::Coordinator, self.is_running()),
        ])
    }

    pub fn metrics(&self) -> CoordinatorMetrics {
        let total = self.total.load(Ordering::Relaxed);
        let completed = self.completed.load(Ordering::Relaxed);
        let failed = self.failed.load(Ordering::Relaxed);

        CoordinatorMetrics {
            total_tasks: total,
            completed_tasks: completed,
            failed_tasks: failed,
            success_rate: completed as f64 / total.max(1) as f64,
            active_sessions: self.sessions.len(),
        }
    }

    /// Handle a coordinator-bound message. Only `new_task` is accepted.
    pub async fn process_message(&self, message: AgentMessage) -> Result<TaskOutcome> {
        match message.payload {
            MessagePayload::NewTask { task_id, request } => {
                Ok(self.coordinate(&task_id, &request).await)
            }
            other => Err(AppError::InvalidInput(format!(
                "Coordinator does not handle message type: {}",
                other.message_type()
            ))),
        }
    }

    /// Run the full pipeline for `task_id`.
    ///
    /// Assumes at most one call per task id at a time.
    #[tracing::instrument(skip(self, request), fields(task_id = %task_id, topic = %request.topic))]
    pub async fn coordinate(&self, task_id: &str, request: &TaskRequest) -> TaskOutcome {
        self.total.fetch_add(1, Ordering::Relaxed);
        tracing::info!("Coordinating new task");

        self.sessions.create_session(task_id);
        self.sessions.with_session(task_id, |session| {
            session.set_context("topic", json!(request.topic));
            session.set_context("content_type", json!(request.content_type));
        });

        if let Err(e) = self.registry.mark_in_progress(task_id) {
            tracing::warn!(error = %e, "Could not mark task in progress");
        }
        self.sessions
            .update_state(task_id, "status", json!("in_progress"));

        let outcome = match self.run_stages(task_id, request).await {
            Ok(PipelineEnd::Completed(result)) => TaskOutcome::Completed(Box::new(result)),
            Ok(PipelineEnd::Aborted { stage, reason }) => {
                tracing::warn!(stage = stage.as_str(), %reason, "Stage reported failure");
                TaskOutcome::Failed {
                    task_id: task_id.to_string(),
                    error: format!("{} phase failed: {}", phase_label(stage), reason),
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Task coordination failed");
                TaskOutcome::Failed {
                    task_id: task_id.to_string(),
                    error: e.to_string(),
                }
            }
        };

        self.record(task_id, &outcome);
        outcome
    }

    async fn run_stages(&self, task_id: &str, request: &TaskRequest) -> Result<PipelineEnd> {
        let research = match self
            .dispatch(
                task_id,
                self.research.as_ref(),
                ResearchInput {
                    task_id: task_id.to_string(),
                    topic: request.topic.clone(),
                    depth: request.depth.clone(),
                },
            )
            .await?
        {
            StageOutcome::Completed(result) => result,
            StageOutcome::Failed { reason } => {
                return Ok(PipelineEnd::Aborted {
                    stage: StageKind::Research,
                    reason,
                });
            }
        };

        let writing = match self
            .dispatch(
                task_id,
                self.writing.as_ref(),
                WritingInput {
                    research_content: research.content.clone(),
                    content_type: request.content_type.clone(),
                    tone: request.tone.clone(),
                    length: request.length.clone(),
                },
            )
            .await?
        {
            StageOutcome::Completed(result) => result,
            StageOutcome::Failed { reason } => {
                return Ok(PipelineEnd::Aborted {
                    stage: StageKind::Writing,
                    reason,
                });
            }
        };

        let analysis = match self
            .dispatch(
                task_id,
                self.analysis.as_ref(),
                AnalysisInput {
                    content: writing.content.clone(),
                    analysis_type: ANALYSIS_TYPE.to_string(),
                },
            )
            .await?
        {
            StageOutcome::Completed(report) => report,
            StageOutcome::Failed { reason } => {
                return Ok(PipelineEnd::Aborted {
                    stage: StageKind::Analysis,
                    reason,
                });
            }
        };

        Ok(PipelineEnd::Completed(TaskResult {
            task_id: task_id.to_string(),
            research,
            content: writing.content,
            analysis,
            timeline: Timeline {
                research_completed: true,
                writing_completed: true,
                analysis_completed: true,
            },
        }))
    }

    /// Hand `input` to `stage` as a message and wait for its outcome.
    ///
    /// A completed output is also kept in the session as a `stage_result`
    /// event.
    async fn dispatch<I, O>(
        &self,
        task_id: &str,
        stage: &dyn StageWorker<Input = I, Output = O>,
        input: I,
    ) -> Result<StageOutcome<O>>
    where
        I: StageInput,
        O: Clone + Into<StageResult> + Send + 'static,
    {
        let kind = stage.kind();
        let message = AgentMessage::new(AgentType::Coordinator, kind.agent_type(), input.into_payload());

        let handoff = serde_json::to_value(&message).unwrap_or(Value::Null);
        self.sessions.with_session(task_id, |session| {
            session.update_state("current_step", json!(kind.as_str()));
            session.add_to_history("handoff", handoff);
        });
        tracing::debug!(stage = kind.as_str(), message_type = message.message_type(), "Dispatching stage");

        match stage.process_message(message).await? {
            MessageReply::Handled(outcome) => {
                tracing::debug!(stage = kind.as_str(), status = outcome.status(), "Stage finished");
                if let StageOutcome::Completed(output) = &outcome {
                    self.keep_stage_result(task_id, output.clone().into());
                }
                Ok(outcome)
            }
            MessageReply::Rejected { message_type } => Ok(StageOutcome::failed(format!(
                "{} stage rejected message type {}",
                kind.as_str(),
                message_type
            ))),
        }
    }

    fn keep_stage_result(&self, task_id: &str, result: StageResult) {
        let stage = result.kind();
        match serde_json::to_value(&result) {
            Ok(data) => {
                self.sessions.add_to_history(task_id, "stage_result", data);
            }
            Err(e) => {
                tracing::warn!(stage = stage.as_str(), error = %e, "Could not serialise stage result");
            }
        }
    }

    /// Write the terminal status to the registry and the session.
    ///
    /// The session sees `status` and the terminal payload in one update, with
    /// `status` first.
    fn record(&self, task_id: &str, outcome: &TaskOutcome) {
        let (key, payload) = match outcome {
            TaskOutcome::Completed(result) => {
                self.completed.fetch_add(1, Ordering::Relaxed);
                if let Err(e) = self.registry.complete(task_id, result.as_ref().clone()) {
                    tracing::warn!(error = %e, "Could not record task completion");
                }
                tracing::info!("Task completed");
                (
                    "completed",
                    serde_json::to_value(result.as_ref()).unwrap_or(Value::Null),
                )
            }
            TaskOutcome::Failed { error, .. } => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                if let Err(e) = self.registry.fail(task_id, error.clone()) {
                    tracing::warn!(error = %e, "Could not record task failure");
                }
                ("failed", json!({ "error": error }))
            }
        };

        self.sessions.with_session(task_id, |session| {
            session.update_state("status", json!(outcome.status().as_str()));
            session.update_state(key, payload);
        });
    }
}

fn phase_label(stage: StageKind) -> &'static str {
    match stage {
        StageKind::Research => "Research",
        StageKind::Writing => "Writing",
        StageKind::Analysis => "Analysis",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{AnalysisWorker, ResearchWorker, WritingWorker};
    use crate::llm::Generation;
    use crate::memory::MemoryBank;
    use crate::tools::search::WebSearchTool;
    use crate::types::TaskStatus;

    fn coordinator() -> (TaskCoordinator, Arc<TaskRegistry>, Arc<SessionManager>) {
        let memory = MemoryBank::default();
        let registry = Arc::new(TaskRegistry::default());
        let sessions = Arc::new(SessionManager::new());
        let coordinator = TaskCoordinator::new(
            Arc::new(ResearchWorker::new(
                Generation::Fallback,
                WebSearchTool::default(),
                memory.clone(),
            )),
            Arc::new(WritingWorker::new(Generation::Fallback, memory.clone())),
            Arc::new(AnalysisWorker::new(Generation::Fallback, memory)),
            registry.clone(),
            sessions.clone(),
        );
        (coordinator, registry, sessions)
    }

    #[tokio::test]
    async fn test_full_pipeline_completes() {
        let (coordinator, registry, sessions) = coordinator();
        let request = TaskRequest::new("Rust");
        registry.create("t1", request.clone());

        let outcome = coordinator.coordinate("t1", &request).await;
        let TaskOutcome::Completed(result) = outcome else {
            panic!("expected completion");
        };
        assert!(!result.content.is_empty());
        assert!(result.timeline.analysis_completed);
        assert_eq!(result.analysis.analysis_type, "quality");

        let task = registry.get("t1").unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert!(task.result.is_some());

        let session = sessions.get_session("t1").unwrap();
        let handoffs = session
            .history
            .iter()
            .filter(|e| e.event == "handoff")
            .count();
        assert_eq!(handoffs, 3);
        assert_eq!(session.get_state("status"), Some(&json!("completed")));

        let metrics = coordinator.metrics();
        assert_eq!(metrics.total_tasks, 1);
        assert_eq!(metrics.completed_tasks, 1);
        assert_eq!(metrics.success_rate, 1.0);
        assert_eq!(metrics.active_sessions, 1);
    }

    #[tokio::test]
    async fn test_process_message_rejects_stage_requests() {
        let (coordinator, _, _) = coordinator();
        let message = AgentMessage::new(
            AgentType::Research,
            AgentType::Coordinator,
            MessagePayload::AnalysisRequest(AnalysisInput {
                content: "x".to_string(),
                analysis_type: "quality".to_string(),
            }),
        );
        assert!(matches!(
            coordinator.process_message(message).await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_new_task_message_runs_pipeline() {
        let (coordinator, registry, _) = coordinator();
        let request = TaskRequest::new("Databases");
        registry.create("t2", request.clone());

        let message = AgentMessage::new(
            AgentType::Coordinator,
            AgentType::Coordinator,
            MessagePayload::NewTask {
                task_id: "t2".to_string(),
                request,
            },
        );
        let outcome = coordinator.process_message(message).await.unwrap();
        assert!(outcome.is_completed());
    }

    /// Replays `state_update` events and returns every state a reader could
    /// have observed between two updates.
    fn observed_states(session: &crate::memory::Session) -> Vec<BTreeMap<String, Value>> {
        let mut state = BTreeMap::new();
        let mut seen = Vec::new();
        for event in session.history.iter().filter(|e| e.event == "state_update") {
            if let Some(key) = event.data["key"].as_str() {
                state.insert(key.to_string(), event.data["value"].clone());
            }
            seen.push(state.clone());
        }
        seen
    }

    #[tokio::test]
    async fn test_terminal_payload_never_precedes_terminal_status() {
        let (coordinator, registry, sessions) = coordinator();
        let request = TaskRequest::new("Rust");
        registry.create("t1", request.clone());
        coordinator.coordinate("t1", &request).await;

        let session = sessions.get_session("t1").unwrap();
        let states = observed_states(&session);
        assert!(!states.is_empty());
        for state in &states {
            if state.contains_key("completed") || state.contains_key("failed") {
                let status = state.get("status").and_then(Value::as_str);
                assert!(
                    matches!(status, Some("completed") | Some("failed")),
                    "terminal payload visible with status {:?}",
                    status
                );
            }
        }
        assert!(states.last().unwrap().contains_key("completed"));
    }

    #[tokio::test]
    async fn test_each_handoff_follows_its_current_step() {
        let (coordinator, registry, sessions) = coordinator();
        let request = TaskRequest::new("Rust");
        registry.create("t1", request.clone());
        coordinator.coordinate("t1", &request).await;

        let history = sessions.get_session("t1").unwrap().history;
        let steps: Vec<&str> = history
            .windows(2)
            .filter(|pair| pair[1].event == "handoff")
            .map(|pair| {
                assert_eq!(pair[0].data["key"], "current_step");
                pair[0].data["value"].as_str().unwrap_or_default()
            })
            .collect();
        assert_eq!(steps, vec!["research", "writing", "analysis"]);
    }

    #[tokio::test]
    async fn test_stage_results_are_kept_in_order() {
        let (coordinator, registry, sessions) = coordinator();
        let request = TaskRequest::new("Rust");
        registry.create("t1", request.clone());
        coordinator.coordinate("t1", &request).await;

        let history = sessions.get_session("t1").unwrap().history;
        let stages: Vec<&str> = history
            .iter()
            .filter(|e| e.event == "stage_result")
            .filter_map(|e| e.data["stage"].as_str())
            .collect();
        assert_eq!(stages, vec!["research", "writing", "analysis"]);

        let last = history.iter().rfind(|e| e.event == "stage_result").unwrap();
        let report: StageResult = serde_json::from_value(last.data.clone()).unwrap();
        assert_eq!(report.kind(), StageKind::Analysis);
    }

    #[test]
    fn test_lifecycle_covers_all_agents() {
        let (coordinator, _, _) = coordinator();
        assert!(coordinator.agent_health().values().all(|running| !running));
        coordinator.start();
        assert!(coordinator.agent_health().values().all(|running| *running));
        coordinator.stop();
        assert!(!coordinator.is_running());
    }
}
