//! Workflow Engine
//!
//! Owns every long-lived component of the pipeline and exposes the
//! operations callers need: submit, poll, list and the aggregate views.

use crate::agents::{
    AnalysisStage, AnalysisWorker, CoordinatorMetrics, ResearchStage, ResearchWorker,
    TaskCoordinator, WritingStage, WritingWorker,
};
use crate::llm::Generation;
use crate::memory::{MemoryBank, MemoryStats, SessionManager, SessionStats};
use crate::tasks::{InMemoryTaskStore, TaskRegistry, TaskSupervisor};
use crate::tools::search::WebSearchTool;
use crate::tools::ToolRegistry;
use crate::types::{
    AgentType, AppError, HealthResponse, Result, SystemStatus, Task, TaskRequest, TaskSummary,
};
use crate::utils::toml_config::ScribeConfig;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use utoipa::ToSchema;
use uuid::Uuid;

/// Interval between registry polls while waiting on a task.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// What one maintenance sweep removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MaintenanceReport {
    pub purged_tasks: usize,
    pub expired_memories: usize,
    pub expired_sessions: usize,
}

pub struct WorkflowEngine {
    config: ScribeConfig,
    registry: Arc<TaskRegistry>,
    coordinator: Arc<TaskCoordinator>,
    supervisor: TaskSupervisor,
    memory: MemoryBank,
    sessions: Arc<SessionManager>,
    tools: Arc<ToolRegistry>,
}

impl WorkflowEngine {
    /// Build the full pipeline from configuration and start the workers.
    ///
    /// An unreachable or misconfigured provider does not fail construction:
    /// the stages are built on fallback generation instead.
    pub async fn from_config(config: ScribeConfig) -> Result<Self> {
        config.validate()?;

        let generation =
            Generation::from_provider(config.llm.provider().as_ref(), config.llm.timeout()).await;
        let memory = MemoryBank::in_memory(Duration::from_secs(config.memory.ttl_secs));

        let research: ResearchStage = Arc::new(ResearchWorker::new(
            generation.clone(),
            WebSearchTool::new(config.search.max_results),
            memory.clone(),
        ));
        let writing: WritingStage = Arc::new(WritingWorker::new(generation.clone(), memory.clone()));
        let analysis: AnalysisStage = Arc::new(AnalysisWorker::new(generation, memory.clone()));

        Ok(Self::with_stages(config, memory, research, writing, analysis))
    }

    /// Assemble an engine around already-built stage workers.
    pub fn with_stages(
        config: ScribeConfig,
        memory: MemoryBank,
        research: ResearchStage,
        writing: WritingStage,
        analysis: AnalysisStage,
    ) -> Self {
        let registry = Arc::new(TaskRegistry::new(
            Arc::new(InMemoryTaskStore::new()),
            config.tasks.retention_policy(),
        ));
        let sessions = Arc::new(SessionManager::new());
        let coordinator = Arc::new(TaskCoordinator::new(
            research,
            writing,
            analysis,
            registry.clone(),
            sessions.clone(),
        ));
        coordinator.start();

        let tools = Arc::new(ToolRegistry::with_default_tools(&config));
        let supervisor = TaskSupervisor::new(registry.clone());

        Self {
            config,
            registry,
            coordinator,
            supervisor,
            memory,
            sessions,
            tools,
        }
    }

    pub fn config(&self) -> &ScribeConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<TaskRegistry> {
        &self.registry
    }

    pub fn tools(&self) -> &Arc<ToolRegistry> {
        &self.tools
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    pub fn memory(&self) -> &MemoryBank {
        &self.memory
    }

    /// Accept a request and schedule its coordination. Returns as soon as
    /// the pending task exists; failures surface later on the task record.
    #[tracing::instrument(skip(self, request), fields(topic = %request.topic))]
    pub async fn submit(&self, request: TaskRequest) -> Result<String> {
        if request.topic.trim().is_empty() {
            return Err(AppError::InvalidInput("topic must not be empty".to_string()));
        }

        let task_id = Uuid::new_v4().to_string();
        self.registry.create(task_id.clone(), request.clone());

        let coordinator = self.coordinator.clone();
        let id = task_id.clone();
        self.supervisor
            .spawn(&task_id, async move {
                coordinator.coordinate(&id, &request).await;
            })
            .await;

        tracing::info!(task_id = %task_id, "Task submitted");
        Ok(task_id)
    }

    pub fn get(&self, task_id: &str) -> Result<Task> {
        self.registry.get(task_id)
    }

    pub fn list(&self) -> Vec<TaskSummary> {
        self.registry.list()
    }

    /// Poll until `task_id` reaches a terminal status or `limit` elapses.
    pub async fn wait_for_terminal(&self, task_id: &str, limit: Duration) -> Result<Task> {
        let poll = async {
            loop {
                let task = self.registry.get(task_id)?;
                if task.status.is_terminal() {
                    return Ok(task);
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        };

        match tokio::time::timeout(limit, poll).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Internal(format!(
                "Timed out after {}s waiting for task {}",
                limit.as_secs(),
                task_id
            ))),
        }
    }

    /// Submit and wait for the terminal record. Each stage is bounded by the
    /// generation timeout, so the wait is bounded by a multiple of it.
    pub async fn run_to_completion(&self, request: TaskRequest) -> Result<Task> {
        let task_id = self.submit(request).await?;
        let limit = self
            .config
            .llm
            .timeout()
            .saturating_mul(4)
            .saturating_add(Duration::from_secs(30));
        self.wait_for_terminal(&task_id, limit).await
    }

    pub async fn system_status(&self) -> SystemStatus {
        let counts = self.registry.counts_by_status();
        let agents_online = self
            .coordinator
            .agent_health()
            .into_iter()
            .filter(|(_, running)| *running)
            .map(|(agent, _)| agent.as_str().to_string())
            .collect();

        SystemStatus {
            status: "operational".to_string(),
            active_tasks: counts.active(),
            total_tasks: counts.total(),
            agents_online,
            memory_entries: self.memory.get_memory_stats().await.total_memories,
            active_sessions: self.sessions.len(),
        }
    }

    pub fn coordinator_metrics(&self) -> CoordinatorMetrics {
        self.coordinator.metrics()
    }

    pub async fn memory_stats(&self) -> MemoryStats {
        self.memory.get_memory_stats().await
    }

    pub fn session_stats(&self) -> SessionStats {
        self.sessions.get_session_stats()
    }

    /// Per-component health. Any stopped worker degrades the whole report.
    pub async fn health(&self) -> HealthResponse {
        let mut components = BTreeMap::from([("api".to_string(), "healthy".to_string())]);

        for (agent, running) in self.coordinator.agent_health() {
            let name = match agent {
                AgentType::Coordinator => "coordinator".to_string(),
                other => format!("{}_agent", other.as_str()),
            };
            let state = if running { "healthy" } else { "stopped" };
            components.insert(name, state.to_string());
        }

        let memory_status = self.memory.get_memory_stats().await.status;
        let memory_state = if memory_status == "active" {
            "healthy".to_string()
        } else {
            memory_status
        };
        components.insert("memory_bank".to_string(), memory_state);
        components.insert("session_manager".to_string(), "healthy".to_string());

        let status = if components.values().all(|s| s == "healthy") {
            "healthy"
        } else {
            "degraded"
        };

        HealthResponse {
            status: status.to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            components,
        }
    }

    /// Reap finished coordinations and drop expired tasks, memories and
    /// sessions.
    pub async fn maintenance(&self) -> MaintenanceReport {
        self.supervisor.reap().await;

        let expired_memories = match self.memory.clear_old_memories().await {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(error = %e, "Memory cleanup failed");
                0
            }
        };

        let report = MaintenanceReport {
            purged_tasks: self.registry.purge_expired(),
            expired_memories,
            expired_sessions: self
                .sessions
                .cleanup_old_sessions(Duration::from_secs(self.config.sessions.max_age_secs)),
        };
        tracing::debug!(?report, "Maintenance sweep finished");
        report
    }

    /// Stop accepting work from the workers and drain in-flight
    /// coordinations. Returns how many had to be aborted.
    pub async fn shutdown(&self, grace: Duration) -> usize {
        let aborted = self.supervisor.shutdown(grace).await;
        self.coordinator.stop();
        aborted
    }
}
