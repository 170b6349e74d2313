//! Task records and their lifecycle.
//!
//! [`TaskRegistry`] owns every task record and enforces the
//! `Pending -> InProgress -> {Completed | Failed}` state machine on top of a
//! pluggable [`TaskStore`]. Records are partitioned by task id; writes to
//! different ids never contend beyond the store's own lock.

pub mod supervisor;

pub use supervisor::TaskSupervisor;

use crate::types::{AppError, Result, Task, TaskRequest, TaskResult, TaskStatus, TaskSummary};
use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use utoipa::ToSchema;

/// Storage backend for task records.
pub trait TaskStore: Send + Sync {
    fn put(&self, task: Task);
    fn get(&self, id: &str) -> Option<Task>;
    fn list(&self) -> Vec<Task>;
    fn remove(&self, id: &str) -> Option<Task>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read-modify-write a single record atomically. Returns `None` when the
    /// id is unknown.
    fn update(&self, id: &str, f: &mut dyn FnMut(&mut Task)) -> Option<Task>;
}

#[derive(Default)]
pub struct InMemoryTaskStore {
    tasks: RwLock<HashMap<String, Task>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TaskStore for InMemoryTaskStore {
    fn put(&self, task: Task) {
        self.tasks.write().insert(task.id.clone(), task);
    }

    fn get(&self, id: &str) -> Option<Task> {
        self.tasks.read().get(id).cloned()
    }

    fn list(&self) -> Vec<Task> {
        self.tasks.read().values().cloned().collect()
    }

    fn remove(&self, id: &str) -> Option<Task> {
        self.tasks.write().remove(id)
    }

    fn len(&self) -> usize {
        self.tasks.read().len()
    }

    fn update(&self, id: &str, f: &mut dyn FnMut(&mut Task)) -> Option<Task> {
        let mut tasks = self.tasks.write();
        let task = tasks.get_mut(id)?;
        f(task);
        Some(task.clone())
    }
}

/// How long finished tasks are kept and how many records are allowed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Terminal tasks older than this are purged. `None` keeps them forever.
    pub retention: Option<Duration>,
    /// Cap on stored records. Oldest terminal tasks are evicted first.
    pub max_tasks: Option<usize>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StatusCounts {
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub failed: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.pending + self.in_progress + self.completed + self.failed
    }

    /// Tasks not yet in a terminal status
    pub fn active(&self) -> usize {
        self.pending + self.in_progress
    }
}

pub struct TaskRegistry {
    store: Arc<dyn TaskStore>,
    policy: RetentionPolicy,
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new(Arc::new(InMemoryTaskStore::new()), RetentionPolicy::default())
    }
}

impl TaskRegistry {
    pub fn new(store: Arc<dyn TaskStore>, policy: RetentionPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> RetentionPolicy {
        self.policy
    }

    /// Create a pending task and return its record.
    pub fn create(&self, id: impl Into<String>, request: TaskRequest) -> Task {
        if let Some(cap) = self.policy.max_tasks {
            self.evict_to(cap.saturating_sub(1));
        }

        let task = Task::new(id, request);
        self.store.put(task.clone());
        tracing::debug!(task_id = %task.id, "Created task");
        task
    }

    pub fn get(&self, id: &str) -> Result<Task> {
        self.store
            .get(id)
            .ok_or_else(|| AppError::NotFound(format!("Task not found: {}", id)))
    }

    /// Summaries of every task, oldest first.
    pub fn list(&self) -> Vec<TaskSummary> {
        let mut tasks = self.store.list();
        tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        tasks.iter().map(Task::summary).collect()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn mark_in_progress(&self, id: &str) -> Result<Task> {
        self.transition(id, TaskStatus::InProgress, |_| {})
    }

    pub fn complete(&self, id: &str, result: TaskResult) -> Result<Task> {
        self.transition(id, TaskStatus::Completed, move |task| {
            task.result = Some(result.clone());
            task.completed_at = Some(Utc::now());
        })
    }

    pub fn fail(&self, id: &str, error: impl Into<String>) -> Result<Task> {
        let error = error.into();
        self.transition(id, TaskStatus::Failed, move |task| {
            task.error = Some(error.clone());
            task.completed_at = Some(Utc::now());
        })
    }

    /// Move a task to `next`, applying `apply` in the same write. Illegal
    /// transitions leave the record untouched.
    fn transition(
        &self,
        id: &str,
        next: TaskStatus,
        mut apply: impl FnMut(&mut Task),
    ) -> Result<Task> {
        let mut rejected_from = None;
        let updated = self.store.update(id, &mut |task: &mut Task| {
            if task.status.can_transition_to(next) {
                task.status = next;
                task.updated_at = Utc::now();
                apply(task);
            } else {
                rejected_from = Some(task.status);
            }
        });

        let task = updated.ok_or_else(|| AppError::NotFound(format!("Task not found: {}", id)))?;

        if let Some(from) = rejected_from {
            tracing::warn!(task_id = %id, from = %from, to = %next, "Rejected task status transition");
            return Err(AppError::InvalidInput(format!(
                "Task {} cannot move from {} to {}",
                id, from, next
            )));
        }

        tracing::debug!(task_id = %id, status = %next, "Task status updated");
        Ok(task)
    }

    pub fn counts_by_status(&self) -> StatusCounts {
        self.store
            .list()
            .iter()
            .fold(StatusCounts::default(), |mut counts, task| {
                match task.status {
                    TaskStatus::Pending => counts.pending += 1,
                    TaskStatus::InProgress => counts.in_progress += 1,
                    TaskStatus::Completed => counts.completed += 1,
                    TaskStatus::Failed => counts.failed += 1,
                }
                counts
            })
    }

    /// Drop terminal tasks that finished longer ago than the retention window.
    pub fn purge_expired(&self) -> usize {
        let Some(retention) = self.policy.retention else {
            return 0;
        };
        let now = Utc::now();

        let expired: Vec<String> = self
            .store
            .list()
            .into_iter()
            .filter(|task| task.status.is_terminal())
            .filter(|task| {
                let finished = task.completed_at.unwrap_or(task.updated_at);
                (now - finished)
                    .to_std()
                    .map(|age| age > retention)
                    .unwrap_or(false)
            })
            .map(|task| task.id)
            .collect();

        for id in &expired {
            self.store.remove(id);
        }
        if !expired.is_empty() {
            tracing::info!(removed = expired.len(), "Purged expired tasks");
        }
        expired.len()
    }

    /// Evict oldest terminal tasks until at most `target` records remain.
    /// Tasks still running are never evicted.
    fn evict_to(&self, target: usize) {
        let len = self.store.len();
        if len <= target {
            return;
        }

        let mut terminal: Vec<Task> = self
            .store
            .list()
            .into_iter()
            .filter(|task| task.status.is_terminal())
            .collect();
        terminal.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        for task in terminal.into_iter().take(len - target) {
            self.store.remove(&task.id);
            tracing::debug!(task_id = %task.id, "Evicted task to honour max_tasks");
        }
    }
}
