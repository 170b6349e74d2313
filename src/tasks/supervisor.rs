//! Tracks background coordination so it can be observed and drained.

use crate::tasks::TaskRegistry;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::{Id, JoinError, JoinSet};

/// Error recorded on a task whose coordination panicked.
pub const PANIC_ERROR: &str = "task coordination panicked";

#[derive(Default)]
struct Inner {
    set: JoinSet<()>,
    ids: HashMap<Id, String>,
}

/// Owns the join handles of every in-flight coordination.
///
/// Finished handles are reaped on each spawn and on [`reap`](Self::reap). A
/// panicked coordination is turned into a `Failed` task so the record never
/// stays `InProgress`.
pub struct TaskSupervisor {
    inner: Mutex<Inner>,
    registry: Arc<TaskRegistry>,
}

impl TaskSupervisor {
    pub fn new(registry: Arc<TaskRegistry>) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            registry,
        }
    }

    /// Spawn `future` as the coordination for `task_id`.
    pub async fn spawn<F>(&self, task_id: &str, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut inner = self.inner.lock().await;
        self.drain_finished(&mut inner);

        let handle = inner.set.spawn(future);
        inner.ids.insert(handle.id(), task_id.to_string());
        tracing::debug!(task_id, in_flight = inner.set.len(), "Spawned coordination");
    }

    /// Number of coordinations still tracked.
    pub async fn in_flight(&self) -> usize {
        let mut inner = self.inner.lock().await;
        self.drain_finished(&mut inner);
        inner.set.len()
    }

    /// Collect finished coordinations without waiting.
    pub async fn reap(&self) -> usize {
        let mut inner = self.inner.lock().await;
        self.drain_finished(&mut inner)
    }

    /// Wait up to `grace` for in-flight work, then abort whatever remains.
    /// Returns the number of coordinations that were aborted.
    pub async fn shutdown(&self, grace: Duration) -> usize {
        let mut inner = self.inner.lock().await;
        tracing::info!(in_flight = inner.set.len(), grace_secs = grace.as_secs(), "Draining task supervisor");

        let drain = async {
            while let Some(joined) = inner.set.join_next_with_id().await {
                self.observe(&mut inner.ids, joined);
            }
        };
        let drained = tokio::time::timeout(grace, drain).await.is_ok();

        if drained {
            return 0;
        }

        let remaining = inner.set.len();
        tracing::warn!(remaining, "Grace period elapsed, aborting coordinations");
        inner.set.abort_all();
        while let Some(joined) = inner.set.join_next_with_id().await {
            self.observe(&mut inner.ids, joined);
        }
        remaining
    }

    fn drain_finished(&self, inner: &mut Inner) -> usize {
        let mut reaped = 0;
        while let Some(joined) = inner.set.try_join_next_with_id() {
            self.observe(&mut inner.ids, joined);
            reaped += 1;
        }
        reaped
    }

    fn observe(&self, ids: &mut HashMap<Id, String>, joined: Result<(Id, ()), JoinError>) {
        match joined {
            Ok((id, ())) => {
                ids.remove(&id);
            }
            Err(err) => {
                let task_id = ids.remove(&err.id());
                let task_id = task_id.as_deref().unwrap_or("<unknown>");

                if err.is_panic() {
                    tracing::error!(task_id, "Coordination panicked");
                    if let Err(e) = self.registry.fail(task_id, PANIC_ERROR) {
                        tracing::warn!(task_id, error = %e, "Could not record panic on task");
                    }
                } else {
                    tracing::warn!(task_id, "Coordination cancelled");
                    if let Err(e) = self.registry.fail(task_id, "task coordination cancelled") {
                        tracing::debug!(task_id, error = %e, "Cancelled task already terminal");
                    }
                }
            }
        }
    }
}
