//! Stage workers and the task coordinator.
//!
//! Each stage ([`ResearchWorker`], [`WritingWorker`], [`AnalysisWorker`])
//! implements [`StageWorker`]: one typed `run` operation plus message-based
//! dispatch over the fixed [`MessagePayload`] variants. The
//! [`TaskCoordinator`] sequences the three stages for a task.

pub mod analysis;
pub mod coordinator;
pub mod research;
pub mod writing;

pub use analysis::AnalysisWorker;
pub use coordinator::{CoordinatorMetrics, TaskCoordinator};
pub use research::ResearchWorker;
pub use writing::WritingWorker;

use crate::types::{
    AgentMessage, AnalysisInput, AnalysisReport, MessagePayload, ResearchInput, ResearchResult,
    Result, StageKind, WritingInput, WritingResult,
};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// What a stage reports back. `Failed` is an explicit, expected failure;
/// unexpected errors surface as `Err` from [`StageWorker::run`] instead.
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome<T> {
    Completed(T),
    Failed { reason: String },
}

impl<T> StageOutcome<T> {
    pub fn failed(reason: impl Into<String>) -> Self {
        StageOutcome::Failed {
            reason: reason.into(),
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, StageOutcome::Completed(_))
    }

    pub fn status(&self) -> &'static str {
        match self {
            StageOutcome::Completed(_) => "completed",
            StageOutcome::Failed { .. } => "failed",
        }
    }
}

/// Result of offering a message to a stage.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageReply<T> {
    Handled(StageOutcome<T>),
    /// The stage does not handle this kind of message.
    Rejected { message_type: &'static str },
}

/// Stage input that travels inside a [`MessagePayload`].
pub trait StageInput: Sized + Send + 'static {
    fn from_payload(payload: MessagePayload) -> std::result::Result<Self, MessagePayload>;
    fn into_payload(self) -> MessagePayload;
}

impl StageInput for ResearchInput {
    fn from_payload(payload: MessagePayload) -> std::result::Result<Self, MessagePayload> {
        match payload {
            MessagePayload::ResearchRequest(input) => Ok(input),
            other => Err(other),
        }
    }

    fn into_payload(self) -> MessagePayload {
        MessagePayload::ResearchRequest(self)
    }
}

impl StageInput for WritingInput {
    fn from_payload(payload: MessagePayload) -> std::result::Result<Self, MessagePayload> {
        match payload {
            MessagePayload::ContentRequest(input) => Ok(input),
            other => Err(other),
        }
    }

    fn into_payload(self) -> MessagePayload {
        MessagePayload::ContentRequest(self)
    }
}

impl StageInput for AnalysisInput {
    fn from_payload(payload: MessagePayload) -> std::result::Result<Self, MessagePayload> {
        match payload {
            MessagePayload::AnalysisRequest(input) => Ok(input),
            other => Err(other),
        }
    }

    fn into_payload(self) -> MessagePayload {
        MessagePayload::AnalysisRequest(self)
    }
}

/// Running flag shared by every worker.
#[derive(Debug, Default)]
pub struct WorkerState {
    running: AtomicBool,
}

impl WorkerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Base trait for all stage workers
#[async_trait]
pub trait StageWorker: Send + Sync {
    type Input: StageInput;
    type Output: Send + 'static;

    fn kind(&self) -> StageKind;

    /// Human-readable worker name, used in logs
    fn name(&self) -> &str;

    fn state(&self) -> &WorkerState;

    /// Execute the stage.
    async fn run(&self, input: Self::Input) -> Result<StageOutcome<Self::Output>>;

    /// Dispatch an incoming message to [`run`](Self::run) when it carries
    /// this stage's request kind.
    async fn process_message(&self, message: AgentMessage) -> Result<MessageReply<Self::Output>> {
        match Self::Input::from_payload(message.payload) {
            Ok(input) => Ok(MessageReply::Handled(self.run(input).await?)),
            Err(other) => {
                tracing::warn!(
                    worker = self.name(),
                    message_type = other.message_type(),
                    "Unknown message type"
                );
                Ok(MessageReply::Rejected {
                    message_type: other.message_type(),
                })
            }
        }
    }

    fn start(&self) {
        self.state().set_running(true);
        tracing::info!(worker = self.name(), "Worker started");
    }

    fn stop(&self) {
        self.state().set_running(false);
        tracing::info!(worker = self.name(), "Worker stopped");
    }

    fn is_running(&self) -> bool {
        self.state().is_running()
    }
}

pub type ResearchStage = Arc<dyn StageWorker<Input = ResearchInput, Output = ResearchResult>>;
pub type WritingStage = Arc<dyn StageWorker<Input = WritingInput, Output = WritingResult>>;
pub type AnalysisStage = Arc<dyn StageWorker<Input = AnalysisInput, Output = AnalysisReport>>;
