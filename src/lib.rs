//! # Scribe - multi-agent content pipeline
//!
//! Scribe turns a topic into a finished, scored piece of content. Three stage
//! workers run in a fixed order for every task:
//!
//! 1. **Research** gathers search results and writes a research report
//! 2. **Writing** turns the report into content of the requested type and tone
//! 3. **Analysis** scores the content (sentiment, readability, topics)
//!
//! A [`TaskCoordinator`](agents::TaskCoordinator) drives the stages and
//! records the outcome in the [`TaskRegistry`](tasks::TaskRegistry). Each
//! stage calls a language model when one is configured and reachable, and
//! otherwise produces deterministic fallback output, so a task always reaches
//! a terminal status.
//!
//! ## Usage
//!
//! Scribe can run as the `scribe-server` binary, or be embedded:
//!
//! ```rust,ignore
//! use scribe::{ScribeConfig, TaskRequest, WorkflowEngine};
//!
//! #[tokio::main]
//! async fn main() -> scribe::Result<()> {
//!     let engine = WorkflowEngine::from_config(ScribeConfig::default()).await?;
//!     let task = engine
//!         .run_to_completion(TaskRequest::new("Machine Learning Applications"))
//!         .await?;
//!     println!("{}: {}", task.id, task.status);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `ollama` | Ollama local inference (default) |
//! | `minimal` | No provider; fallback generation only |

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

/// Stage workers and the task coordinator.
pub mod agents;
/// HTTP API handlers and routes.
pub mod api;
/// Command-line parsing and terminal output.
pub mod cli;
/// LLM provider clients and the generation capability.
pub mod llm;
/// Memory bank and per-task sessions.
pub mod memory;
/// Task registry and supervision of background coordination.
pub mod tasks;
/// Search, scoring, optimisation and code execution tools.
pub mod tools;
/// Core types (requests, task records, messages, errors).
pub mod types;
/// Configuration utilities.
pub mod utils;
/// Submission boundary over the pipeline.
pub mod workflows;

// Re-export commonly used types
pub use agents::{StageWorker, TaskCoordinator};
pub use llm::{Generation, LLMClient, Provider};
pub use memory::{MemoryBank, SessionManager};
pub use tasks::{TaskRegistry, TaskSupervisor};
pub use tools::registry::ToolRegistry;
pub use types::{AppError, Result, Task, TaskRequest, TaskStatus};
pub use utils::toml_config::ScribeConfig;
pub use workflows::WorkflowEngine;

use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// The pipeline boundary every handler talks to; configuration is
    /// reachable through [`WorkflowEngine::config`].
    pub engine: Arc<WorkflowEngine>,
}

impl AppState {
    pub fn new(engine: Arc<WorkflowEngine>) -> Self {
        Self { engine }
    }
}
