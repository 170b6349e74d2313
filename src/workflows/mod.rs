//! Workflow Engine Module
//!
//! The boundary between callers (HTTP handlers, the CLI) and the pipeline
//! core. A submitted [`TaskRequest`](crate::types::TaskRequest) becomes a
//! pending task immediately; coordination runs in the background under the
//! [`TaskSupervisor`](crate::tasks::TaskSupervisor) and callers poll for the
//! result.
//!
//! # Usage
//!
//! ```ignore
//! let engine = WorkflowEngine::from_config(config).await?;
//! let task_id = engine.submit(TaskRequest::new("Machine Learning Applications")).await?;
//! let task = engine.wait_for_terminal(&task_id, Duration::from_secs(120)).await?;
//! println!("{}: {}", task.id, task.status);
//! ```

pub mod engine;

pub use engine::{MaintenanceReport, WorkflowEngine};
