//! Built-in Tools for the Stage Workers
//!
//! # Module Structure
//!
//! - [`registry`](crate::tools::registry) - Tool trait, registration and discovery
//! - [`search`](crate::tools::search) - Simulated web search
//! - [`code_executor`](crate::tools::code_executor) - Sandboxed snippet execution with a timeout
//! - [`analysis`](crate::tools::analysis) - Search summaries, readability and topic tags
//! - [`sentiment`](crate::tools::sentiment) - Lexicon sentiment scoring
//! - [`optimizer`](crate::tools::optimizer) - Rule-based content post-processing
//!
//! Only `web_search` and `code_executor` are exposed through the
//! [`ToolRegistry`]; the scoring helpers are plain functions the stages call
//! directly.
//!
//! ```ignore
//! let registry = ToolRegistry::with_default_tools(&config);
//! let result = registry.execute("web_search", json!({"query": "rust"})).await?;
//! ```

pub mod analysis;
pub mod code_executor;
pub mod optimizer;
/// Tool registry for managing available tools.
pub mod registry;
pub mod search;
pub mod sentiment;

pub use registry::{Tool, ToolRegistry, ToolSpec};
