//! LLM Provider Clients and the Generation Capability
//!
//! This module provides a unified interface for interacting with the text
//! generation backends. Stage workers never talk to a client directly: they
//! hold a [`Generation`], which is either a live client or the deterministic
//! fallback, chosen once at construction.
//!
//! # Architecture
//!
//! - [`LLMClient`] - The core trait that all providers implement
//! - [`Provider`] - Create clients from configuration
//! - [`Generation`] - Live-or-fallback wrapper used by the stages
//!
//! # Supported Providers
//!
//! Enable providers via Cargo features:
//! - `ollama` - Local Ollama server (default)
//!
//! # Example
//!
//! ```ignore
//! use scribe::llm::{Generation, Provider};
//!
//! let provider = Provider::Ollama {
//!     base_url: "http://localhost:11434".to_string(),
//!     model: "llama3.2".to_string(),
//! };
//! let generation = Generation::from_provider(Some(&provider), timeout).await;
//! let out = generation.generate_or("Summarise Rust", || "fallback".into()).await;
//! ```

/// Core LLM client trait and provider selection.
pub mod client;
/// Live-or-fallback generation capability.
pub mod generation;

#[cfg(feature = "ollama")]
pub mod ollama;

pub use client::{LLMClient, Provider};
pub use generation::{Generated, Generation, DEFAULT_GENERATION_TIMEOUT};
