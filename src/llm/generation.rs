//! Generation capability used by the stage workers.
//!
//! A worker is constructed with either a live model or the deterministic
//! fallback. Provider failures never leave this module: a failed or timed-out
//! live call is logged and replaced by the caller-supplied fallback text.

use crate::llm::client::{LLMClient, Provider};
use crate::types::GenerationSource;
use std::sync::Arc;
use std::time::Duration;

/// Default wall-clock limit for a single live generation call.
pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(60);

/// Text produced for a stage, tagged with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Generated {
    pub text: String,
    pub source: GenerationSource,
}

impl Generated {
    pub fn is_fallback(&self) -> bool {
        self.source == GenerationSource::Fallback
    }
}

#[derive(Clone)]
pub enum Generation {
    /// Call a model, falling back on error or timeout.
    Live {
        client: Arc<dyn LLMClient>,
        timeout: Duration,
    },
    /// Always use the deterministic fallback.
    Fallback,
}

impl std::fmt::Debug for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Generation::Live { client, timeout } => f
                .debug_struct("Live")
                .field("model", &client.model_name())
                .field("timeout", timeout)
                .finish(),
            Generation::Fallback => f.write_str("Fallback"),
        }
    }
}

impl Generation {
    pub fn live(client: Arc<dyn LLMClient>) -> Self {
        Generation::Live {
            client,
            timeout: DEFAULT_GENERATION_TIMEOUT,
        }
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        match self {
            Generation::Live { client, .. } => Generation::Live { client, timeout },
            Generation::Fallback => Generation::Fallback,
        }
    }

    /// Build from an optional provider. A provider whose client cannot be
    /// created degrades to `Fallback` with a warning.
    pub async fn from_provider(provider: Option<&Provider>, timeout: Duration) -> Self {
        let Some(provider) = provider else {
            tracing::info!("No LLM provider configured, stages will use fallback generation");
            return Generation::Fallback;
        };

        if !provider.is_implemented() {
            tracing::warn!(
                provider = provider.name(),
                "Provider not compiled into this build, using fallback generation"
            );
            return Generation::Fallback;
        }

        match provider.create_client().await {
            Ok(client) => {
                tracing::info!(
                    provider = provider.name(),
                    model = client.model_name(),
                    "Live generation enabled"
                );
                Generation::Live {
                    client: Arc::from(client),
                    timeout,
                }
            }
            Err(e) => {
                tracing::warn!(
                    provider = provider.name(),
                    error = %e,
                    "Could not create LLM client, using fallback generation"
                );
                Generation::Fallback
            }
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, Generation::Live { .. })
    }

    pub fn model_name(&self) -> Option<&str> {
        match self {
            Generation::Live { client, .. } => Some(client.model_name()),
            Generation::Fallback => None,
        }
    }

    /// Generate text for `prompt`, or build it with `fallback`.
    pub async fn generate_or<F>(&self, prompt: &str, fallback: F) -> Generated
    where
        F: FnOnce() -> String,
    {
        let (client, timeout) = match self {
            Generation::Live { client, timeout } => (client, *timeout),
            Generation::Fallback => {
                return Generated {
                    text: fallback(),
                    source: GenerationSource::Fallback,
                };
            }
        };

        match tokio::time::timeout(timeout, client.generate(prompt)).await {
            Ok(Ok(text)) => Generated {
                text,
                source: GenerationSource::Model,
            },
            Ok(Err(e)) => {
                tracing::warn!(model = client.model_name(), error = %e, "Generation failed, using fallback");
                Generated {
                    text: fallback(),
                    source: GenerationSource::Fallback,
                }
            }
            Err(_) => {
                tracing::warn!(
                    model = client.model_name(),
                    timeout_secs = timeout.as_secs(),
                    "Generation timed out, using fallback"
                );
                Generated {
                    text: fallback(),
                    source: GenerationSource::Fallback,
                }
            }
        }
    }
}
