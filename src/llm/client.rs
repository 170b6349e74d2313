use crate::types::Result;
use async_trait::async_trait;

/// A text-generation backend.
///
/// Errors returned here are provider failures; stage workers never see them
/// directly because [`super::Generation`] substitutes the fallback text.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LLMClient: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Like [`LLMClient::generate`], with a system instruction sent first.
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String>;

    fn model_name(&self) -> &str;
}

/// Backend selected by `[llm]` in `scribe.toml`.
///
/// `provider = "none"` has no variant: it maps to `Option::None` and the
/// stages run on fallback generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provider {
    /// An Ollama server, e.g. `http://localhost:11434` serving `llama3.2`.
    Ollama { base_url: String, model: String },
}

impl Provider {
    /// Builds a client without contacting the backend.
    ///
    /// # Errors
    ///
    /// [`AppError::Configuration`](crate::types::AppError::Configuration) when
    /// the backend's cargo feature is not part of this build.
    pub async fn create_client(&self) -> Result<Box<dyn LLMClient>> {
        match self {
            #[cfg(feature = "ollama")]
            Provider::Ollama { base_url, model } => {
                let client = super::ollama::OllamaClient::new(base_url.clone(), model.clone())?;
                Ok(Box::new(client))
            }

            #[cfg(not(feature = "ollama"))]
            Provider::Ollama { model, .. } => Err(crate::types::AppError::Configuration(format!(
                "model '{}' needs the `ollama` feature; rebuild with `--features ollama` \
                 or set llm.provider = \"none\"",
                model
            ))),
        }
    }

    /// Whether the backend's cargo feature was compiled in.
    pub fn is_implemented(&self) -> bool {
        match self {
            Provider::Ollama { .. } => cfg!(feature = "ollama"),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::Ollama { .. } => "Ollama",
        }
    }

    pub fn model(&self) -> &str {
        match self {
            Provider::Ollama { model, .. } => model,
        }
    }
}
