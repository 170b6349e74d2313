use crate::tools::code_executor::CodeExecutorTool;
use crate::tools::search::WebSearchTool;
use crate::types::{AppError, Result};
use crate::utils::toml_config::ScribeConfig;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use utoipa::ToSchema;

/// A callable capability exposed to stage workers and listed on `GET /`.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique registry key.
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    /// JSON schema of the arguments accepted by [`Tool::execute`].
    fn parameters_schema(&self) -> Value;
    async fn execute(&self, args: Value) -> Result<Value>;
}

/// Name, description and JSON schema of a registered tool.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    #[schema(value_type = Object)]
    pub parameters: Value,
}

/// Tools keyed by name; iteration order is alphabetical.
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// `web_search` and `code_executor`, sized from the configuration.
    pub fn with_default_tools(config: &ScribeConfig) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(WebSearchTool::new(config.search.max_results)));
        registry.register(Arc::new(CodeExecutorTool::from_config(&config.executor)));
        registry
    }

    /// Adds a tool, replacing any earlier one with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_some() {
            tracing::debug!(tool = %name, "Replaced registered tool");
        }
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools
            .values()
            .map(|tool| ToolSpec {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.parameters_schema(),
            })
            .collect()
    }

    #[tracing::instrument(skip(self, args))]
    pub async fn execute(&self, name: &str, args: Value) -> Result<Value> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| AppError::NotFound(format!("Tool not found: {}", name)))?;
        tool.execute(args).await
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn defaults() -> ToolRegistry {
        ToolRegistry::with_default_tools(&ScribeConfig::default())
    }

    #[test]
    fn test_empty_registry() {
        assert!(ToolRegistry::new().tool_names().is_empty());
    }

    #[test]
    fn test_default_tools_are_sorted() {
        let registry = defaults();
        assert_eq!(registry.tool_names(), vec!["code_executor", "web_search"]);
        assert!(!registry.has_tool("file_operations"));
    }

    #[test]
    fn test_specs_carry_object_schemas() {
        let specs = defaults().specs();
        assert_eq!(specs.len(), 2);
        assert!(specs
            .iter()
            .all(|tool| !tool.description.is_empty() && tool.parameters.is_object()));
    }

    #[tokio::test]
    async fn test_execute_dispatches_by_name() {
        let value = defaults()
            .execute("web_search", json!({"query": "rust", "max_results": 2}))
            .await
            .unwrap();
        assert_eq!(value["count"], 2);
        assert_eq!(value["results"][0]["title"], "Research Result 1 for: rust");
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let err = defaults().execute("nonexistent_tool", json!({})).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
