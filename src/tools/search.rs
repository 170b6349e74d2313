//! Simulated web search.
//!
//! Produces deterministic synthetic results so the pipeline can run without
//! network access. Ranking is not modelled.

use crate::tools::registry::Tool;
use crate::types::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub const DEFAULT_MAX_RESULTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub snippet: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub display_url: String,
}

/// Web search tool returning synthetic results
pub struct WebSearchTool {
    max_results: usize,
}

impl Default for WebSearchTool {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RESULTS)
    }
}

impl WebSearchTool {
    pub fn new(max_results: usize) -> Self {
        Self { max_results }
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    pub async fn search(&self, query: &str, max_results: usize) -> Vec<SearchResult> {
        tracing::debug!(query, max_results, "Running simulated search");

        (1..=max_results)
            .map(|i| SearchResult {
                title: format!("Research Result {} for: {}", i, query),
                snippet: format!(
                    "This is a simulated search result for \"{}\". In a production \
                     environment, this would be real data from search APIs.",
                    query
                ),
                url: Some(format!("https://example.com/research-{}", i)),
                display_url: "research.example.com".to_string(),
            })
            .collect()
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web for information (simulated results)"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                },
                "max_results": {
                    "type": "integer",
                    "description": "Maximum number of results to return",
                    "default": self.max_results
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let query = args
            .get("query")
            .and_then(|v| v.as_str())
            .ok_or_else(|| AppError::InvalidInput("Missing 'query' parameter".to_string()))?;

        let max_results = args
            .get("max_results")
            .and_then(|v| v.as_u64())
            .map(|n| n as usize)
            .unwrap_or(self.max_results);

        let results = self.search(query, max_results).await;
        let results = serde_json::to_value(&results)
            .map_err(|e| AppError::Internal(format!("Failed to encode results: {}", e)))?;
        let count = results.as_array().map(Vec::len).unwrap_or(0);

        Ok(json!({
            "query": query,
            "results": results,
            "count": count
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_search_is_deterministic() {
        let tool = WebSearchTool::default();
        let results = tool.search("quantum computing", tool.max_results()).await;

        assert_eq!(results.len(), 5);
        assert_eq!(results[0].title, "Research Result 1 for: quantum computing");
        assert_eq!(results[4].url.as_deref(), Some("https://example.com/research-5"));
        assert!(results[2].snippet.contains("quantum computing"));
    }

    #[tokio::test]
    async fn test_execute_requires_query() {
        let tool = WebSearchTool::default();
        let err = tool.execute(json!({})).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_result_without_url_deserializes() {
        let result: SearchResult = serde_json::from_value(json!({
            "title": "t",
            "snippet": "s",
            "display_url": "d"
        }))
        .unwrap();
        assert!(result.url.is_none());
    }
}
