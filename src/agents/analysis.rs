use crate::agents::{StageOutcome, StageWorker, WorkerState};
use crate::llm::Generation;
use crate::memory::MemoryBank;
use crate::tools::analysis::{calculate_readability, extract_topics};
use crate::tools::sentiment::analyze_sentiment;
use crate::types::{AnalysisInput, AnalysisReport, Result, StageKind};
use async_trait::async_trait;
use serde_json::json;

const FALLBACK_ANALYSIS: &str = "Quality Assessment: Content appears well-structured and informative\n\
Key Insights: Comprehensive coverage of relevant topics\n\
Recommendations: Consider adding more specific examples and data points\n\
Confidence Score: 0.75";

/// Scores finished content. The scores are computed locally, so this stage
/// completes even when generation falls back.
pub struct AnalysisWorker {
    generation: Generation,
    memory: MemoryBank,
    state: WorkerState,
}

impl AnalysisWorker {
    pub fn new(generation: Generation, memory: MemoryBank) -> Self {
        Self {
            generation,
            memory,
            state: WorkerState::new(),
        }
    }
}

fn build_prompt(input: &AnalysisInput) -> String {
    format!(
        "Perform {analysis_type} analysis on the following content:\n\n\
         CONTENT:\n{content}\n\n\
         Provide:\n\
         1. Quality assessment\n\
         2. Key insights summary\n\
         3. Recommendations for improvement\n\
         4. Confidence score",
        analysis_type = input.analysis_type,
        content = input.content,
    )
}

#[async_trait]
impl StageWorker for AnalysisWorker {
    type Input = AnalysisInput;
    type Output = AnalysisReport;

    fn kind(&self) -> StageKind {
        StageKind::Analysis
    }

    fn name(&self) -> &str {
        "Data Analyst"
    }

    fn state(&self) -> &WorkerState {
        &self.state
    }

    #[tracing::instrument(skip(self, input), fields(analysis_type = %input.analysis_type))]
    async fn run(&self, input: AnalysisInput) -> Result<StageOutcome<AnalysisReport>> {
        tracing::info!(content_chars = input.content.chars().count(), "Starting analysis");

        let generated = self
            .generation
            .generate_or(&build_prompt(&input), || FALLBACK_ANALYSIS.to_string())
            .await;

        let report = AnalysisReport {
            analysis: generated.text,
            analysis_type: input.analysis_type.clone(),
            sentiment: analyze_sentiment(&input.content),
            readability_score: calculate_readability(&input.content),
            content_length: input.content.chars().count(),
            key_topics: extract_topics(&input.content),
            generated_by: generated.source,
        };

        if let Err(e) = self
            .memory
            .store_memory(
                &format!("analysis_{}", input.analysis_type),
                &report,
                json!({"analysis_type": input.analysis_type}),
            )
            .await
        {
            tracing::warn!(error = %e, "Failed to store analysis in memory");
        }

        Ok(StageOutcome::Completed(report))
    }
}
