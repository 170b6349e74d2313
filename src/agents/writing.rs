use crate::agents::{StageOutcome, StageWorker, WorkerState};
use crate::llm::Generation;
use crate::memory::MemoryBank;
use crate::tools::optimizer::ContentOptimizer;
use crate::types::{Result, StageKind, WritingInput, WritingResult};
use async_trait::async_trait;
use serde_json::json;

/// Research excerpt length embedded in fallback content, in characters.
const FALLBACK_EXCERPT_CHARS: usize = 500;

/// Turns research notes into a finished piece of content.
pub struct WritingWorker {
    generation: Generation,
    optimizer: ContentOptimizer,
    memory: MemoryBank,
    state: WorkerState,
}

impl WritingWorker {
    pub fn new(generation: Generation, memory: MemoryBank) -> Self {
        Self {
            generation,
            optimizer: ContentOptimizer::new(),
            memory,
            state: WorkerState::new(),
        }
    }
}

fn build_prompt(input: &WritingInput) -> String {
    format!(
        "Based on the following research, create a {content_type} with {tone} tone and {length} length:\n\n\
         RESEARCH:\n{research}\n\n\
         Requirements:\n\
         - Well-structured and engaging\n\
         - Appropriate for {tone} tone\n\
         - {length} length\n\
         - Include key insights from research",
        content_type = input.content_type,
        tone = input.tone,
        length = input.length,
        research = input.research_content,
    )
}

fn fallback_content(input: &WritingInput) -> String {
    let excerpt: String = input
        .research_content
        .chars()
        .take(FALLBACK_EXCERPT_CHARS)
        .collect();

    format!(
        "# {title} on Research Topic\n\n\
         ## Executive Summary\n\
         This {content_type} synthesizes key research findings in a {tone} tone.\n\n\
         ## Main Content\n\
         Based on comprehensive research analysis, this content presents the most significant \
         insights and recommendations for stakeholders.\n\n\
         ## Key Insights from Research\n\
         {excerpt}...\n\n\
         ## Conclusion\n\
         The research demonstrates important implications that warrant further consideration \
         and strategic planning.",
        title = title_case(&input.content_type),
        content_type = input.content_type,
        tone = input.tone,
    )
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[async_trait]
impl StageWorker for WritingWorker {
    type Input = WritingInput;
    type Output = WritingResult;

    fn kind(&self) -> StageKind {
        StageKind::Writing
    }

    fn name(&self) -> &str {
        "Content Writer"
    }

    fn state(&self) -> &WorkerState {
        &self.state
    }

    #[tracing::instrument(skip(self, input), fields(content_type = %input.content_type, tone = %input.tone))]
    async fn run(&self, input: WritingInput) -> Result<StageOutcome<WritingResult>> {
        tracing::info!(length = %input.length, "Generating content");

        let generated = self
            .generation
            .generate_or(&build_prompt(&input), || fallback_content(&input))
            .await;

        let (content, rules) = self
            .optimizer
            .optimize(&generated.text, &input.content_type, &input.tone);

        if let Err(e) = self
            .memory
            .store_memory(
                &format!("content_{}", input.content_type),
                &content,
                json!({
                    "content_type": input.content_type,
                    "tone": input.tone,
                    "length": input.length,
                }),
            )
            .await
        {
            tracing::warn!(error = %e, "Failed to store content in memory");
        }

        Ok(StageOutcome::Completed(WritingResult {
            content,
            content_type: input.content_type,
            tone: input.tone,
            length: input.length,
            applied_rules: rules.iter().map(|r| r.as_str().to_string()).collect(),
            generated_by: generated.source,
        }))
    }
}
