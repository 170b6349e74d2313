//! Mock implementations for testing.
//!
//! Shared across the integration test files: a configurable LLM client and
//! scripted stage workers that fail, raise or panic on demand.

use async_trait::async_trait;
use scribe::agents::{
    AnalysisStage, AnalysisWorker, ResearchStage, ResearchWorker, StageInput, StageOutcome,
    StageWorker, WorkerState, WritingStage, WritingWorker,
};
use scribe::llm::{Generation, LLMClient};
use scribe::memory::MemoryBank;
use scribe::tools::search::WebSearchTool;
use scribe::types::{
    AnalysisInput, AnalysisReport, AppError, ResearchInput, ResearchResult, Result, StageKind,
    WritingInput, WritingResult,
};
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Mock LLM client with a fixed response.
///
/// ```ignore
/// let client = MockLLMClient::new("Hello, world!");
/// let client = MockLLMClient::failing();
/// ```
#[derive(Clone)]
pub struct MockLLMClient {
    response: String,
    should_fail: bool,
    calls: Arc<AtomicUsize>,
}

impl MockLLMClient {
    /// Create a new mock client that returns the given response.
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            should_fail: false,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a mock client that always returns an error.
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::new("")
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn generation(&self) -> Generation {
        Generation::live(Arc::new(self.clone()))
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.should_fail {
            return Err(AppError::LLM("Mock LLM failure".to_string()));
        }
        Ok(self.response.clone())
    }

    async fn generate_with_system(&self, _system: &str, prompt: &str) -> Result<String> {
        self.generate(prompt).await
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

/// What a [`ScriptedStage`] does when run.
#[derive(Debug, Clone)]
pub enum Script {
    /// Report a stage failure with this reason
    Fail(String),
    /// Return `Err(AppError::Stage(..))`
    Raise(String),
    Panic,
    /// Sleep, then report failure
    Hang(Duration),
}

/// Stage worker whose behaviour is fixed up front. Counts its calls.
pub struct ScriptedStage<I, O> {
    kind: StageKind,
    script: Script,
    state: WorkerState,
    calls: Arc<AtomicUsize>,
    _io: PhantomData<fn(I) -> O>,
}

impl<I, O> ScriptedStage<I, O> {
    pub fn new(kind: StageKind, script: Script) -> Self {
        Self {
            kind,
            script,
            state: WorkerState::new(),
            calls: Arc::new(AtomicUsize::new(0)),
            _io: PhantomData,
        }
    }

    /// Shared call counter, readable after the stage is moved into an `Arc`.
    pub fn counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait]
impl<I, O> StageWorker for ScriptedStage<I, O>
where
    I: StageInput,
    O: Send + 'static,
{
    type Input = I;
    type Output = O;

    fn kind(&self) -> StageKind {
        self.kind
    }

    fn name(&self) -> &str {
        "Scripted Stage"
    }

    fn state(&self) -> &WorkerState {
        &self.state
    }

    async fn run(&self, _input: I) -> Result<StageOutcome<O>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Fail(reason) => Ok(StageOutcome::failed(reason.clone())),
            Script::Raise(message) => Err(AppError::Stage(message.clone())),
            Script::Panic => panic!("scripted stage panicked"),
            Script::Hang(duration) => {
                tokio::time::sleep(*duration).await;
                Ok(StageOutcome::failed("hung stage woke up"))
            }
        }
    }
}

/// The three real workers on fallback generation, sharing one memory bank.
pub fn fallback_stages(memory: &MemoryBank) -> (ResearchStage, WritingStage, AnalysisStage) {
    stages_with(Generation::Fallback, memory)
}

pub fn stages_with(
    generation: Generation,
    memory: &MemoryBank,
) -> (ResearchStage, WritingStage, AnalysisStage) {
    (
        Arc::new(ResearchWorker::new(
            generation.clone(),
            WebSearchTool::new(5),
            memory.clone(),
        )),
        Arc::new(WritingWorker::new(generation.clone(), memory.clone())),
        Arc::new(AnalysisWorker::new(generation, memory.clone())),
    )
}

/// Scripted research stage and its call counter.
pub fn scripted_research(script: Script) -> (ResearchStage, Arc<AtomicUsize>) {
    let stage = ScriptedStage::<ResearchInput, ResearchResult>::new(StageKind::Research, script);
    let calls = stage.counter();
    (Arc::new(stage), calls)
}

pub fn scripted_writing(script: Script) -> (WritingStage, Arc<AtomicUsize>) {
    let stage = ScriptedStage::<WritingInput, WritingResult>::new(StageKind::Writing, script);
    let calls = stage.counter();
    (Arc::new(stage), calls)
}

pub fn scripted_analysis(script: Script) -> (AnalysisStage, Arc<AtomicUsize>) {
    let stage = ScriptedStage::<AnalysisInput, AnalysisReport>::new(StageKind::Analysis, script);
    let calls = stage.counter();
    (Arc::new(stage), calls)
}
