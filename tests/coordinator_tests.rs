//! Coordinator behaviour with scripted and mocked stages.

mod common;

use common::mocks::{
    MockLLMClient, Script, fallback_stages, scripted_analysis, scripted_research,
    scripted_writing, stages_with,
};
use scribe::agents::{AnalysisStage, ResearchStage, TaskCoordinator, WritingStage};
use scribe::memory::{MemoryBank, SessionManager};
use scribe::tasks::TaskRegistry;
use scribe::types::{
    AgentMessage, AgentType, AnalysisInput, AppError, GenerationSource, MessagePayload,
    TaskOutcome, TaskRequest, TaskStatus,
};
use std::sync::Arc;
use std::sync::atomic::Ordering;

struct Harness {
    coordinator: TaskCoordinator,
    registry: Arc<TaskRegistry>,
    sessions: Arc<SessionManager>,
}

fn harness(research: ResearchStage, writing: WritingStage, analysis: AnalysisStage) -> Harness {
    let registry = Arc::new(TaskRegistry::default());
    let sessions = Arc::new(SessionManager::new());
    let coordinator = TaskCoordinator::new(
        research,
        writing,
        analysis,
        registry.clone(),
        sessions.clone(),
    );
    coordinator.start();
    Harness {
        coordinator,
        registry,
        sessions,
    }
}

async fn run(h: &Harness, task_id: &str, topic: &str) -> TaskOutcome {
    let request = TaskRequest::new(topic);
    h.registry.create(task_id, request.clone());
    h.coordinator.coordinate(task_id, &request).await
}

#[tokio::test]
async fn test_research_failure_stops_pipeline() {
    let (research, _) = scripted_research(Script::Fail("no sources".into()));
    let (writing, writing_calls) = scripted_writing(Script::Raise("must not run".into()));
    let (analysis, analysis_calls) = scripted_analysis(Script::Raise("must not run".into()));

    let h = harness(research, writing, analysis);
    let outcome = run(&h, "t1", "Rust").await;

    let TaskOutcome::Failed { error, .. } = outcome else {
        panic!("expected failure");
    };
    assert!(error.contains("Research phase failed"));
    assert!(error.ends_with("no sources"));
    assert_eq!(writing_calls.load(Ordering::SeqCst), 0);
    assert_eq!(analysis_calls.load(Ordering::SeqCst), 0);

    let task = h.registry.get("t1").unwrap();
    assert_eq!(task.status, TaskStatus::Failed);
    assert!(task.result.is_none());
    assert!(task.completed_at.is_some());
}

#[tokio::test]
async fn test_writing_failure_skips_analysis() {
    let (research, _, _) = fallback_stages(&MemoryBank::default());
    let (writing, _) = scripted_writing(Script::Fail("too short".into()));
    let (analysis, analysis_calls) = scripted_analysis(Script::Raise("must not run".into()));

    let h = harness(research, writing, analysis);
    let outcome = run(&h, "t1", "Rust").await;

    assert_eq!(outcome.status(), TaskStatus::Failed);
    let task = h.registry.get("t1").unwrap();
    assert_eq!(task.error.as_deref(), Some("Writing phase failed: too short"));
    assert_eq!(analysis_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_stage_exception_records_its_message() {
    let (research, writing, _) = fallback_stages(&MemoryBank::default());
    let (analysis, _) = scripted_analysis(Script::Raise("scoring crashed".into()));

    let h = harness(research, writing, analysis);
    run(&h, "t1", "Rust").await;

    let task = h.registry.get("t1").unwrap();
    assert_eq!(task.status, TaskStatus::Failed);
    assert_eq!(task.error.as_deref(), Some("scoring crashed"));
}

#[tokio::test]
async fn test_live_generation_is_used_when_available() {
    let client = MockLLMClient::new("Key point one.\nKey point two.\nRust is fast and safe.");
    let (research, writing, analysis) = stages_with(client.generation(), &MemoryBank::default());

    let h = harness(research, writing, analysis);
    let TaskOutcome::Completed(result) = run(&h, "t1", "Rust").await else {
        panic!("expected completion");
    };

    assert_eq!(client.calls(), 3);
    assert_eq!(result.research.generated_by, GenerationSource::Model);
    assert!((result.research.confidence_score - 0.85).abs() < f32::EPSILON);
    assert_eq!(result.analysis.generated_by, GenerationSource::Model);
}

#[tokio::test]
async fn test_provider_failure_falls_back_and_completes() {
    let client = MockLLMClient::failing();
    let (research, writing, analysis) = stages_with(client.generation(), &MemoryBank::default());

    let h = harness(research, writing, analysis);
    let TaskOutcome::Completed(result) = run(&h, "t1", "Quantum Computing").await else {
        panic!("provider failure must not fail the task");
    };

    assert_eq!(client.calls(), 3);
    assert_eq!(result.research.generated_by, GenerationSource::Fallback);
    assert!((result.research.confidence_score - 0.70).abs() < f32::EPSILON);
    assert!(result.content.contains("Quantum Computing"));
    assert!(result.timeline.analysis_completed);
}

#[tokio::test]
async fn test_session_mirrors_handoffs_and_status() {
    let (research, writing, analysis) = fallback_stages(&MemoryBank::default());
    let h = harness(research, writing, analysis);
    run(&h, "t1", "Rust").await;

    let session = h.sessions.get_session("t1").unwrap();
    let handoffs: Vec<_> = session
        .history
        .iter()
        .filter(|event| event.event == "handoff")
        .collect();
    assert_eq!(handoffs.len(), 3);
    assert_eq!(handoffs[0].data["message_type"], "research_request");
    assert_eq!(handoffs[2].data["message_type"], "analysis_request");

    assert_eq!(session.get_state("status").unwrap(), "completed");
    assert_eq!(session.get_state("current_step").unwrap(), "analysis");
    assert_eq!(session.get_context("topic").unwrap(), "Rust");
}

#[tokio::test]
async fn test_metrics_count_outcomes() {
    let (research, writing, _) = fallback_stages(&MemoryBank::default());
    let (analysis, _) = scripted_analysis(Script::Fail("flaky".into()));
    let h = harness(research, writing, analysis);
    run(&h, "a", "Rust").await;

    let (research, writing, analysis) = fallback_stages(&MemoryBank::default());
    let ok = harness(research, writing, analysis);
    run(&ok, "b", "Rust").await;
    run(&ok, "c", "Go").await;

    let failing = h.coordinator.metrics();
    assert_eq!(failing.total_tasks, 1);
    assert_eq!(failing.failed_tasks, 1);
    assert_eq!(failing.success_rate, 0.0);

    let metrics = ok.coordinator.metrics();
    assert_eq!(metrics.total_tasks, 2);
    assert_eq!(metrics.completed_tasks, 2);
    assert_eq!(metrics.success_rate, 1.0);
    assert_eq!(metrics.active_sessions, 2);
}

#[tokio::test]
async fn test_new_task_message_runs_pipeline() {
    let (research, writing, analysis) = fallback_stages(&MemoryBank::default());
    let h = harness(research, writing, analysis);
    h.registry.create("t1", TaskRequest::new("Rust"));

    let message = AgentMessage::new(
        AgentType::Coordinator,
        AgentType::Coordinator,
        MessagePayload::NewTask {
            task_id: "t1".to_string(),
            request: TaskRequest::new("Rust"),
        },
    );
    let outcome = h.coordinator.process_message(message).await.unwrap();
    assert!(outcome.is_completed());
    assert_eq!(h.registry.get("t1").unwrap().status, TaskStatus::Completed);
}

#[tokio::test]
async fn test_stage_messages_are_not_for_the_coordinator() {
    let (research, writing, analysis) = fallback_stages(&MemoryBank::default());
    let h = harness(research, writing, analysis);

    let message = AgentMessage::new(
        AgentType::Coordinator,
        AgentType::Coordinator,
        MessagePayload::AnalysisRequest(AnalysisInput {
            content: "text".to_string(),
            analysis_type: "quality".to_string(),
        }),
    );
    let err = h.coordinator.process_message(message).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));
}

#[tokio::test]
async fn test_failed_session_status_lands_with_its_payload() {
    let (research, _, analysis) = fallback_stages(&MemoryBank::default());
    let (writing, _) = scripted_writing(Script::Fail("too short".into()));
    let h = harness(research, writing, analysis);
    run(&h, "t1", "Rust").await;

    let session = h.sessions.get_session("t1").unwrap();
    let updates: Vec<&str> = session
        .history
        .iter()
        .filter(|event| event.event == "state_update")
        .filter_map(|event| event.data["key"].as_str())
        .collect();

    let failed_at = updates.iter().position(|key| *key == "failed").unwrap();
    assert_eq!(updates[failed_at - 1], "status");
    assert_eq!(session.get_state("status").unwrap(), "failed");
    assert_eq!(
        session.get_state("failed").unwrap()["error"],
        "Writing phase failed: too short"
    );
}
