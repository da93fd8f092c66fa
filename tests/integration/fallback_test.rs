//! Decision-Engine Fallback Tests
//!
//! Requests the keyword classifier cannot place go to the model-assisted
//! strategy (backed here by a scripted provider). A confident answer runs the
//! tool; anything else ends in a clarification with no tool call.

use std::sync::Arc;
use std::time::Duration;

use windsite_core::{ThoughtStatus, WorkflowIntent};

use windsite_orchestrator::services::intent::{IntentStrategy, ModelAssistedStrategy};
use windsite_orchestrator::storage::MemoryProjectStore;
use windsite_orchestrator::OrchestratorRequest;

use super::support::{assert_gap_free, orchestrator, step_ids, CountingInvoker, ScriptedProvider};

fn decision_engine(provider: &Arc<ScriptedProvider>) -> Option<Arc<dyn IntentStrategy>> {
    let strategy: Arc<dyn IntentStrategy> =
        Arc::new(ModelAssistedStrategy::new(provider.clone(), Duration::from_secs(5)));
    Some(strategy)
}

// ============================================================================
// Clarification
// ============================================================================

#[tokio::test]
async fn test_unclassifiable_without_engine_asks_for_clarification() {
    let invoker = CountingInvoker::new();
    let orchestrator = orchestrator(Arc::new(MemoryProjectStore::new()), invoker.clone(), None);

    let response = orchestrator
        .handle(OrchestratorRequest::new("tell me about this place", "s3"))
        .await;

    assert!(!response.success);
    assert_eq!(invoker.calls(), 0);
    assert_eq!(response.artifacts.len(), 1);
    let artifact = &response.artifacts[0];
    assert_eq!(artifact.artifact_type, "clarification");
    assert_eq!(artifact.actions.len(), 5);

    let ids = step_ids(&response.thought_steps);
    assert_eq!(ids, vec!["classify_intent", "resolve_project", "validate_parameters", "reconsider_intent"]);
    assert_eq!(response.thought_steps[3].status, ThoughtStatus::Error);
    assert_gap_free(&response.thought_steps);
}

#[tokio::test]
async fn test_unsure_engine_asks_for_clarification() {
    let provider = ScriptedProvider::new(&[r#"{"intent": "terrain_analysis", "confidence": 0.3, "reasoning": "vague"}"#]);
    let invoker = CountingInvoker::new();
    let orchestrator = orchestrator(
        Arc::new(MemoryProjectStore::new()),
        invoker.clone(),
        decision_engine(&provider),
    );

    let response = orchestrator
        .handle(OrchestratorRequest::new("tell me about this place", "s3"))
        .await;

    assert!(!response.success);
    assert_eq!(provider.calls(), 1);
    assert_eq!(invoker.calls(), 0);
    assert_eq!(response.artifacts[0].artifact_type, "clarification");
}

#[tokio::test]
async fn test_clarification_highlights_next_step() {
    let provider = ScriptedProvider::new(&[r#"{"intent": "unknown", "confidence": 0.9}"#]);
    let orchestrator = orchestrator(
        Arc::new(MemoryProjectStore::new()),
        CountingInvoker::new(),
        decision_engine(&provider),
    );

    orchestrator
        .handle(OrchestratorRequest::new(
            "Analyze terrain for wind farm at 35.067482, -101.395466",
            "s3",
        ))
        .await;
    let response = orchestrator
        .handle(OrchestratorRequest::new("tell me about this place", "s3"))
        .await;

    assert!(!response.success);
    let primary: Vec<_> = response.artifacts[0]
        .actions
        .iter()
        .filter(|a| a.is_primary)
        .collect();
    assert_eq!(primary.len(), 1);
    assert_eq!(primary[0].suggested_next_intent, WorkflowIntent::LayoutOptimization);
}

// ============================================================================
// Resolution
// ============================================================================

#[tokio::test]
async fn test_confident_engine_runs_tool() {
    let provider = ScriptedProvider::new(&[r#"{"intent": "terrain_analysis", "confidence": 0.9, "reasoning": "site question"}"#]);
    let invoker = CountingInvoker::new();
    let orchestrator = orchestrator(
        Arc::new(MemoryProjectStore::new()),
        invoker.clone(),
        decision_engine(&provider),
    );

    let response = orchestrator
        .handle(OrchestratorRequest::new("tell me about this place at 35.07, -101.40", "s4"))
        .await;

    assert!(response.success, "unexpected failure: {}", response.message);
    assert_eq!(invoker.tool_names(), vec!["terrain_analysis"]);
    assert_eq!(
        step_ids(&response.thought_steps),
        vec![
            "classify_intent",
            "resolve_project",
            "validate_parameters",
            "reconsider_intent",
            "revalidate_parameters",
            "dispatch_tool",
            "update_project",
            "compose_response",
        ]
    );
    assert_gap_free(&response.thought_steps);
}

#[tokio::test]
async fn test_engine_reply_repaired_once() {
    let provider = ScriptedProvider::new(&[
        "I think this is about terrain.",
        r#"{"intent": "terrain_analysis", "confidence": 0.8}"#,
    ]);
    let invoker = CountingInvoker::new();
    let orchestrator = orchestrator(
        Arc::new(MemoryProjectStore::new()),
        invoker.clone(),
        decision_engine(&provider),
    );

    let response = orchestrator
        .handle(OrchestratorRequest::new("tell me about this place at 35.07, -101.40", "s4"))
        .await;

    assert!(response.success, "unexpected failure: {}", response.message);
    assert_eq!(provider.calls(), 2);
    assert_eq!(invoker.calls(), 1);
}

#[tokio::test]
async fn test_unparseable_engine_reply_asks_for_clarification() {
    let provider = ScriptedProvider::new(&["no idea", "still no idea"]);
    let invoker = CountingInvoker::new();
    let orchestrator = orchestrator(
        Arc::new(MemoryProjectStore::new()),
        invoker.clone(),
        decision_engine(&provider),
    );

    let response = orchestrator
        .handle(OrchestratorRequest::new("tell me about this place", "s4"))
        .await;

    assert!(!response.success);
    assert_eq!(provider.calls(), 2);
    assert_eq!(invoker.calls(), 0);
    assert_eq!(response.artifacts[0].artifact_type, "clarification");
}

#[tokio::test]
async fn test_confident_keyword_match_skips_engine() {
    let provider = ScriptedProvider::new(&[]);
    let orchestrator = orchestrator(
        Arc::new(MemoryProjectStore::new()),
        CountingInvoker::new(),
        decision_engine(&provider),
    );

    let response = orchestrator
        .handle(OrchestratorRequest::new(
            "Analyze terrain for wind farm at 35.067482, -101.395466",
            "s5",
        ))
        .await;

    assert!(response.success);
    assert_eq!(provider.calls(), 0);
    assert!(!step_ids(&response.thought_steps).contains(&"reconsider_intent"));
}

#[tokio::test]
async fn test_engine_choice_still_checks_prerequisites() {
    let provider = ScriptedProvider::new(&[r#"{"intent": "wake_simulation", "confidence": 0.95}"#]);
    let invoker = CountingInvoker::new();
    let orchestrator = orchestrator(
        Arc::new(MemoryProjectStore::new()),
        invoker.clone(),
        decision_engine(&provider),
    );

    let response = orchestrator
        .handle(OrchestratorRequest::new("how much energy would we lose downstream", "s6"))
        .await;

    assert!(!response.success);
    assert_eq!(invoker.calls(), 0);
    assert_eq!(response.artifacts[0].artifact_type, "prerequisite_required");
    let revalidate = response
        .thought_steps
        .iter()
        .find(|s| s.id == "revalidate_parameters")
        .unwrap();
    assert_eq!(revalidate.status, ThoughtStatus::Error);
}
