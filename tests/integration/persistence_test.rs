//! Persistence and Cancellation Tests
//!
//! Version conflicts during write-back, an unreachable store, and requests
//! abandoned mid-flight.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use windsite_core::{ProjectStore, ThoughtStatus, WorkflowIntent};

use windsite_orchestrator::storage::MemoryProjectStore;
use windsite_orchestrator::OrchestratorRequest;

use super::support::{
    assert_gap_free, orchestrator, ContendedStore, CountingInvoker, SessionOutageStore, UnreachableStore,
};

const SITE: &str = "Analyze terrain for wind farm at 35.067482, -101.395466";

// ============================================================================
// Write-Back Conflicts
// ============================================================================

#[tokio::test]
async fn test_write_back_conflict_is_retried() {
    let store = ContendedStore::conflict_once();
    let orchestrator = orchestrator(store.clone(), CountingInvoker::new(), None);

    let response = orchestrator.handle(OrchestratorRequest::new(SITE, "s1")).await;

    assert!(response.success, "unexpected failure: {}", response.message);
    assert!(response.warning.is_none());

    // Both the concurrent writer's step and ours survive.
    let project = store
        .get_project(&response.project_id.unwrap())
        .await
        .unwrap()
        .unwrap();
    assert!(project.step_status.terrain);
    assert!(project.step_status.simulation);
    assert_eq!(project.version, 3);
}

#[tokio::test]
async fn test_persistent_conflict_returns_warning() {
    let store = ContendedStore::always_conflict();
    let invoker = CountingInvoker::new();
    let orchestrator = orchestrator(store.clone(), invoker.clone(), None);

    let response = orchestrator.handle(OrchestratorRequest::new(SITE, "s1")).await;

    // The tool ran, so its artifacts are still returned.
    assert!(response.success);
    assert_eq!(invoker.calls(), 1);
    assert_eq!(response.artifacts[0].artifact_type, "terrain_analysis");
    let warning = response.warning.as_deref().unwrap();
    assert!(warning.contains("could not be updated"), "got {}", warning);

    let update = response
        .thought_steps
        .iter()
        .find(|s| s.id == "update_project")
        .unwrap();
    assert_eq!(update.status, ThoughtStatus::Error);
    assert_gap_free(&response.thought_steps);

    // Buttons reflect the step as done even though the record is stale.
    let actions = &response.artifacts[0].actions;
    assert_eq!(actions[0].suggested_next_intent, WorkflowIntent::LayoutOptimization);

    let project = store
        .get_project(&response.project_id.unwrap())
        .await
        .unwrap()
        .unwrap();
    assert!(!project.step_status.terrain);
}

#[tokio::test]
async fn test_unreachable_store_fails_before_dispatch() {
    let invoker = CountingInvoker::new();
    let orchestrator = orchestrator(Arc::new(UnreachableStore), invoker.clone(), None);

    let response = orchestrator.handle(OrchestratorRequest::new(SITE, "s1")).await;

    assert!(!response.success);
    assert!(response.message.starts_with("Project storage failed"), "got {}", response.message);
    assert_eq!(invoker.calls(), 0);
    assert!(response.project_id.is_none());

    let resolve = response.thought_steps.last().unwrap();
    assert_eq!(resolve.id, "resolve_project");
    assert_eq!(resolve.status, ThoughtStatus::Error);
}

#[tokio::test]
async fn test_failed_session_bind_keeps_created_project() {
    let store = SessionOutageStore::new();
    let invoker = CountingInvoker::new();
    let orchestrator = orchestrator(store.clone(), invoker.clone(), None);

    let response = orchestrator.handle(OrchestratorRequest::new(SITE, "s1")).await;

    assert!(!response.success);
    assert!(response.message.starts_with("Project storage failed"), "got {}", response.message);
    assert_eq!(invoker.calls(), 0);
    assert!(store.get_session("s1").await.unwrap().is_none());

    // The project was written whole before the bind failed.
    assert_eq!(store.project_count(), 1);

    // Once sessions are writable again the same project is picked up.
    store.restore();
    let response = orchestrator.handle(OrchestratorRequest::new(SITE, "s1")).await;

    assert!(response.success, "unexpected failure: {}", response.message);
    assert_eq!(store.project_count(), 1);
    let project_id = response.project_id.unwrap();
    let project = store.get_project(&project_id).await.unwrap().unwrap();
    assert!(project.location.is_some());
    assert!(project.step_status.terrain);
    let session = store.get_session("s1").await.unwrap().unwrap();
    assert_eq!(session.active_project_id.as_deref(), Some(project_id.as_str()));
}

// ============================================================================
// Cancellation
// ============================================================================

#[tokio::test]
async fn test_cancelled_request_returns_nothing() {
    let store = Arc::new(MemoryProjectStore::new());
    let invoker = CountingInvoker::slow(Duration::from_millis(300));
    let orchestrator = orchestrator(store.clone(), invoker.clone(), None);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let response = orchestrator
        .handle_cancellable(OrchestratorRequest::new(SITE, "s-cancel"), cancel)
        .await;
    assert!(response.is_none());

    // The spawned tool call finishes on its own, but nothing is recorded.
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(invoker.calls(), 1);

    let session = store.get_session("s-cancel").await.unwrap().unwrap();
    let project_id = session.active_project_id.unwrap();
    let project = store.get_project(&project_id).await.unwrap().unwrap();
    assert!(!project.step_status.terrain);
}

#[tokio::test]
async fn test_uncancelled_request_completes() {
    let invoker = CountingInvoker::new();
    let orchestrator = orchestrator(Arc::new(MemoryProjectStore::new()), invoker.clone(), None);

    let response = orchestrator
        .handle_cancellable(OrchestratorRequest::new(SITE, "s1"), CancellationToken::new())
        .await
        .unwrap();

    assert!(response.success);
    assert_eq!(invoker.calls(), 1);
}

#[tokio::test]
async fn test_already_cancelled_request_is_not_started() {
    let invoker = CountingInvoker::new();
    let orchestrator = orchestrator(Arc::new(MemoryProjectStore::new()), invoker.clone(), None);

    let cancel = CancellationToken::new();
    cancel.cancel();
    let response = orchestrator
        .handle_cancellable(OrchestratorRequest::new(SITE, "s1"), cancel)
        .await;

    assert!(response.is_none());
    assert_eq!(invoker.calls(), 0);
}
