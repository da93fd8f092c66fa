//! Pipeline Integration Tests
//!
//! Drives requests through the whole pipeline against an in-memory store and
//! a counting tool invoker: the four workflow steps in order, prerequisite
//! and parameter failures, project resolution across sessions, and local
//! status queries.

use std::sync::Arc;

use serde_json::json;
use windsite_core::{ProjectStore, ThoughtStatus, WorkflowIntent};

use windsite_orchestrator::storage::{Database, MemoryProjectStore, SqliteProjectStore};
use windsite_orchestrator::OrchestratorRequest;

use super::support::{assert_gap_free, context, orchestrator, step_ids, CountingInvoker};

const SITE: &str = "Analyze terrain for wind farm at 35.067482, -101.395466";

// ============================================================================
// Workflow Steps
// ============================================================================

#[tokio::test]
async fn test_terrain_request_creates_location_project() {
    let store = Arc::new(MemoryProjectStore::new());
    let invoker = CountingInvoker::new();
    let orchestrator = orchestrator(store.clone(), invoker.clone(), None);

    let response = orchestrator.handle(OrchestratorRequest::new(SITE, "s1")).await;

    assert!(response.success, "unexpected failure: {}", response.message);
    assert_eq!(response.artifacts.len(), 1);
    assert_eq!(response.artifacts[0].artifact_type, "terrain_analysis");
    assert!(response.thought_steps.len() >= 4);
    assert_gap_free(&response.thought_steps);
    assert!(response.warning.is_none());
    assert_eq!(invoker.tool_names(), vec!["terrain_analysis"]);

    let project_id = response.project_id.unwrap();
    assert!(project_id.starts_with("site-35.07n-101.40w-"), "got {}", project_id);

    let project = store.get_project(&project_id).await.unwrap().unwrap();
    assert!(project.step_status.terrain);
    assert!(!project.step_status.layout);

    let session = store.get_session("s1").await.unwrap().unwrap();
    assert_eq!(session.active_project_id.as_deref(), Some(project_id.as_str()));
}

#[tokio::test]
async fn test_thought_steps_follow_pipeline_order() {
    let orchestrator = orchestrator(Arc::new(MemoryProjectStore::new()), CountingInvoker::new(), None);
    let response = orchestrator.handle(OrchestratorRequest::new(SITE, "s1")).await;

    assert_eq!(
        step_ids(&response.thought_steps),
        vec![
            "classify_intent",
            "resolve_project",
            "validate_parameters",
            "dispatch_tool",
            "update_project",
            "compose_response",
        ]
    );
    assert!(response
        .thought_steps
        .iter()
        .all(|s| s.status == ThoughtStatus::Complete));
}

#[tokio::test]
async fn test_layout_with_explicit_project_id() {
    let store = Arc::new(MemoryProjectStore::new());
    let invoker = CountingInvoker::new();
    let orchestrator = orchestrator(store.clone(), invoker.clone(), None);

    let first = orchestrator.handle(OrchestratorRequest::new(SITE, "s1")).await;
    let project_id = first.project_id.unwrap();

    let request = OrchestratorRequest::new("Optimize layout with 10 turbines", "s1")
        .with_context(context(json!({ "projectId": project_id })));
    let response = orchestrator.handle(request).await;

    assert!(response.success, "unexpected failure: {}", response.message);
    assert_eq!(response.project_id.as_deref(), Some(project_id.as_str()));
    assert_eq!(response.artifacts[0].artifact_type, "layout_optimization");
    assert_eq!(invoker.calls(), 2);

    let params = invoker.last_params().unwrap();
    assert_eq!(params["turbineCount"], 10);
    assert_eq!(params["latitude"], 35.067482);
    assert_eq!(params["projectId"], project_id.as_str());

    let project = store.get_project(&project_id).await.unwrap().unwrap();
    assert!(project.step_status.terrain);
    assert!(project.step_status.layout);
    assert_eq!(project.snapshot_value("turbineCount"), Some(&json!(10)));
}

#[tokio::test]
async fn test_full_workflow_in_one_session() {
    let store = Arc::new(MemoryProjectStore::new());
    let invoker = CountingInvoker::new();
    let orchestrator = orchestrator(store.clone(), invoker.clone(), None);

    let texts = [
        SITE,
        "Optimize layout with 12 turbines",
        "Run wake simulation",
        "Generate the final report",
    ];
    let mut project_id = None;
    for text in texts {
        let response = orchestrator.handle(OrchestratorRequest::new(text, "walk")).await;
        assert!(response.success, "{} failed: {}", text, response.message);
        assert_gap_free(&response.thought_steps);
        project_id = response.project_id;
    }

    assert_eq!(
        invoker.tool_names(),
        vec!["terrain_analysis", "layout_optimization", "wake_simulation", "report_generation"]
    );

    // The wake run reused the layout's turbine count from the project.
    let project = store.get_project(&project_id.unwrap()).await.unwrap().unwrap();
    assert!(project.step_status.terrain);
    assert!(project.step_status.layout);
    assert!(project.step_status.simulation);
    assert!(project.step_status.report);
    assert_eq!(project.snapshot_value("turbineCount"), Some(&json!(12)));
    assert_eq!(project.snapshot_value("reportFormat"), Some(&json!("pdf")));
}

#[tokio::test]
async fn test_success_suggests_next_step() {
    let orchestrator = orchestrator(Arc::new(MemoryProjectStore::new()), CountingInvoker::new(), None);
    let response = orchestrator.handle(OrchestratorRequest::new(SITE, "s1")).await;

    let actions = &response.artifacts.last().unwrap().actions;
    assert_eq!(actions[0].suggested_next_intent, WorkflowIntent::LayoutOptimization);
    assert!(actions[0].is_primary);
    assert!(actions
        .iter()
        .any(|a| a.suggested_next_intent == WorkflowIntent::ProjectQuery));
}

// ============================================================================
// Rejected Requests
// ============================================================================

#[tokio::test]
async fn test_wake_before_layout_requires_prerequisite() {
    let store = Arc::new(MemoryProjectStore::new());
    let invoker = CountingInvoker::new();
    let orchestrator = orchestrator(store.clone(), invoker.clone(), None);

    let response = orchestrator.handle(OrchestratorRequest::new("Run wake simulation", "s2")).await;

    assert!(!response.success);
    assert_eq!(invoker.calls(), 0);
    assert_eq!(response.artifacts.len(), 1);
    let artifact = &response.artifacts[0];
    assert_eq!(artifact.artifact_type, "prerequisite_required");
    assert_eq!(artifact.actions[0].suggested_next_intent, WorkflowIntent::LayoutOptimization);

    let validate = response
        .thought_steps
        .iter()
        .find(|s| s.id == "validate_parameters")
        .unwrap();
    assert_eq!(validate.status, ThoughtStatus::Error);
    assert_gap_free(&response.thought_steps);

    // The session still got a project to hang future steps on.
    let project_id = response.project_id.unwrap();
    let project = store.get_project(&project_id).await.unwrap().unwrap();
    assert_eq!(project.step_status.completed().len(), 0);
}

#[tokio::test]
async fn test_missing_turbine_count_lists_field() {
    let invoker = CountingInvoker::new();
    let orchestrator = orchestrator(Arc::new(MemoryProjectStore::new()), invoker.clone(), None);

    orchestrator.handle(OrchestratorRequest::new(SITE, "s1")).await;
    let response = orchestrator.handle(OrchestratorRequest::new("Optimize the layout", "s1")).await;

    assert!(!response.success);
    assert_eq!(invoker.calls(), 1);
    let artifact = &response.artifacts[0];
    assert_eq!(artifact.artifact_type, "validation_error");
    assert_eq!(artifact.data["errors"][0]["field"], "turbineCount");
}

#[tokio::test]
async fn test_out_of_range_turbine_count_rejected() {
    let invoker = CountingInvoker::new();
    let orchestrator = orchestrator(Arc::new(MemoryProjectStore::new()), invoker.clone(), None);

    orchestrator.handle(OrchestratorRequest::new(SITE, "s1")).await;
    let request = OrchestratorRequest::new("Optimize the layout", "s1")
        .with_context(context(json!({ "turbineCount": 900 })));
    let response = orchestrator.handle(request).await;

    assert!(!response.success);
    assert_eq!(invoker.calls(), 1);
    assert_eq!(response.artifacts[0].data["errors"][0]["field"], "turbineCount");
}

#[tokio::test]
async fn test_tool_failure_leaves_project_untouched() {
    let store = Arc::new(MemoryProjectStore::new());
    let invoker = CountingInvoker::failing("elevation service down");
    let orchestrator = orchestrator(store.clone(), invoker.clone(), None);

    let response = orchestrator.handle(OrchestratorRequest::new(SITE, "s1")).await;

    assert!(!response.success);
    assert!(response.message.contains("elevation service down"));
    assert_eq!(invoker.calls(), 1);
    let artifact = &response.artifacts[0];
    assert_eq!(artifact.artifact_type, "tool_error");
    assert_eq!(artifact.actions[0].suggested_next_intent, WorkflowIntent::TerrainAnalysis);
    assert!(!artifact.actions[0].is_primary);

    let project = store
        .get_project(&response.project_id.unwrap())
        .await
        .unwrap()
        .unwrap();
    assert!(!project.step_status.terrain);
}

#[tokio::test]
async fn test_empty_session_rejected() {
    let invoker = CountingInvoker::new();
    let orchestrator = orchestrator(Arc::new(MemoryProjectStore::new()), invoker.clone(), None);

    let response = orchestrator.handle(OrchestratorRequest::new(SITE, "  ")).await;

    assert!(!response.success);
    assert_eq!(invoker.calls(), 0);
    assert!(response.project_id.is_none());
    assert_eq!(response.thought_steps.len(), 1);
    assert_eq!(response.thought_steps[0].status, ThoughtStatus::Error);
}

// ============================================================================
// Project Resolution
// ============================================================================

#[tokio::test]
async fn test_same_location_same_session_reuses_project() {
    let store = Arc::new(MemoryProjectStore::new());
    let orchestrator = orchestrator(store.clone(), CountingInvoker::new(), None);

    let first = orchestrator.handle(OrchestratorRequest::new(SITE, "s1")).await;
    let second = orchestrator
        .handle(OrchestratorRequest::new("Analyze the terrain at 35.0701, -101.3989", "s1"))
        .await;

    assert_eq!(first.project_id, second.project_id);
    assert_eq!(store.project_count(), 1);
}

#[tokio::test]
async fn test_sessions_do_not_share_location_projects() {
    let store = Arc::new(MemoryProjectStore::new());
    let orchestrator = orchestrator(store.clone(), CountingInvoker::new(), None);

    let a = orchestrator.handle(OrchestratorRequest::new(SITE, "session-a")).await;
    let b = orchestrator.handle(OrchestratorRequest::new(SITE, "session-b")).await;

    assert_ne!(a.project_id, b.project_id);
    assert_eq!(store.project_count(), 2);
}

#[tokio::test]
async fn test_explicit_project_id_is_stable() {
    let store = Arc::new(MemoryProjectStore::new());
    let orchestrator = orchestrator(store.clone(), CountingInvoker::new(), None);

    let first = orchestrator.handle(OrchestratorRequest::new(SITE, "s1")).await;
    let project_id = first.project_id.unwrap();

    // A different session naming the project explicitly lands on it too.
    for _ in 0..2 {
        let request = OrchestratorRequest::new("What is the project status", "other")
            .with_context(context(json!({ "projectId": project_id })));
        let response = orchestrator.handle(request).await;
        assert_eq!(response.project_id.as_deref(), Some(project_id.as_str()));
    }
    assert_eq!(store.project_count(), 1);
}

#[tokio::test]
async fn test_session_binding_carries_location() {
    let invoker = CountingInvoker::new();
    let orchestrator = orchestrator(Arc::new(MemoryProjectStore::new()), invoker.clone(), None);

    orchestrator.handle(OrchestratorRequest::new(SITE, "s1")).await;
    let response = orchestrator
        .handle(OrchestratorRequest::new("Optimize layout with 8 turbines", "s1"))
        .await;

    assert!(response.success, "unexpected failure: {}", response.message);
    let params = invoker.last_params().unwrap();
    assert_eq!(params["longitude"], -101.395466);
    assert_eq!(params["turbineCount"], 8);
}

#[tokio::test]
async fn test_bound_session_keeps_project_for_new_site() {
    let store = Arc::new(MemoryProjectStore::new());
    let orchestrator = orchestrator(store.clone(), CountingInvoker::new(), None);

    let first = orchestrator.handle(OrchestratorRequest::new(SITE, "s1")).await;
    let second = orchestrator
        .handle(OrchestratorRequest::new("Analyze terrain at 40.00, -100.00", "s1"))
        .await;

    assert!(second.success, "unexpected failure: {}", second.message);
    assert_eq!(second.project_id, first.project_id);
    assert_eq!(store.project_count(), 1);

    let resolve = second
        .thought_steps
        .iter()
        .find(|s| s.id == "resolve_project")
        .unwrap();
    assert!(resolve.detail.starts_with("loaded project bound to this session"));

    // Moving the session to another site takes an explicit project id.
    let other = orchestrator
        .handle(OrchestratorRequest::new("Analyze terrain at 40.00, -100.00", "s2"))
        .await;
    let moved = orchestrator
        .handle(
            OrchestratorRequest::new("What is the project status", "s1")
                .with_context(context(json!({ "projectId": other.project_id.clone().unwrap() }))),
        )
        .await;
    assert_eq!(moved.project_id, other.project_id);
    let session = store.get_session("s1").await.unwrap().unwrap();
    assert_eq!(session.active_project_id, other.project_id);
}

// ============================================================================
// Priority Shapes
// ============================================================================

#[tokio::test]
async fn test_project_status_answered_locally() {
    let invoker = CountingInvoker::new();
    let orchestrator = orchestrator(Arc::new(MemoryProjectStore::new()), invoker.clone(), None);

    orchestrator.handle(OrchestratorRequest::new(SITE, "s1")).await;
    let response = orchestrator
        .handle(OrchestratorRequest::new("What is the project status", "s1"))
        .await;

    assert!(response.success);
    assert_eq!(invoker.calls(), 1);
    let artifact = &response.artifacts[0];
    assert_eq!(artifact.artifact_type, "project_status");
    assert_eq!(artifact.data["nextStep"], "layout");
    assert_eq!(artifact.data["stepStatus"]["terrain"], true);
}

#[tokio::test]
async fn test_continue_runs_next_step() {
    let invoker = CountingInvoker::new();
    let orchestrator = orchestrator(Arc::new(MemoryProjectStore::new()), invoker.clone(), None);

    orchestrator.handle(OrchestratorRequest::new(SITE, "s1")).await;
    orchestrator
        .handle(OrchestratorRequest::new("Optimize layout with 10 turbines", "s1"))
        .await;
    let response = orchestrator.handle(OrchestratorRequest::new("continue", "s1")).await;

    assert!(response.success, "unexpected failure: {}", response.message);
    assert_eq!(invoker.tool_names().last().map(String::as_str), Some("wake_simulation"));
    assert_eq!(invoker.last_params().unwrap()["turbineCount"], 10);
}

#[tokio::test]
async fn test_pinned_intent_skips_classification() {
    let invoker = CountingInvoker::new();
    let orchestrator = orchestrator(Arc::new(MemoryProjectStore::new()), invoker.clone(), None);

    let request = OrchestratorRequest::new("go", "s1").with_context(context(json!({
        "intent": "terrain_analysis",
        "latitude": 40.1,
        "longitude": -105.2,
        "radiusKm": 10.0
    })));
    let response = orchestrator.handle(request).await;

    assert!(response.success, "unexpected failure: {}", response.message);
    let params = invoker.last_params().unwrap();
    assert_eq!(params["intent"], "terrain_analysis");
    assert_eq!(params["radiusKm"], 10.0);
    assert_eq!(params["setbackM"], 200.0);
}

// ============================================================================
// SQLite Store
// ============================================================================

#[tokio::test]
async fn test_workflow_against_sqlite_store() {
    let store = Arc::new(SqliteProjectStore::new(Database::new_in_memory().unwrap()));
    let invoker = CountingInvoker::new();
    let orchestrator = orchestrator(store.clone(), invoker.clone(), None);

    let first = orchestrator.handle(OrchestratorRequest::new(SITE, "s1")).await;
    assert!(first.success, "unexpected failure: {}", first.message);
    let second = orchestrator
        .handle(OrchestratorRequest::new("Optimize layout with 10 turbines", "s1"))
        .await;
    assert!(second.success, "unexpected failure: {}", second.message);

    let project = store
        .get_project(&second.project_id.unwrap())
        .await
        .unwrap()
        .unwrap();
    assert!(project.step_status.terrain);
    assert!(project.step_status.layout);
    assert_eq!(project.version, 3);
}
