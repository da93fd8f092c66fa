//! Collaborator doubles shared by the integration tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use windsite_core::{ExplicitContext, Project, ProjectStore, SessionRecord, StoreError};
use windsite_llm::{LlmProvider, LlmRequestOptions, LlmResponse, LlmResult, Message, ProviderConfig};
use windsite_tools::{ToolInvokeError, ToolInvoker};

use windsite_orchestrator::services::intent::IntentStrategy;
use windsite_orchestrator::storage::MemoryProjectStore;
use windsite_orchestrator::{OrchestratorConfig, WorkflowOrchestrator};

// ============================================================================
// Tool Invoker
// ============================================================================

/// Records every invocation and answers with a canned artifact-like object.
pub struct CountingInvoker {
    calls: AtomicUsize,
    invocations: Mutex<Vec<(String, Value)>>,
    delay: Duration,
    failure: Option<String>,
}

impl CountingInvoker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::build(Duration::ZERO, None))
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self::build(Duration::ZERO, Some(message.to_string())))
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self::build(delay, None))
    }

    fn build(delay: Duration, failure: Option<String>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            invocations: Mutex::new(Vec::new()),
            delay,
            failure,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.invocations.lock().unwrap().iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn last_params(&self) -> Option<Value> {
        self.invocations.lock().unwrap().last().map(|(_, params)| params.clone())
    }
}

#[async_trait]
impl ToolInvoker for CountingInvoker {
    async fn invoke(&self, tool_name: &str, params: Value, _timeout: Duration) -> Result<Value, ToolInvokeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.invocations
            .lock()
            .unwrap()
            .push((tool_name.to_string(), params.clone()));

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some(message) = &self.failure {
            return Err(ToolInvokeError::tool(tool_name, message.clone()));
        }
        Ok(json!({
            "title": format!("{} result", tool_name),
            "message": "done",
            "echo": params,
        }))
    }
}

// ============================================================================
// Decision Engine
// ============================================================================

/// LLM provider that replays scripted JSON replies in order.
pub struct ScriptedProvider {
    replies: Mutex<Vec<String>>,
    calls: AtomicUsize,
    config: ProviderConfig,
}

impl ScriptedProvider {
    pub fn new(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().rev().map(|r| r.to_string()).collect()),
            calls: AtomicUsize::new(0),
            config: ProviderConfig::default(),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    async fn send_message(
        &self,
        _messages: Vec<Message>,
        _system: Option<String>,
        _request_options: LlmRequestOptions,
    ) -> LlmResult<LlmResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.replies.lock().unwrap().pop().unwrap_or_default();
        Ok(LlmResponse::text(reply, "scripted-model"))
    }

    async fn health_check(&self) -> LlmResult<()> {
        Ok(())
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

// ============================================================================
// Project Stores
// ============================================================================

/// Memory store whose project updates (not creates) can be made to conflict.
///
/// With `conflict_once`, the first update sneaks in a concurrent write that
/// completes the simulation step before delegating, so the caller's write
/// hits a stale version exactly once. With `always_conflict`, every update
/// is rejected.
pub struct ContendedStore {
    inner: MemoryProjectStore,
    conflict_once: AtomicBool,
    always_conflict: bool,
}

impl ContendedStore {
    pub fn conflict_once() -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryProjectStore::new(),
            conflict_once: AtomicBool::new(true),
            always_conflict: false,
        })
    }

    pub fn always_conflict() -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryProjectStore::new(),
            conflict_once: AtomicBool::new(false),
            always_conflict: true,
        })
    }
}

#[async_trait]
impl ProjectStore for ContendedStore {
    async fn get_project(&self, id: &str) -> Result<Option<Project>, StoreError> {
        self.inner.get_project(id).await
    }

    async fn put_project(&self, project: &Project, expected: Option<u64>) -> Result<u64, StoreError> {
        let Some(expected) = expected else {
            return self.inner.put_project(project, None).await;
        };
        if self.always_conflict {
            return Err(StoreError::VersionConflict {
                key: project.id.clone(),
                expected: Some(expected),
                found: Some(expected + 1),
            });
        }
        if self.conflict_once.swap(false, Ordering::SeqCst) {
            if let Some(mut concurrent) = self.inner.get_project(&project.id).await? {
                let version = concurrent.version;
                concurrent.step_status.simulation = true;
                self.inner.put_project(&concurrent, Some(version)).await?;
            }
        }
        self.inner.put_project(project, Some(expected)).await
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<SessionRecord>, StoreError> {
        self.inner.get_session(session_id).await
    }

    async fn put_session(&self, session: &SessionRecord, expected: Option<u64>) -> Result<u64, StoreError> {
        self.inner.put_session(session, expected).await
    }
}

/// Memory store whose session writes fail until `restore` is called.
pub struct SessionOutageStore {
    inner: MemoryProjectStore,
    sessions_down: AtomicBool,
}

impl SessionOutageStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryProjectStore::new(),
            sessions_down: AtomicBool::new(true),
        })
    }

    pub fn restore(&self) {
        self.sessions_down.store(false, Ordering::SeqCst);
    }

    pub fn project_count(&self) -> usize {
        self.inner.project_count()
    }
}

#[async_trait]
impl ProjectStore for SessionOutageStore {
    async fn get_project(&self, id: &str) -> Result<Option<Project>, StoreError> {
        self.inner.get_project(id).await
    }

    async fn put_project(&self, project: &Project, expected: Option<u64>) -> Result<u64, StoreError> {
        self.inner.put_project(project, expected).await
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<SessionRecord>, StoreError> {
        self.inner.get_session(session_id).await
    }

    async fn put_session(&self, session: &SessionRecord, expected: Option<u64>) -> Result<u64, StoreError> {
        if self.sessions_down.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("session table locked"));
        }
        self.inner.put_session(session, expected).await
    }
}

/// Store that cannot be reached at all.
pub struct UnreachableStore;

#[async_trait]
impl ProjectStore for UnreachableStore {
    async fn get_project(&self, _id: &str) -> Result<Option<Project>, StoreError> {
        Err(StoreError::unavailable("connection refused"))
    }

    async fn put_project(&self, _project: &Project, _expected: Option<u64>) -> Result<u64, StoreError> {
        Err(StoreError::unavailable("connection refused"))
    }

    async fn get_session(&self, _session_id: &str) -> Result<Option<SessionRecord>, StoreError> {
        Err(StoreError::unavailable("connection refused"))
    }

    async fn put_session(&self, _session: &SessionRecord, _expected: Option<u64>) -> Result<u64, StoreError> {
        Err(StoreError::unavailable("connection refused"))
    }
}

// ============================================================================
// Builders
// ============================================================================

pub fn orchestrator(
    store: Arc<dyn ProjectStore>,
    invoker: Arc<dyn ToolInvoker>,
    decision: Option<Arc<dyn IntentStrategy>>,
) -> WorkflowOrchestrator {
    WorkflowOrchestrator::new(&OrchestratorConfig::default(), store, invoker, decision)
}

pub fn context(value: Value) -> ExplicitContext {
    serde_json::from_value(value).unwrap()
}

/// Ids of the recorded thought steps, in order.
pub fn step_ids(steps: &[windsite_core::ThoughtStep]) -> Vec<&str> {
    steps.iter().map(|s| s.id.as_str()).collect()
}

/// Orders must run 1..=n with no gaps.
pub fn assert_gap_free(steps: &[windsite_core::ThoughtStep]) {
    for (index, step) in steps.iter().enumerate() {
        assert_eq!(step.order as usize, index + 1, "gap before step {}", step.id);
    }
}
