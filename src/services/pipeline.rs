//! Workflow Orchestrator
//!
//! Runs one request through the pipeline:
//!
//! ```text
//! Started -> Classifying -> ResolvingProject -> ValidatingParameters
//!         -> [Reclassifying] -> Dispatching -> Composing -> Done
//! ```
//!
//! Any stage that can fail exits to `Failed`. Every error is turned into a
//! `success = false` response carrying the trace recorded so far; nothing
//! escapes `handle` as a fault.

use std::sync::Arc;

use serde_json::json;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn, Instrument};
use uuid::Uuid;
use windsite_core::{
    ActionButton, Artifact, ExplicitContext, Project, ProjectStore, StepHandle, StoreError, ThoughtRecorder,
    ThoughtStatus, WorkflowIntent, WorkflowStep,
};
use windsite_tools::{ToolIdentity, ToolInvoker};

use crate::models::parameters::{FieldError, ValidatedParameters};
use crate::models::request::{OrchestratorRequest, OrchestratorResponse};
use crate::models::settings::OrchestratorConfig;
use crate::services::composer::ResponseComposer;
use crate::services::dispatch::ToolDispatcher;
use crate::services::intent::{IntentClassifier, IntentResult, IntentRouter, IntentStrategy, Reconsideration, RuleBasedStrategy};
use crate::services::parameters::{enrich_from_text, ParameterError, ParameterValidator};
use crate::services::project::{LocationNaming, ProjectContextResolver, ProjectOrigin};
use crate::utils::logging::request_span;

// ============================================================================
// Stages
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Started,
    Classifying,
    ResolvingProject,
    ValidatingParameters,
    Reclassifying,
    Dispatching,
    Composing,
    Done,
    Failed,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Classifying => "classifying",
            Self::ResolvingProject => "resolving_project",
            Self::ValidatingParameters => "validating_parameters",
            Self::Reclassifying => "reclassifying",
            Self::Dispatching => "dispatching",
            Self::Composing => "composing",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    /// Whether `next` is a legal successor of this stage.
    pub fn can_advance_to(&self, next: PipelineStage) -> bool {
        use PipelineStage::*;
        matches!(
            (*self, next),
            (Started, Classifying)
                | (Classifying, ResolvingProject)
                | (ResolvingProject, ValidatingParameters)
                | (ValidatingParameters, Reclassifying)
                | (ValidatingParameters, Dispatching)
                | (ValidatingParameters, Composing)
                | (Reclassifying, Dispatching)
                | (Reclassifying, Composing)
                | (Dispatching, Composing)
                | (Composing, Done)
                | (ResolvingProject, Failed)
                | (ValidatingParameters, Failed)
                | (Reclassifying, Failed)
                | (Dispatching, Failed)
        )
    }
}

/// Tracks the current stage of one run and logs each transition.
#[derive(Debug)]
struct StageTracker {
    current: PipelineStage,
}

impl StageTracker {
    fn new() -> Self {
        Self {
            current: PipelineStage::Started,
        }
    }

    fn advance(&mut self, next: PipelineStage) {
        if !self.current.can_advance_to(next) {
            warn!(from = self.current.as_str(), to = next.as_str(), "unexpected pipeline transition");
        }
        debug!(from = self.current.as_str(), to = next.as_str(), "pipeline stage");
        self.current = next;
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Request-level failures. All are recoverable by resubmitting except
/// `Persistence`, which is fatal for the request.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("Some parameters are missing or invalid: {}", join_field_messages(.0))]
    Validation(Vec<FieldError>),

    #[error("{} needs the {} step to be completed first. Suggested next action: {}", .intent.label(), .missing, .suggestion.label())]
    Prerequisite {
        intent: WorkflowIntent,
        missing: WorkflowStep,
        suggestion: WorkflowIntent,
    },

    #[error("Could not determine which workflow step to run: {0}")]
    ClassificationAmbiguous(String),

    #[error("Tool execution failed: {0}")]
    ToolExecution(String),

    #[error("Project storage failed: {0}")]
    Persistence(#[from] StoreError),
}

fn join_field_messages(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<ParameterError> for PipelineError {
    fn from(err: ParameterError) -> Self {
        match err {
            ParameterError::Prerequisite {
                intent,
                missing,
                suggestion,
            } => Self::Prerequisite {
                intent,
                missing,
                suggestion,
            },
            ParameterError::Invalid(errors) => Self::Validation(errors),
            ParameterError::Unclassified => Self::ClassificationAmbiguous("no workflow intent".to_string()),
        }
    }
}

impl PipelineError {
    /// Artifact explaining the failure, when there is something actionable.
    fn artifact(&self) -> Option<Artifact> {
        match self {
            Self::Validation(errors) => Some(
                Artifact::new("validation_error", "Missing or invalid parameters")
                    .with_message(self.to_string())
                    .with_data(json!({ "errors": errors })),
            ),
            Self::Prerequisite {
                intent,
                missing,
                suggestion,
            } => Some(
                Artifact::new("prerequisite_required", format!("{} is not ready yet", intent.label()))
                    .with_message(self.to_string())
                    .with_data(json!({ "intent": intent, "missingStep": missing }))
                    .with_actions(vec![ActionButton::primary(*suggestion)]),
            ),
            Self::ClassificationAmbiguous(_) | Self::ToolExecution(_) | Self::Persistence(_) => None,
        }
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

pub struct WorkflowOrchestrator {
    router: IntentRouter,
    shapes: IntentClassifier,
    resolver: ProjectContextResolver,
    validator: ParameterValidator,
    dispatcher: ToolDispatcher,
    composer: ResponseComposer,
}

impl WorkflowOrchestrator {
    /// Wire the pipeline from configuration and its three collaborators.
    /// `decision` is the optional fallback strategy for low-confidence queries.
    pub fn new(
        config: &OrchestratorConfig,
        store: Arc<dyn ProjectStore>,
        invoker: Arc<dyn ToolInvoker>,
        decision: Option<Arc<dyn IntentStrategy>>,
    ) -> Self {
        let mut router = IntentRouter::new(Arc::new(RuleBasedStrategy::default()), config.confidence_threshold);
        if let Some(strategy) = decision {
            router = router.with_fallback(strategy);
        }

        Self {
            router,
            shapes: IntentClassifier::new(),
            resolver: ProjectContextResolver::new(
                Arc::clone(&store),
                LocationNaming::new(config.coordinate_precision),
            ),
            validator: ParameterValidator::default(),
            dispatcher: ToolDispatcher::new(invoker, config.tools.timeouts.clone()),
            composer: ResponseComposer::new(store),
        }
    }

    pub fn has_decision_engine(&self) -> bool {
        self.router.has_fallback()
    }

    /// Run one request to completion.
    pub async fn handle(&self, request: OrchestratorRequest) -> OrchestratorResponse {
        let request_id = Uuid::new_v4().to_string();
        let span = request_span(&request.session_id, &request_id);
        self.run(request).instrument(span).await
    }

    /// Like [`handle`](Self::handle), but abandons the response if `cancel`
    /// fires first. Spawned tool and decision-engine calls keep running to
    /// completion in the background; no project state is written for an
    /// abandoned request.
    pub async fn handle_cancellable(
        &self,
        request: OrchestratorRequest,
        cancel: CancellationToken,
    ) -> Option<OrchestratorResponse> {
        let session_id = request.session_id.clone();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!(session_id = %session_id, "request cancelled, response abandoned");
                None
            }
            response = self.handle(request) => Some(response),
        }
    }

    async fn run(&self, request: OrchestratorRequest) -> OrchestratorResponse {
        let mut recorder = ThoughtRecorder::new();
        let mut stage = StageTracker::new();
        let session_id = request.session_id.trim().to_string();
        let text = request.text.trim().to_string();
        let mut context: ExplicitContext = request.explicit_context;

        // --------------------------------------------------------------------
        // Classifying
        // --------------------------------------------------------------------
        stage.advance(PipelineStage::Classifying);
        let handle = recorder.begin("classify_intent", "Classifying request");
        if session_id.is_empty() {
            recorder.fail(handle, "sessionId is required");
            return self.composer.failure("A sessionId is required.", None, None, recorder);
        }

        let extracted = enrich_from_text(&text, &mut context);
        let pinned = context.intent();
        let mut intent = match pinned {
            Some(intent) => IntentResult::new(intent, 1.0, "Intent supplied with the request"),
            None => self.router.classify(&text).await,
        };
        let mut detail = format!(
            "{} (confidence {:.2}): {}",
            intent.intent, intent.confidence, intent.reasoning
        );
        if !extracted.is_empty() {
            detail.push_str(&format!("; extracted {}", extracted.join(", ")));
        }
        recorder.complete(handle, detail);
        info!(intent = %intent.intent, confidence = intent.confidence, pinned = pinned.is_some(), "classified request");

        // --------------------------------------------------------------------
        // ResolvingProject
        // --------------------------------------------------------------------
        stage.advance(PipelineStage::ResolvingProject);
        let handle = recorder.begin("resolve_project", "Resolving project context");
        let resolved = match self
            .resolver
            .resolve(&session_id, context.project_id(), context.location())
            .await
        {
            Ok(resolved) => resolved,
            Err(e) => {
                error!(error = %e, "project resolution failed");
                recorder.fail(handle, e.to_string());
                stage.advance(PipelineStage::Failed);
                let err = PipelineError::from(e);
                return self.composer.failure(err.to_string(), None, None, recorder);
            }
        };
        let project = resolved.project;
        recorder.complete(
            handle,
            format!("{}: {} ({})", resolved.origin.describe(), project.id, project.display_name),
        );
        info!(project_id = %project.id, origin = ?resolved.origin, "resolved project");

        // Priority shapes skip the decision engine.
        let mut priority = pinned.is_some();
        if !priority {
            if let Some(next) = self.continuation_target(&text, &intent, &project, resolved.origin) {
                info!(intent = %next, "continuing with the project's next step");
                intent = IntentResult::new(next, 1.0, "Continuing with the project's next step");
                priority = true;
            }
        }

        // --------------------------------------------------------------------
        // ValidatingParameters
        // --------------------------------------------------------------------
        stage.advance(PipelineStage::ValidatingParameters);
        let needs_fallback = !priority && self.router.needs_reconsideration(&intent);
        let handle = recorder.begin("validate_parameters", "Validating parameters");
        let params = if needs_fallback {
            recorder.complete(
                handle,
                format!(
                    "Deferred: {} at confidence {:.2} is below threshold {:.2}",
                    intent.intent,
                    intent.confidence,
                    self.router.threshold()
                ),
            );

            // ----------------------------------------------------------------
            // Reclassifying
            // ----------------------------------------------------------------
            stage.advance(PipelineStage::Reclassifying);
            let handle = recorder.begin("reconsider_intent", "Consulting decision engine");
            match self.router.reconsider(&text, &intent).await {
                Reconsideration::Resolved { result, strategy } => {
                    recorder.complete(
                        handle,
                        format!("{} chose {} (confidence {:.2})", strategy, result.intent, result.confidence),
                    );
                    intent = result;
                }
                Reconsideration::Unresolved { reason } => {
                    recorder.fail(handle, reason.clone());
                    stage.advance(PipelineStage::Failed);
                    return self.composer.clarification(&reason, Some(&project), recorder);
                }
            }

            let handle = recorder.begin("revalidate_parameters", "Validating parameters for reconsidered intent");
            self.validate(intent.intent, &context, &project, &mut recorder, handle)
        } else {
            self.validate(intent.intent, &context, &project, &mut recorder, handle)
        };

        let params = match params {
            Ok(params) => params,
            Err(err) => {
                stage.advance(PipelineStage::Failed);
                return self.fail(err, &project, recorder);
            }
        };

        if params.intent() == WorkflowIntent::ProjectQuery {
            stage.advance(PipelineStage::Composing);
            recorder.record(
                "compose_response",
                "Composing response",
                ThoughtStatus::Complete,
                "Answered from stored project state",
            );
            stage.advance(PipelineStage::Done);
            return self.composer.project_status(&project, recorder);
        }

        // --------------------------------------------------------------------
        // Dispatching
        // --------------------------------------------------------------------
        stage.advance(PipelineStage::Dispatching);
        let Some(tool) = ToolIdentity::for_intent(params.intent()) else {
            stage.advance(PipelineStage::Failed);
            let err = PipelineError::ClassificationAmbiguous(format!("no tool handles {}", params.intent()));
            return self.fail(err, &project, recorder);
        };
        let handle = recorder.begin("dispatch_tool", &format!("Calling {} tool", tool));
        let result = self.dispatcher.dispatch(&params).await;
        if !result.success {
            let message = result.error.unwrap_or_else(|| format!("{} failed", tool));
            recorder.fail(handle, message.clone());
            stage.advance(PipelineStage::Failed);
            let artifact = Artifact::new("tool_error", format!("{} failed", tool.title()))
                .with_message(message.clone())
                .with_actions(vec![ActionButton::secondary(params.intent())]);
            let err = PipelineError::ToolExecution(message);
            return self
                .composer
                .failure(err.to_string(), Some(artifact), Some(&project.id), recorder);
        }
        recorder.complete(handle, format!("{} returned {} artifact(s)", tool, result.artifacts.len()));

        // --------------------------------------------------------------------
        // Composing
        // --------------------------------------------------------------------
        stage.advance(PipelineStage::Composing);
        let handle = recorder.begin("update_project", "Recording step completion");
        let (project, warning) = match self.composer.write_back(&project, &params).await {
            Ok(updated) => {
                recorder.complete(
                    handle,
                    format!("{} marked complete (version {})", tool.step(), updated.version),
                );
                (updated, None)
            }
            Err(e) => {
                error!(
                    project_id = %project.id,
                    step = %tool.step(),
                    error = %e,
                    "tool succeeded but project write-back failed; project state is stale"
                );
                recorder.fail(handle, e.to_string());
                let mut assumed = project.clone();
                assumed.record_step_success(tool.step(), &params.snapshot_entries());
                let warning = format!(
                    "The {} step finished but the project record could not be updated ({}). Project status may be stale.",
                    tool.step(),
                    e
                );
                (assumed, Some(warning))
            }
        };

        recorder.record(
            "compose_response",
            "Composing response",
            ThoughtStatus::Complete,
            format!("{} artifact(s); parameters: {}", result.artifacts.len(), params.describe_sources()),
        );
        stage.advance(PipelineStage::Done);
        self.composer
            .success(params.intent(), result.artifacts, &project, recorder, warning)
    }

    fn validate(
        &self,
        intent: WorkflowIntent,
        context: &ExplicitContext,
        project: &Project,
        recorder: &mut ThoughtRecorder,
        handle: StepHandle,
    ) -> Result<ValidatedParameters, PipelineError> {
        match self.validator.validate(intent, context, project) {
            Ok(params) => {
                let sources = params.describe_sources();
                recorder.complete(
                    handle,
                    if sources.is_empty() {
                        format!("{}: no parameters required", intent)
                    } else {
                        format!("{}: {}", intent, sources)
                    },
                );
                Ok(params)
            }
            Err(e) => {
                recorder.fail(handle, e.to_string());
                Err(PipelineError::from(e))
            }
        }
    }

    /// Next-step intent for a bare "continue" request, when the project has
    /// history and a step left to run.
    fn continuation_target(
        &self,
        text: &str,
        intent: &IntentResult,
        project: &Project,
        origin: ProjectOrigin,
    ) -> Option<WorkflowIntent> {
        if intent.is_confident(self.router.threshold()) || origin == ProjectOrigin::Created {
            return None;
        }
        if !self.shapes.is_continuation(text) {
            return None;
        }
        project.step_status.next_step().map(|step| step.intent())
    }

    fn fail(&self, err: PipelineError, project: &Project, recorder: ThoughtRecorder) -> OrchestratorResponse {
        if let PipelineError::ClassificationAmbiguous(reason) = &err {
            return self.composer.clarification(reason, Some(project), recorder);
        }
        info!(error = %err, "request rejected");
        self.composer
            .failure(err.to_string(), err.artifact(), Some(&project.id), recorder)
    }
}
