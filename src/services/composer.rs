//! Response Composer
//!
//! Builds the caller-facing response from the pipeline's outcome and trace,
//! derives next-step action buttons from project state, and performs the
//! versioned write-back that records a completed step.

use std::sync::Arc;

use serde_json::json;
use tracing::debug;
use windsite_core::{
    ActionButton, Artifact, Project, ProjectStore, StepStatus, StoreError, ThoughtRecorder, WorkflowIntent,
};

use crate::models::parameters::ValidatedParameters;
use crate::models::request::OrchestratorResponse;

pub struct ResponseComposer {
    store: Arc<dyn ProjectStore>,
}

impl ResponseComposer {
    pub fn new(store: Arc<dyn ProjectStore>) -> Self {
        Self { store }
    }

    // ========================================================================
    // Persistence Write-Back
    // ========================================================================

    /// Record a successful step on the project.
    ///
    /// Writes against the version the project was read at. On a conflict the
    /// project is re-read and the same update re-applied once; a second
    /// conflict is returned to the caller. Flags are only ever set, so
    /// re-applying on top of a concurrent writer's record never loses its
    /// completed steps.
    pub async fn write_back(&self, project: &Project, params: &ValidatedParameters) -> Result<Project, StoreError> {
        let Some(step) = params.intent().step() else {
            return Ok(project.clone());
        };
        let snapshot = params.snapshot_entries();

        let mut updated = project.clone();
        updated.record_step_success(step, &snapshot);
        match self.store.put_project(&updated, Some(project.version)).await {
            Ok(version) => {
                updated.version = version;
                return Ok(updated);
            }
            Err(e) if e.is_conflict() => {
                debug!(project_id = %project.id, step = %step, "write-back conflict, re-reading project");
            }
            Err(e) => return Err(e),
        }

        let mut fresh = self
            .store
            .get_project(&project.id)
            .await?
            .ok_or_else(|| StoreError::VersionConflict {
                key: project.id.clone(),
                expected: Some(project.version),
                found: None,
            })?;
        let read_version = fresh.version;
        fresh.record_step_success(step, &snapshot);
        fresh.version = self.store.put_project(&fresh, Some(read_version)).await?;
        Ok(fresh)
    }

    // ========================================================================
    // Action Buttons
    // ========================================================================

    /// Primary button for the next incomplete step, plus a status button.
    pub fn next_actions(status: &StepStatus) -> Vec<ActionButton> {
        let mut actions = Vec::new();
        if let Some(next) = status.next_step() {
            actions.push(ActionButton::primary(next.intent()));
        }
        actions.push(ActionButton::secondary(WorkflowIntent::ProjectQuery));
        actions
    }

    // ========================================================================
    // Responses
    // ========================================================================

    /// Tool succeeded. `project` reflects the step as completed.
    pub fn success(
        &self,
        intent: WorkflowIntent,
        mut artifacts: Vec<Artifact>,
        project: &Project,
        recorder: ThoughtRecorder,
        warning: Option<String>,
    ) -> OrchestratorResponse {
        if let Some(last) = artifacts.last_mut() {
            last.actions.extend(Self::next_actions(&project.step_status));
        }
        OrchestratorResponse {
            success: true,
            message: format!("{} complete for {}.", step_title(intent), project.display_name),
            artifacts,
            thought_steps: recorder.into_steps(),
            warning,
            project_id: Some(project.id.clone()),
        }
    }

    pub fn failure(
        &self,
        message: impl Into<String>,
        artifact: Option<Artifact>,
        project_id: Option<&str>,
        recorder: ThoughtRecorder,
    ) -> OrchestratorResponse {
        OrchestratorResponse {
            success: false,
            message: message.into(),
            artifacts: artifact.into_iter().collect(),
            thought_steps: recorder.into_steps(),
            warning: None,
            project_id: project_id.map(str::to_string),
        }
    }

    /// Ask the caller which workflow step they meant.
    pub fn clarification(
        &self,
        reason: &str,
        project: Option<&Project>,
        recorder: ThoughtRecorder,
    ) -> OrchestratorResponse {
        let suggested = project.and_then(|p| p.step_status.next_step()).map(|s| s.intent());
        let mut actions: Vec<ActionButton> = WorkflowIntent::WORKFLOW
            .into_iter()
            .map(|intent| {
                if Some(intent) == suggested {
                    ActionButton::primary(intent)
                } else {
                    ActionButton::secondary(intent)
                }
            })
            .collect();
        actions.push(ActionButton::secondary(WorkflowIntent::ProjectQuery));

        let message = "I couldn't tell which step you want to run. Choose one of the workflow steps below.";
        let artifact = Artifact::new("clarification", "Which step would you like to run?")
            .with_message(message)
            .with_data(json!({ "reason": reason }))
            .with_actions(actions);

        self.failure(message, Some(artifact), project.map(|p| p.id.as_str()), recorder)
    }

    /// Local answer to a project status query; no tool involved.
    pub fn project_status(&self, project: &Project, recorder: ThoughtRecorder) -> OrchestratorResponse {
        let status = &project.step_status;
        let completed = status.completed();
        let next = status.next_step();

        let done = if completed.is_empty() {
            "no steps completed yet".to_string()
        } else {
            let names: Vec<&str> = completed.iter().map(|s| s.as_str()).collect();
            format!("completed: {}", names.join(", "))
        };
        let message = match next {
            Some(step) => format!("{}: {}. Next: {}.", project.display_name, done, step_title(step.intent())),
            None => format!("{}: all workflow steps are complete.", project.display_name),
        };

        let artifact = Artifact::new("project_status", project.display_name.clone())
            .with_subtitle(format!("{} of {} steps complete", completed.len(), WorkflowIntent::WORKFLOW.len()))
            .with_message(message.clone())
            .with_data(json!({
                "projectId": project.id,
                "location": project.location,
                "stepStatus": project.step_status,
                "nextStep": next.map(|s| s.as_str()),
                "parameterSnapshot": project.parameter_snapshot,
            }))
            .with_actions(Self::next_actions(status));

        OrchestratorResponse {
            success: true,
            message,
            artifacts: vec![artifact],
            thought_steps: recorder.into_steps(),
            warning: None,
            project_id: Some(project.id.clone()),
        }
    }
}

fn step_title(intent: WorkflowIntent) -> &'static str {
    match intent {
        WorkflowIntent::TerrainAnalysis => "Terrain analysis",
        WorkflowIntent::LayoutOptimization => "Layout optimization",
        WorkflowIntent::WakeSimulation => "Wake simulation",
        WorkflowIntent::ReportGeneration => "Report generation",
        WorkflowIntent::ProjectQuery => "Project query",
        WorkflowIntent::Unknown => "Request",
    }
}
