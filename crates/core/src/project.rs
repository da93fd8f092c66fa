//! Project and Session Records
//!
//! A `Project` is the persisted unit of workflow state for one wind site.
//! A `SessionRecord` binds a conversation session to its active project.
//! Both carry a `version` used by stores for optimistic concurrency.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CoreError, CoreResult};
use crate::intent::WorkflowStep;

/// Geographic site location in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

impl Location {
    /// Create a location, rejecting out-of-range coordinates.
    pub fn new(lat: f64, lon: f64) -> CoreResult<Self> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(CoreError::validation(format!(
                "latitude {} is outside [-90, 90]",
                lat
            )));
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(CoreError::validation(format!(
                "longitude {} is outside [-180, 180]",
                lon
            )));
        }
        Ok(Self { lat, lon })
    }
}

/// Completion flags for each workflow step.
///
/// Flags are monotonic: `mark_complete` only ever sets a flag, nothing in
/// this crate clears one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepStatus {
    #[serde(default)]
    pub terrain: bool,
    #[serde(default)]
    pub layout: bool,
    #[serde(default)]
    pub simulation: bool,
    #[serde(default)]
    pub report: bool,
}

impl StepStatus {
    pub fn is_complete(&self, step: WorkflowStep) -> bool {
        match step {
            WorkflowStep::Terrain => self.terrain,
            WorkflowStep::Layout => self.layout,
            WorkflowStep::Simulation => self.simulation,
            WorkflowStep::Report => self.report,
        }
    }

    pub fn mark_complete(&mut self, step: WorkflowStep) {
        match step {
            WorkflowStep::Terrain => self.terrain = true,
            WorkflowStep::Layout => self.layout = true,
            WorkflowStep::Simulation => self.simulation = true,
            WorkflowStep::Report => self.report = true,
        }
    }

    /// The step after the furthest completed one; terrain when nothing is done.
    pub fn next_step(&self) -> Option<WorkflowStep> {
        match WorkflowStep::ALL.iter().rev().find(|s| self.is_complete(**s)) {
            Some(furthest) => furthest.following(),
            None => Some(WorkflowStep::Terrain),
        }
    }

    pub fn completed(&self) -> Vec<WorkflowStep> {
        WorkflowStep::ALL
            .into_iter()
            .filter(|s| self.is_complete(*s))
            .collect()
    }
}

/// Persisted per-site workflow state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub step_status: StepStatus,
    #[serde(default)]
    pub parameter_snapshot: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Store version this value was read at; 0 for a record never written.
    #[serde(default)]
    pub version: u64,
}

impl Project {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, location: Option<Location>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            display_name: display_name.into(),
            location,
            step_status: StepStatus::default(),
            parameter_snapshot: Map::new(),
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// Apply the effects of a successful tool run: set the step flag and
    /// merge the parameters that were used into the snapshot.
    pub fn record_step_success(&mut self, step: WorkflowStep, snapshot: &Map<String, Value>) {
        self.step_status.mark_complete(step);
        for (key, value) in snapshot {
            self.parameter_snapshot.insert(key.clone(), value.clone());
        }
        self.updated_at = Utc::now();
    }

    pub fn snapshot_value(&self, key: &str) -> Option<&Value> {
        self.parameter_snapshot.get(key)
    }
}

/// Binding from a conversation session to its active project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub session_id: String,
    #[serde(default)]
    pub active_project_id: Option<String>,
    /// Number of projects this session has created without a location.
    #[serde(default)]
    pub projects_created: u64,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub version: u64,
}

impl SessionRecord {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            active_project_id: None,
            projects_created: 0,
            updated_at: Utc::now(),
            version: 0,
        }
    }
}
