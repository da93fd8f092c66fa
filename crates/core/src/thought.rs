//! Thought-Step Recorder
//!
//! An append-only, ordered trace of what a single request did. Every pipeline
//! stage narrates itself through a `ThoughtRecorder`; the finished list is
//! returned verbatim in the response and never persisted.

use chrono::Utc;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThoughtStatus {
    Pending,
    InProgress,
    Complete,
    Error,
}

/// One entry in the diagnostic trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThoughtStep {
    /// 1-based position; strictly increasing with no gaps.
    pub order: u32,
    pub id: String,
    pub title: String,
    pub status: ThoughtStatus,
    pub detail: String,
    pub timestamp_ms: i64,
}

/// Handle to a step opened with [`ThoughtRecorder::begin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepHandle(usize);

#[derive(Debug, Default)]
pub struct ThoughtRecorder {
    steps: Vec<ThoughtStep>,
}

impl ThoughtRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a step in the `in_progress` state.
    pub fn begin(&mut self, id: &str, title: &str) -> StepHandle {
        self.push(id, title, ThoughtStatus::InProgress, String::new())
    }

    pub fn complete(&mut self, handle: StepHandle, detail: impl Into<String>) {
        self.finish(handle, ThoughtStatus::Complete, detail.into());
    }

    pub fn fail(&mut self, handle: StepHandle, detail: impl Into<String>) {
        self.finish(handle, ThoughtStatus::Error, detail.into());
    }

    /// Append an already-finished step.
    pub fn record(
        &mut self,
        id: &str,
        title: &str,
        status: ThoughtStatus,
        detail: impl Into<String>,
    ) -> StepHandle {
        self.push(id, title, status, detail.into())
    }

    pub fn steps(&self) -> &[ThoughtStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn into_steps(self) -> Vec<ThoughtStep> {
        self.steps
    }

    fn push(&mut self, id: &str, title: &str, status: ThoughtStatus, detail: String) -> StepHandle {
        let index = self.steps.len();
        self.steps.push(ThoughtStep {
            order: index as u32 + 1,
            id: id.to_string(),
            title: title.to_string(),
            status,
            detail,
            timestamp_ms: Utc::now().timestamp_millis(),
        });
        StepHandle(index)
    }

    fn finish(&mut self, handle: StepHandle, status: ThoughtStatus, detail: String) {
        if let Some(step) = self.steps.get_mut(handle.0) {
            step.status = status;
            step.detail = detail;
            step.timestamp_ms = Utc::now().timestamp_millis();
        }
    }
}
