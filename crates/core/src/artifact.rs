//! Response Artifacts
//!
//! Structured payloads returned to the caller for rendering, plus the action
//! buttons that suggest the next request.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::intent::WorkflowIntent;

/// A suggested follow-up request attached to an artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionButton {
    pub label: String,
    pub is_primary: bool,
    pub suggested_next_intent: WorkflowIntent,
}

impl ActionButton {
    pub fn primary(intent: WorkflowIntent) -> Self {
        Self {
            label: intent.label().to_string(),
            is_primary: true,
            suggested_next_intent: intent,
        }
    }

    pub fn secondary(intent: WorkflowIntent) -> Self {
        Self {
            label: intent.label().to_string(),
            is_primary: false,
            suggested_next_intent: intent,
        }
    }
}

/// One renderable result item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    #[serde(rename = "type")]
    pub artifact_type: String,
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub actions: Vec<ActionButton>,
}

impl Artifact {
    pub fn new(artifact_type: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            artifact_type: artifact_type.into(),
            title: title.into(),
            subtitle: String::new(),
            message: String::new(),
            data: Value::Null,
            actions: Vec::new(),
        }
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = subtitle.into();
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    pub fn with_actions(mut self, actions: Vec<ActionButton>) -> Self {
        self.actions = actions;
        self
    }
}
