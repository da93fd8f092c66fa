//! Request and Response Types
//!
//! The inbound query and the outbound response of one pipeline run.

use serde::{Deserialize, Serialize};
use windsite_core::{Artifact, ExplicitContext, ThoughtStep};

/// One natural-language request plus optional structured context.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestratorRequest {
    pub text: String,
    pub session_id: String,
    #[serde(default)]
    pub explicit_context: ExplicitContext,
}

impl OrchestratorRequest {
    pub fn new(text: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            session_id: session_id.into(),
            explicit_context: ExplicitContext::new(),
        }
    }

    pub fn with_context(mut self, context: ExplicitContext) -> Self {
        self.explicit_context = context;
        self
    }
}

/// Result of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestratorResponse {
    pub success: bool,
    pub message: String,
    pub artifacts: Vec<Artifact>,
    pub thought_steps: Vec<ThoughtStep>,
    /// Set when the tool succeeded but the project could not be updated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}
