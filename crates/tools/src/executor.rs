//! Tool Execution Result
//!
//! Normalized outcome of one tool dispatch, independent of how the tool was
//! reached.

use serde::{Deserialize, Serialize};
use windsite_core::Artifact;

/// Result of a tool execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the execution was successful
    pub success: bool,
    /// Normalized artifacts (empty on failure)
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
    /// Error message (if failed)
    pub error: Option<String>,
}

impl ToolResult {
    /// Create a successful result
    pub fn ok(artifacts: Vec<Artifact>) -> Self {
        Self {
            success: true,
            artifacts,
            error: None,
        }
    }

    /// Create an error result
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            success: false,
            artifacts: Vec::new(),
            error: Some(error.into()),
        }
    }
}
