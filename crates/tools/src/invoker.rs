//! Tool Invoker
//!
//! The outbound seam to the external tool services. `ToolInvoker` is the
//! collaborator trait; `HttpToolInvoker` reaches tools as JSON-over-HTTP
//! endpoints under a common base URL.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Failure modes of a single tool invocation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolInvokeError {
    /// The tool did not answer within its timeout
    #[error("{tool} timed out after {timeout_secs}s")]
    Timeout { tool: String, timeout_secs: u64 },

    /// The tool answered with an error
    #[error("{tool} failed: {message}")]
    Tool { tool: String, message: String },

    /// The tool could not be reached
    #[error("{tool} unreachable: {message}")]
    Transport { tool: String, message: String },
}

impl ToolInvokeError {
    pub fn timeout(tool: &str, timeout: Duration) -> Self {
        Self::Timeout {
            tool: tool.to_string(),
            timeout_secs: timeout.as_secs(),
        }
    }

    pub fn tool(tool: &str, message: impl Into<String>) -> Self {
        Self::Tool {
            tool: tool.to_string(),
            message: message.into(),
        }
    }

    pub fn transport(tool: &str, message: impl Into<String>) -> Self {
        Self::Transport {
            tool: tool.to_string(),
            message: message.into(),
        }
    }
}

/// Invokes an external tool with an opaque payload.
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    async fn invoke(
        &self,
        tool_name: &str,
        params: Value,
        timeout: Duration,
    ) -> Result<Value, ToolInvokeError>;
}

/// Tools exposed as `POST {base_url}/{tool_name}` JSON endpoints.
pub struct HttpToolInvoker {
    client: reqwest::Client,
    base_url: String,
}

impl HttpToolInvoker {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ToolInvokeError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ToolInvokeError::transport("http", e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn endpoint(&self, tool_name: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), tool_name)
    }
}

#[async_trait]
impl ToolInvoker for HttpToolInvoker {
    async fn invoke(
        &self,
        tool_name: &str,
        params: Value,
        timeout: Duration,
    ) -> Result<Value, ToolInvokeError> {
        let url = self.endpoint(tool_name);
        debug!(tool = tool_name, url = %url, "invoking tool");

        let call = async {
            let response = self
                .client
                .post(&url)
                .json(&params)
                .send()
                .await
                .map_err(|e| ToolInvokeError::transport(tool_name, e.to_string()))?;
            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| ToolInvokeError::transport(tool_name, e.to_string()))?;
            interpret_response(tool_name, status.as_u16(), &body)
        };

        tokio::time::timeout(timeout, call)
            .await
            .map_err(|_| ToolInvokeError::timeout(tool_name, timeout))?
    }
}

/// Turn a raw HTTP status and body into the tool's raw result.
///
/// Non-JSON bodies are returned as a JSON string. A JSON object carrying
/// `"success": false` is treated as a tool-reported failure.
fn interpret_response(tool_name: &str, status: u16, body: &str) -> Result<Value, ToolInvokeError> {
    let parsed = serde_json::from_str::<Value>(body).unwrap_or_else(|_| Value::String(body.to_string()));

    if !(200..300).contains(&status) {
        let message = error_message(&parsed).unwrap_or_else(|| format!("HTTP {}: {}", status, body));
        return Err(ToolInvokeError::tool(tool_name, message));
    }

    if parsed.get("success").and_then(Value::as_bool) == Some(false) {
        let message = error_message(&parsed).unwrap_or_else(|| "tool reported failure".to_string());
        return Err(ToolInvokeError::tool(tool_name, message));
    }

    Ok(parsed)
}

fn error_message(value: &Value) -> Option<String> {
    value
        .get("error")
        .or_else(|| value.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
}
