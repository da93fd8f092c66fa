//! Tool Dispatcher
//!
//! Maps validated parameters onto exactly one external tool and invokes it
//! under that tool's timeout. The outbound call runs on its own task: if
//! the request is abandoned the call still finishes and its outcome is
//! logged, but nothing else observes it. No retries.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};
use windsite_tools::{normalize, ToolIdentity, ToolInvokeError, ToolInvoker, ToolResult, ToolTimeouts};

use crate::models::parameters::ValidatedParameters;

pub struct ToolDispatcher {
    invoker: Arc<dyn ToolInvoker>,
    timeouts: ToolTimeouts,
}

impl ToolDispatcher {
    pub fn new(invoker: Arc<dyn ToolInvoker>, timeouts: ToolTimeouts) -> Self {
        Self { invoker, timeouts }
    }

    pub fn timeout_for(&self, tool: ToolIdentity) -> Duration {
        self.timeouts.for_tool(tool)
    }

    pub async fn dispatch(&self, params: &ValidatedParameters) -> ToolResult {
        let intent = params.intent();
        let Some(tool) = ToolIdentity::for_intent(intent) else {
            return ToolResult::err(format!("No tool handles {}", intent));
        };

        let timeout = self.timeout_for(tool);
        let invoker = Arc::clone(&self.invoker);
        let payload = params.to_payload();
        let project_id = params.project_id.clone();

        let handle = tokio::spawn(async move {
            let started = Instant::now();
            let outcome = match tokio::time::timeout(timeout, invoker.invoke(tool.name(), payload, timeout)).await {
                Ok(result) => result,
                Err(_) => Err(ToolInvokeError::timeout(tool.name(), timeout)),
            };
            let elapsed_ms = started.elapsed().as_millis() as u64;
            match &outcome {
                Ok(_) => info!(tool = tool.name(), project_id = %project_id, elapsed_ms, "tool call succeeded"),
                Err(e) => warn!(tool = tool.name(), project_id = %project_id, elapsed_ms, error = %e, "tool call failed"),
            }
            outcome
        });

        match handle.await {
            Ok(Ok(raw)) => ToolResult::ok(normalize(tool, raw)),
            Ok(Err(e)) => ToolResult::err(e.to_string()),
            Err(e) => ToolResult::err(format!("{} task failed: {}", tool, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::parameters::{IntentParameters, TerrainParameters};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    struct RecordingInvoker {
        calls: Mutex<Vec<(String, Value)>>,
        response: Result<Value, ToolInvokeError>,
        delay: Duration,
    }

    impl RecordingInvoker {
        fn new(response: Result<Value, ToolInvokeError>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                response,
                delay: Duration::ZERO,
            }
        }
    }

    #[async_trait]
    impl ToolInvoker for RecordingInvoker {
        async fn invoke(&self, tool_name: &str, params: Value, _timeout: Duration) -> Result<Value, ToolInvokeError> {
            self.calls.lock().unwrap().push((tool_name.to_string(), params));
            tokio::time::sleep(self.delay).await;
            self.response.clone()
        }
    }

    fn terrain_params() -> ValidatedParameters {
        ValidatedParameters {
            project_id: "site-a".to_string(),
            params: IntentParameters::TerrainAnalysis(TerrainParameters {
                latitude: 35.07,
                longitude: -101.4,
                radius_km: 5.0,
                setback_m: 200.0,
            }),
            sources: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn test_dispatch_invokes_matching_tool() {
        let invoker = Arc::new(RecordingInvoker::new(Ok(json!({
            "title": "Buildable area",
            "message": "62% of the site is buildable"
        }))));
        let dispatcher = ToolDispatcher::new(invoker.clone(), ToolTimeouts::default());

        let result = dispatcher.dispatch(&terrain_params()).await;
        assert!(result.success);
        assert_eq!(result.artifacts.len(), 1);
        assert_eq!(result.artifacts[0].artifact_type, "terrain_analysis");

        let calls = invoker.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "terrain_analysis");
        assert_eq!(calls[0].1["projectId"], "site-a");
        assert_eq!(calls[0].1["radiusKm"], 5.0);
    }

    #[tokio::test]
    async fn test_tool_error_is_unsuccessful_result() {
        let invoker = Arc::new(RecordingInvoker::new(Err(ToolInvokeError::tool(
            "terrain_analysis",
            "DEM tile missing",
        ))));
        let dispatcher = ToolDispatcher::new(invoker.clone(), ToolTimeouts::default());

        let result = dispatcher.dispatch(&terrain_params()).await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("DEM tile missing"));
        assert_eq!(invoker.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_timeout_enforced_without_retry() {
        let mut slow = RecordingInvoker::new(Ok(json!({})));
        slow.delay = Duration::from_secs(5);
        let invoker = Arc::new(slow);
        let timeouts = ToolTimeouts {
            terrain_secs: 1,
            ..Default::default()
        };
        let dispatcher = ToolDispatcher::new(invoker.clone(), timeouts);

        let result = dispatcher.dispatch(&terrain_params()).await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("terrain_analysis timed out after 1s"));
        assert_eq!(invoker.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_project_query_has_no_tool() {
        let invoker = Arc::new(RecordingInvoker::new(Ok(json!({}))));
        let dispatcher = ToolDispatcher::new(invoker.clone(), ToolTimeouts::default());
        let params = ValidatedParameters {
            project_id: "p".to_string(),
            params: IntentParameters::ProjectQuery,
            sources: BTreeMap::new(),
        };

        let result = dispatcher.dispatch(&params).await;
        assert!(!result.success);
        assert!(invoker.calls.lock().unwrap().is_empty());
    }
}
