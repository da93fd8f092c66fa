//! Model-Assisted Intent Strategy
//!
//! Asks an LLM to classify a query the rule-based classifier was unsure
//! about. The whole exchange runs under one deadline. On a JSON parse failure
//! the model gets a single repair prompt within that same deadline.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use windsite_core::WorkflowIntent;
use windsite_llm::{LlmProvider, LlmRequestOptions, LlmResponse, Message};

use super::classifier::IntentResult;
use super::strategy::{DecisionError, IntentStrategy};

// ============================================================================
// System Prompt
// ============================================================================

const DECISION_SYSTEM_PROMPT: &str = r#"You route requests for a wind farm site-assessment assistant. Classify the user's request into exactly one workflow intent.

Intents:
- "terrain_analysis": analyze site terrain, exclusion zones, buildable area
- "layout_optimization": place or optimize wind turbine positions
- "wake_simulation": simulate wake losses or annual energy production for a layout
- "report_generation": produce a project report
- "project_query": ask about project status, progress, or completed steps
- "unknown": anything else, or too vague to tell

Respond with ONLY valid JSON matching this schema:
{
  "intent": "<one of the intents above>",
  "confidence": 0.0-1.0,
  "reasoning": "Brief explanation"
}

No markdown fences, no explanatory text. Just the raw JSON object."#;

// ============================================================================
// LLM Response Schema
// ============================================================================

/// Deserialization target for the LLM's JSON response.
#[derive(Debug, Deserialize)]
struct LlmDecisionResponse {
    intent: String,
    confidence: f64,
    #[serde(default)]
    reasoning: String,
}

/// LLM-backed fallback strategy.
pub struct ModelAssistedStrategy {
    provider: Arc<dyn LlmProvider>,
    timeout: Duration,
}

impl ModelAssistedStrategy {
    pub fn new(provider: Arc<dyn LlmProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    async fn decide_with_repair(
        &self,
        text: &str,
        prior: Option<&IntentResult>,
    ) -> Result<IntentResult, DecisionError> {
        let messages = vec![Message::user(build_user_message(text, prior))];
        let options = LlmRequestOptions {
            temperature_override: Some(0.0),
            json_mode: true,
            ..Default::default()
        };

        // First attempt
        let response = self
            .provider
            .send_message(messages.clone(), Some(DECISION_SYSTEM_PROMPT.to_string()), options.clone())
            .await
            .map_err(|e| DecisionError::Provider(e.to_string()))?;
        let response_text = extract_response_text(&response)?;

        debug!(
            provider = self.provider.name(),
            len = response_text.len(),
            preview = %response_text.chars().take(200).collect::<String>(),
            "decision engine: first attempt response"
        );

        let first_error = match parse_decision_response(&response_text) {
            Ok(result) => return Ok(result),
            Err(e) => e,
        };

        debug!(error = %first_error, "decision engine: parse failed, retrying with repair prompt");

        let mut retry_messages = messages;
        retry_messages.push(Message::assistant(response_text.clone()));
        retry_messages.push(Message::user(build_repair_prompt(&response_text, &first_error)));

        let retry_response = self
            .provider
            .send_message(retry_messages, Some(DECISION_SYSTEM_PROMPT.to_string()), options)
            .await
            .map_err(|e| DecisionError::Provider(e.to_string()))?;
        let retry_text = extract_response_text(&retry_response)?;

        parse_decision_response(&retry_text).map_err(|second_error| {
            DecisionError::Parse(format!(
                "first error: {}; retry error: {}",
                first_error, second_error
            ))
        })
    }
}

#[async_trait]
impl IntentStrategy for ModelAssistedStrategy {
    fn name(&self) -> &'static str {
        "model_assisted"
    }

    async fn decide(&self, text: &str, prior: Option<&IntentResult>) -> Result<IntentResult, DecisionError> {
        tokio::time::timeout(self.timeout, self.decide_with_repair(text, prior))
            .await
            .map_err(|_| DecisionError::Timeout(self.timeout.as_secs()))?
    }
}

// ============================================================================
// Prompt Building
// ============================================================================

fn build_user_message(text: &str, prior: Option<&IntentResult>) -> String {
    match prior {
        Some(prior) => format!(
            "Classify the following request.\n\n\
             Request:\n{}\n\n\
             Preliminary keyword classification (unreliable, you may override):\n\
             - Intent: {}\n\
             - Confidence: {:.0}%\n\n\
             Provide your answer as JSON.",
            text,
            prior.intent,
            prior.confidence * 100.0,
        ),
        None => format!(
            "Classify the following request.\n\nRequest:\n{}\n\nProvide your answer as JSON.",
            text
        ),
    }
}

fn build_repair_prompt(original_response: &str, parse_error: &str) -> String {
    format!(
        "Your previous response could not be parsed as valid JSON.\n\n\
         Parse error: {}\n\n\
         Your previous response was:\n{}\n\n\
         Please respond with ONLY a valid JSON object matching the schema. \
         No markdown fences, no explanatory text. Just the raw JSON object \
         starting with {{ and ending with }}.",
        parse_error, original_response
    )
}

// ============================================================================
// Response Parsing
// ============================================================================

/// Extract text content from an LLM response.
fn extract_response_text(response: &LlmResponse) -> Result<String, DecisionError> {
    response
        .text_or_thinking()
        .filter(|t| !t.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            DecisionError::Parse(format!(
                "response contained no text (model: {}, stop_reason: {:?})",
                response.model, response.stop_reason
            ))
        })
}

/// Extract JSON object from response text, handling markdown fences and surrounding text.
fn extract_json_from_response(response_text: &str) -> String {
    let trimmed = response_text.trim();

    // Try markdown code fences
    if let Some(start) = trimmed.find("```") {
        let after_fence = &trimmed[start + 3..];
        let content_start = after_fence.find('\n').map(|nl| nl + 1).unwrap_or(0);
        let content = &after_fence[content_start..];
        if let Some(end) = content.find("```") {
            return content[..end].trim().to_string();
        }
    }

    // Try to find the first { and last } for a JSON object
    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start <= end {
            return trimmed[start..=end].to_string();
        }
    }

    trimmed.to_string()
}

/// Parse the LLM response text into an intent decision.
///
/// An intent label outside the known set maps to `unknown` rather than an
/// error: the model answered, it just did not know.
fn parse_decision_response(response_text: &str) -> Result<IntentResult, String> {
    let json_str = extract_json_from_response(response_text);
    if json_str.trim().is_empty() {
        return Err("empty response".to_string());
    }

    let parsed: LlmDecisionResponse = serde_json::from_str(&json_str).map_err(|e| {
        format!(
            "Invalid JSON: {}. Content: {:?}",
            e,
            json_str.chars().take(200).collect::<String>()
        )
    })?;

    let intent = parsed
        .intent
        .parse::<WorkflowIntent>()
        .unwrap_or(WorkflowIntent::Unknown);
    let reasoning = if parsed.reasoning.is_empty() {
        "Model-assisted classification".to_string()
    } else {
        parsed.reasoning
    };
    Ok(IntentResult::new(intent, parsed.confidence, reasoning))
}
