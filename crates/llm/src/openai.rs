//! OpenAI-Compatible Provider
//!
//! Implementation of the LlmProvider trait for the OpenAI chat-completions
//! API. DeepSeek and Ollama expose the same dialect, so this provider serves
//! all three with a different endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::provider::{missing_api_key_error, parse_http_error, LlmProvider};
use super::types::{
    LlmError, LlmRequestOptions, LlmResponse, LlmResult, Message, MessageRole, ProviderConfig,
    ProviderType, StopReason, UsageStats,
};
use crate::http_client::build_http_client;

/// OpenAI-compatible provider
pub struct OpenAIProvider {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl OpenAIProvider {
    /// Create a new provider with the given configuration
    pub fn new(config: ProviderConfig) -> LlmResult<Self> {
        let client = build_http_client(Duration::from_secs(config.request_timeout_secs))?;
        Ok(Self { config, client })
    }

    /// Get the chat-completions URL
    fn base_url(&self) -> &str {
        self.config
            .base_url
            .as_deref()
            .unwrap_or_else(|| self.config.provider.default_endpoint())
    }

    /// Build the request body for the API
    fn build_request_body(
        &self,
        messages: &[Message],
        system: Option<&str>,
        request_options: &LlmRequestOptions,
    ) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.config.model,
            "max_tokens": request_options.max_tokens_override.unwrap_or(self.config.max_tokens),
            "temperature": request_options
                .temperature_override
                .unwrap_or(self.config.temperature),
            "stream": false,
        });

        let mut openai_messages: Vec<serde_json::Value> = Vec::new();
        if let Some(sys) = system {
            openai_messages.push(serde_json::json!({
                "role": "system",
                "content": sys
            }));
        }
        for msg in messages {
            let role = match msg.role {
                MessageRole::User => "user",
                MessageRole::Assistant => "assistant",
                MessageRole::System => "system",
            };
            openai_messages.push(serde_json::json!({
                "role": role,
                "content": msg.content
            }));
        }
        body["messages"] = serde_json::json!(openai_messages);

        if request_options.json_mode {
            body["response_format"] = serde_json::json!({ "type": "json_object" });
        }

        body
    }

    fn parse_response(&self, response: &OpenAIResponse) -> LlmResponse {
        let choice = response.choices.first();

        let (content, thinking) = choice
            .and_then(|c| c.message.as_ref())
            .map(|m| (m.content.clone(), m.reasoning_content.clone()))
            .unwrap_or((None, None));

        let stop_reason = choice
            .and_then(|c| c.finish_reason.as_ref())
            .map(|r| StopReason::from(r.as_str()))
            .unwrap_or(StopReason::EndTurn);

        let usage = response
            .usage
            .as_ref()
            .map(|u| UsageStats {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
                thinking_tokens: u.reasoning_tokens,
            })
            .unwrap_or_default();

        LlmResponse {
            content,
            thinking,
            stop_reason,
            usage,
            model: response.model.clone(),
        }
    }

    fn authorization(&self) -> LlmResult<Option<String>> {
        match self.config.api_key.as_deref() {
            Some(key) if !key.is_empty() => Ok(Some(format!("Bearer {}", key))),
            _ if self.config.provider.requires_api_key() => Err(missing_api_key_error(self.name())),
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAIProvider {
    fn name(&self) -> &'static str {
        match self.config.provider {
            ProviderType::OpenAI => "openai",
            ProviderType::DeepSeek => "deepseek",
            ProviderType::Ollama => "ollama",
        }
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn send_message(
        &self,
        messages: Vec<Message>,
        system: Option<String>,
        request_options: LlmRequestOptions,
    ) -> LlmResult<LlmResponse> {
        let auth = self.authorization()?;
        let body = self.build_request_body(&messages, system.as_deref(), &request_options);

        let mut request = self
            .client
            .post(self.base_url())
            .header("Content-Type", "application/json");
        if let Some(auth) = auth {
            request = request.header("Authorization", auth);
        }

        let response = request
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::NetworkError {
                message: e.to_string(),
            })?;

        let status = response.status().as_u16();
        let body_text = response.text().await.map_err(|e| LlmError::NetworkError {
            message: e.to_string(),
        })?;

        if status != 200 {
            return Err(parse_http_error(status, &body_text, self.name()));
        }

        let openai_response: OpenAIResponse =
            serde_json::from_str(&body_text).map_err(|e| LlmError::ParseError {
                message: format!("Failed to parse response: {}", e),
            })?;

        debug!(
            provider = self.name(),
            model = %openai_response.model,
            "chat completion received"
        );

        Ok(self.parse_response(&openai_response))
    }

    async fn health_check(&self) -> LlmResult<()> {
        let response = self
            .send_message(
                vec![Message::user("ping")],
                None,
                LlmRequestOptions {
                    max_tokens_override: Some(1),
                    ..Default::default()
                },
            )
            .await;
        match response {
            Ok(_) => Ok(()),
            Err(LlmError::NetworkError { message }) => {
                Err(LlmError::ProviderUnavailable { message })
            }
            Err(e) => Err(e),
        }
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

/// OpenAI API response format
#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    model: String,
    choices: Vec<Choice>,
    usage: Option<ResponseUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    #[serde(default)]
    reasoning_content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    #[serde(default)]
    reasoning_tokens: Option<u32>,
}
