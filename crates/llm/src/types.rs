//! LLM Types
//!
//! Core types for LLM provider interactions.

use serde::{Deserialize, Serialize};

/// Supported LLM provider types. All speak the OpenAI chat-completions dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    OpenAI,
    DeepSeek,
    Ollama,
}

impl ProviderType {
    /// Default chat-completions endpoint for the provider.
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            ProviderType::OpenAI => "https://api.openai.com/v1/chat/completions",
            ProviderType::DeepSeek => "https://api.deepseek.com/v1/chat/completions",
            ProviderType::Ollama => "http://localhost:11434/v1/chat/completions",
        }
    }

    /// Whether requests must carry an API key.
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, ProviderType::Ollama)
    }
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderType::OpenAI => write!(f, "openai"),
            ProviderType::DeepSeek => write!(f, "deepseek"),
            ProviderType::Ollama => write!(f, "ollama"),
        }
    }
}

impl std::str::FromStr for ProviderType {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(ProviderType::OpenAI),
            "deepseek" => Ok(ProviderType::DeepSeek),
            "ollama" => Ok(ProviderType::Ollama),
            other => Err(LlmError::InvalidRequest {
                message: format!("unsupported provider '{}'", other),
            }),
        }
    }
}

/// Per-request options for provider behavior.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LlmRequestOptions {
    /// Optional temperature override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_override: Option<f32>,
    /// Optional max-tokens override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens_override: Option<u32>,
    /// Ask the provider for a JSON object response.
    #[serde(default)]
    pub json_mode: bool,
}

/// Configuration for an LLM provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// The provider type
    pub provider: ProviderType,
    /// API key (not needed for Ollama)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Base URL override (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Model name to use
    pub model: String,
    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Temperature (0.0 - 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// HTTP request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_temperature() -> f32 {
    0.7
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider: ProviderType::OpenAI,
            api_key: None,
            base_url: None,
            model: "gpt-4o-mini".to_string(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Message role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// A single text message in a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn text(role: MessageRole, text: impl Into<String>) -> Self {
        Self {
            role,
            content: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::text(MessageRole::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::text(MessageRole::Assistant, text)
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::text(MessageRole::System, text)
    }
}

/// Token usage statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageStats {
    /// Number of input/prompt tokens
    pub input_tokens: u32,
    /// Number of output/completion tokens
    pub output_tokens: u32,
    /// Number of thinking/reasoning tokens (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking_tokens: Option<u32>,
}

impl UsageStats {
    /// Total tokens used
    pub fn total_tokens(&self) -> u32 {
        self.input_tokens + self.output_tokens + self.thinking_tokens.unwrap_or(0)
    }
}

/// Stop reason for the response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Natural end of response
    EndTurn,
    /// Hit max tokens limit
    MaxTokens,
    /// Stopped at a stop sequence
    StopSequence,
    /// Other/unknown reason
    Other(String),
}

impl From<&str> for StopReason {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "end_turn" | "stop" => StopReason::EndTurn,
            "max_tokens" | "length" => StopReason::MaxTokens,
            "stop_sequence" => StopReason::StopSequence,
            other => StopReason::Other(other.to_string()),
        }
    }
}

/// Response from an LLM provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    /// Text content of the response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Thinking/reasoning content (if available)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking: Option<String>,
    /// Why the response ended
    pub stop_reason: StopReason,
    /// Token usage statistics
    pub usage: UsageStats,
    /// The model that generated the response
    pub model: String,
}

impl LlmResponse {
    /// Build a plain text response, mostly useful for test doubles.
    pub fn text(content: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            thinking: None,
            stop_reason: StopReason::EndTurn,
            usage: UsageStats::default(),
            model: model.into(),
        }
    }

    /// Text content, falling back to the thinking channel when empty.
    pub fn text_or_thinking(&self) -> Option<&str> {
        self.content
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .or(self.thinking.as_deref())
    }
}

/// Error types for LLM operations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LlmError {
    /// Authentication failed (invalid API key)
    AuthenticationFailed { message: String },
    /// Rate limit exceeded
    RateLimited {
        message: String,
        retry_after: Option<u32>,
    },
    /// Model not found or not available
    ModelNotFound { model: String },
    /// Invalid request (bad parameters)
    InvalidRequest { message: String },
    /// Server error from the provider
    ServerError {
        message: String,
        status: Option<u16>,
    },
    /// Network/connection error
    NetworkError { message: String },
    /// Response parsing error
    ParseError { message: String },
    /// Provider not available (e.g., Ollama not running)
    ProviderUnavailable { message: String },
    /// Other error
    Other { message: String },
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmError::AuthenticationFailed { message } => {
                write!(f, "Authentication failed: {}", message)
            }
            LlmError::RateLimited { message, .. } => {
                write!(f, "Rate limited: {}", message)
            }
            LlmError::ModelNotFound { model } => {
                write!(f, "Model not found: {}", model)
            }
            LlmError::InvalidRequest { message } => {
                write!(f, "Invalid request: {}", message)
            }
            LlmError::ServerError { message, status } => {
                if let Some(s) = status {
                    write!(f, "Server error ({}): {}", s, message)
                } else {
                    write!(f, "Server error: {}", message)
                }
            }
            LlmError::NetworkError { message } => {
                write!(f, "Network error: {}", message)
            }
            LlmError::ParseError { message } => {
                write!(f, "Parse error: {}", message)
            }
            LlmError::ProviderUnavailable { message } => {
                write!(f, "Provider unavailable: {}", message)
            }
            LlmError::Other { message } => {
                write!(f, "Error: {}", message)
            }
        }
    }
}

impl std::error::Error for LlmError {}

/// Result type for LLM operations
pub type LlmResult<T> = Result<T, LlmError>;
