//! Windsite LLM
//!
//! Provides a unified interface for the optional model-assisted decision
//! engine. One provider implementation covers every endpoint that speaks the
//! OpenAI chat-completions dialect:
//! - OpenAI
//! - DeepSeek
//! - Ollama (local inference)
//!
//! Also includes the HTTP client factory.

pub mod http_client;
pub mod openai;
pub mod provider;
pub mod types;

// Re-export main types
pub use http_client::build_http_client;
pub use openai::OpenAIProvider;
pub use provider::LlmProvider;
pub use types::*;
