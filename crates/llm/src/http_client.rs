//! HTTP Client Factory
//!
//! Provides a factory function for building reqwest clients with a request
//! timeout.

use std::time::Duration;

use crate::types::{LlmError, LlmResult};

/// Build a `reqwest::Client` whose requests give up after `timeout`.
pub fn build_http_client(timeout: Duration) -> LlmResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| LlmError::Other {
            message: format!("failed to build HTTP client: {}", e),
        })
}
