//! Logging Initialization
//!
//! Installs the global tracing subscriber for the CLI binary. Library code
//! only emits `tracing` events; it never installs a subscriber itself.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::models::settings::{LogFormat, LoggingConfig};

/// Initialize the tracing subscriber.
///
/// Environment variables (in priority order):
/// - `RUST_LOG`: standard filter directives; when set and valid, the level
///   settings below are ignored
/// - `LOG_LEVEL`: overrides the configured level
/// - `LOG_FORMAT`: overrides the configured format (json, pretty)
///
/// Output always goes to stderr; stdout carries orchestrator responses.
pub fn initialize(config: &LoggingConfig) {
    let env_filter = build_filter(
        std::env::var("RUST_LOG").ok().as_deref(),
        std::env::var("LOG_LEVEL").ok().as_deref(),
        &config.level,
    );

    let format = std::env::var("LOG_FORMAT")
        .ok()
        .and_then(|f| LogFormat::parse(&f))
        .unwrap_or(config.format);

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// Span wrapping one orchestrator request; every nested event carries its
/// session and request ids.
pub fn request_span(session_id: &str, request_id: &str) -> tracing::Span {
    tracing::info_span!(
        "request",
        session_id = %session_id,
        request_id = %request_id
    )
}

/// Directives from `RUST_LOG` win; otherwise a single level taken from
/// `LOG_LEVEL` or the config, defaulting to info.
fn build_filter(rust_log: Option<&str>, log_level: Option<&str>, configured: &str) -> EnvFilter {
    if let Some(filter) = rust_log.and_then(|directives| EnvFilter::try_new(directives).ok()) {
        return filter;
    }
    let level: tracing::Level = log_level
        .unwrap_or(configured)
        .parse()
        .unwrap_or(tracing::Level::INFO);
    EnvFilter::new(level.to_string())
}
