//! Settings Models
//!
//! Orchestrator configuration stored in config.json.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use windsite_llm::ProviderType;
use windsite_tools::ToolTimeouts;

/// Orchestrator configuration stored in config.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestratorConfig {
    /// Classifier confidence below which the decision engine is consulted
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
    /// Decimal places used when deriving project ids from coordinates
    #[serde(default = "default_coordinate_precision")]
    pub coordinate_precision: u32,
    #[serde(default)]
    pub decision: DecisionConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_confidence_threshold() -> f64 {
    0.5
}

fn default_coordinate_precision() -> u32 {
    2
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
            coordinate_precision: default_coordinate_precision(),
            decision: DecisionConfig::default(),
            tools: ToolsConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Model-assisted decision engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_decision_provider")]
    pub provider: String,
    #[serde(default = "default_decision_model")]
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_decision_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_decision_provider() -> String {
    "openai".to_string()
}

fn default_decision_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_key_env() -> String {
    "WINDSITE_DECISION_API_KEY".to_string()
}

fn default_decision_timeout_secs() -> u64 {
    8
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: default_decision_provider(),
            model: default_decision_model(),
            base_url: None,
            api_key_env: default_api_key_env(),
            timeout_secs: default_decision_timeout_secs(),
        }
    }
}

impl DecisionConfig {
    pub fn provider_type(&self) -> Result<ProviderType, String> {
        self.provider.parse::<ProviderType>().map_err(|e| e.to_string())
    }
}

/// External tool service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsConfig {
    #[serde(default = "default_tools_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub timeouts: ToolTimeouts,
}

fn default_tools_base_url() -> String {
    "http://localhost:8600/tools".to_string()
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            base_url: default_tools_base_url(),
            timeouts: ToolTimeouts::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    Memory,
}

/// Project store settings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// Database file; defaults to ~/.windsite/projects.db
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

impl LogFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(LogFormat::Json),
            "pretty" | "human" => Some(LogFormat::Pretty),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Settings update request (partial update)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    pub confidence_threshold: Option<f64>,
    pub coordinate_precision: Option<u32>,
    pub decision_enabled: Option<bool>,
    pub tools_base_url: Option<String>,
}

impl OrchestratorConfig {
    /// Apply a partial update to the configuration
    pub fn apply_update(&mut self, update: SettingsUpdate) {
        if let Some(threshold) = update.confidence_threshold {
            self.confidence_threshold = threshold;
        }
        if let Some(precision) = update.coordinate_precision {
            self.coordinate_precision = precision;
        }
        if let Some(enabled) = update.decision_enabled {
            self.decision.enabled = enabled;
        }
        if let Some(url) = update.tools_base_url {
            self.tools.base_url = url;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(format!(
                "confidenceThreshold must be within [0, 1], got {}",
                self.confidence_threshold
            ));
        }

        if self.coordinate_precision > 6 {
            return Err("coordinatePrecision cannot exceed 6 decimal places".to_string());
        }

        self.decision.provider_type()?;
        if self.decision.timeout_secs == 0 {
            return Err("decision.timeoutSecs must be greater than 0".to_string());
        }
        if self.decision.api_key_env.trim().is_empty() {
            return Err("decision.apiKeyEnv cannot be empty".to_string());
        }

        if self.tools.base_url.trim().is_empty() {
            return Err("tools.baseUrl cannot be empty".to_string());
        }
        self.tools.timeouts.validate()?;

        if self.logging.level.parse::<tracing::Level>().is_err() {
            return Err(format!("Invalid log level: {}", self.logging.level));
        }

        Ok(())
    }
}
