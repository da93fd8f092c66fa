//! JSON Configuration Management
//!
//! Handles reading and writing the orchestrator configuration file.

use std::fs;
use std::path::{Path, PathBuf};

use crate::models::settings::{OrchestratorConfig, SettingsUpdate};
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::{config_path, ensure_dir};

/// Configuration service for managing orchestrator settings
#[derive(Debug)]
pub struct ConfigService {
    config_path: PathBuf,
    config: OrchestratorConfig,
}

impl ConfigService {
    /// Load ~/.windsite/config.json, creating it with defaults if absent
    pub fn new() -> AppResult<Self> {
        Self::open(config_path()?)
    }

    /// Load the config at `path`, creating it with defaults if absent
    pub fn open(path: impl Into<PathBuf>) -> AppResult<Self> {
        let config_path = path.into();
        if let Some(parent) = config_path.parent() {
            ensure_dir(parent)?;
        }

        let config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            let default_config = OrchestratorConfig::default();
            Self::save_to_file(&config_path, &default_config)?;
            default_config
        };

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Load configuration from a file
    fn load_from_file(path: &Path) -> AppResult<OrchestratorConfig> {
        let content = fs::read_to_string(path)?;
        let config: OrchestratorConfig = serde_json::from_str(&content)?;
        config.validate().map_err(AppError::validation)?;
        Ok(config)
    }

    /// Save configuration to a file with pretty formatting
    fn save_to_file(path: &Path, config: &OrchestratorConfig) -> AppResult<()> {
        config.validate().map_err(AppError::validation)?;
        let content = serde_json::to_string_pretty(config)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the current configuration
    pub fn get_config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Update the configuration with a partial update
    pub fn update_config(&mut self, update: SettingsUpdate) -> AppResult<OrchestratorConfig> {
        let mut candidate = self.config.clone();
        candidate.apply_update(update);
        Self::save_to_file(&self.config_path, &candidate)?;
        self.config = candidate;
        Ok(self.config.clone())
    }

    /// Reset configuration to defaults and save
    pub fn reset(&mut self) -> AppResult<OrchestratorConfig> {
        let defaults = OrchestratorConfig::default();
        Self::save_to_file(&self.config_path, &defaults)?;
        self.config = defaults;
        Ok(self.config.clone())
    }
}
