//! Cross-Platform Path Utilities
//!
//! Functions for resolving application directories across platforms.
//! Everything lives under ~/.windsite/.

use std::path::{Path, PathBuf};

use crate::utils::error::{AppError, AppResult};

/// Get the user's home directory
pub fn home_dir() -> AppResult<PathBuf> {
    dirs::home_dir().ok_or_else(|| AppError::config("Could not determine home directory"))
}

/// Get the Windsite directory (~/.windsite/)
pub fn windsite_dir() -> AppResult<PathBuf> {
    Ok(home_dir()?.join(".windsite"))
}

/// Get the config file path (~/.windsite/config.json)
pub fn config_path() -> AppResult<PathBuf> {
    Ok(windsite_dir()?.join("config.json"))
}

/// Get the database file path (~/.windsite/projects.db)
pub fn database_path() -> AppResult<PathBuf> {
    Ok(windsite_dir()?.join("projects.db"))
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> AppResult<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
