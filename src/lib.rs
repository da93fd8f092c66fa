//! Windsite Orchestrator
//!
//! Drives the wind-site workflow (terrain analysis, layout optimization,
//! wake simulation, report generation) from free-text requests.
//! It includes:
//! - The request pipeline and its stages (services)
//! - Versioned project stores and the JSON config file (storage)
//! - Request, response, parameter, and settings types (models)
//! - Logging, paths, and application errors (utils)

pub mod models;
pub mod services;
pub mod state;
pub mod storage;
pub mod utils;

pub use models::request::{OrchestratorRequest, OrchestratorResponse};
pub use models::settings::{OrchestratorConfig, SettingsUpdate};
pub use services::pipeline::{PipelineError, WorkflowOrchestrator};
pub use state::AppState;
pub use utils::error::{AppError, AppResult};
