//! Application State
//!
//! Wires configuration into the orchestrator and its collaborators: the
//! project store, the HTTP tool invoker, and the optional decision engine.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use windsite_core::ProjectStore;
use windsite_llm::{LlmProvider, OpenAIProvider, ProviderConfig};
use windsite_tools::{HttpToolInvoker, ToolInvoker};

use crate::models::settings::{DecisionConfig, OrchestratorConfig, StorageBackend, StorageConfig};
use crate::services::intent::{IntentStrategy, ModelAssistedStrategy};
use crate::services::pipeline::WorkflowOrchestrator;
use crate::storage::{Database, MemoryProjectStore, SqliteProjectStore};
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::database_path;

/// Everything a running orchestrator needs.
pub struct AppState {
    config: OrchestratorConfig,
    /// Present only for the SQLite backend
    database: Option<Database>,
    orchestrator: Arc<WorkflowOrchestrator>,
    /// Provider behind the decision engine, kept for health checks
    decision_provider: Option<Arc<dyn LlmProvider>>,
    decision_timeout: Duration,
}

impl AppState {
    /// Build all services from configuration
    pub fn from_config(config: OrchestratorConfig) -> AppResult<Self> {
        config.validate().map_err(AppError::config)?;

        let (store, database) = build_store(&config.storage)?;
        let invoker: Arc<dyn ToolInvoker> = Arc::new(
            HttpToolInvoker::new(config.tools.base_url.clone()).map_err(|e| AppError::collaborator(e.to_string()))?,
        );
        let provider = build_decision_provider(&config.decision)?;
        let timeout = Duration::from_secs(config.decision.timeout_secs);
        let decision = provider.clone().map(|llm| -> Arc<dyn IntentStrategy> {
            Arc::new(ModelAssistedStrategy::new(llm, timeout))
        });

        Ok(Self::with_collaborators(config, store, invoker, decision, database)
            .with_decision_provider(provider, timeout))
    }

    /// Build state around caller-supplied collaborators
    pub fn with_collaborators(
        config: OrchestratorConfig,
        store: Arc<dyn ProjectStore>,
        invoker: Arc<dyn ToolInvoker>,
        decision: Option<Arc<dyn IntentStrategy>>,
        database: Option<Database>,
    ) -> Self {
        let orchestrator = Arc::new(WorkflowOrchestrator::new(&config, store, invoker, decision));
        info!(
            decision_engine = orchestrator.has_decision_engine(),
            backend = ?config.storage.backend,
            "orchestrator ready"
        );
        let decision_timeout = Duration::from_secs(config.decision.timeout_secs);
        Self {
            config,
            database,
            orchestrator,
            decision_provider: None,
            decision_timeout,
        }
    }

    /// Attach the provider the decision engine talks to, for health checks.
    pub fn with_decision_provider(mut self, provider: Option<Arc<dyn LlmProvider>>, timeout: Duration) -> Self {
        self.decision_provider = provider;
        self.decision_timeout = timeout;
        self
    }

    pub fn orchestrator(&self) -> Arc<WorkflowOrchestrator> {
        Arc::clone(&self.orchestrator)
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Check if all services are healthy
    pub fn is_healthy(&self) -> bool {
        self.database.as_ref().map_or(true, Database::is_healthy)
    }

    /// Ping the decision engine's provider within its timeout. With no
    /// decision engine configured there is nothing to check.
    pub async fn check_decision_engine(&self) -> bool {
        let Some(provider) = &self.decision_provider else {
            return true;
        };
        match tokio::time::timeout(self.decision_timeout, provider.health_check()).await {
            Ok(Ok(())) => {
                info!(provider = provider.name(), model = provider.model(), "decision engine reachable");
                true
            }
            Ok(Err(e)) => {
                warn!(
                    provider = provider.name(),
                    error = %e,
                    "decision engine health check failed; ambiguous requests will get clarifications"
                );
                false
            }
            Err(_) => {
                warn!(
                    provider = provider.name(),
                    timeout_secs = self.decision_timeout.as_secs(),
                    "decision engine health check timed out"
                );
                false
            }
        }
    }
}

fn build_store(config: &StorageConfig) -> AppResult<(Arc<dyn ProjectStore>, Option<Database>)> {
    match config.backend {
        StorageBackend::Memory => Ok((Arc::new(MemoryProjectStore::new()), None)),
        StorageBackend::Sqlite => {
            let path = match &config.database_path {
                Some(path) => path.clone(),
                None => database_path()?,
            };
            let db = Database::open(&path)?;
            info!(path = %path.display(), "opened project database");
            Ok((Arc::new(SqliteProjectStore::new(db.clone())), Some(db)))
        }
    }
}

/// The decision engine is optional: when it is disabled or its API key is
/// missing the orchestrator runs rule-based only.
fn build_decision_provider(config: &DecisionConfig) -> AppResult<Option<Arc<dyn LlmProvider>>> {
    if !config.enabled {
        return Ok(None);
    }

    let provider = config.provider_type().map_err(AppError::config)?;
    let api_key = std::env::var(&config.api_key_env).ok().filter(|k| !k.trim().is_empty());
    if provider.requires_api_key() && api_key.is_none() {
        warn!(
            env = %config.api_key_env,
            "decision engine enabled but no API key found; continuing without it"
        );
        return Ok(None);
    }

    let provider_config = ProviderConfig {
        provider,
        api_key,
        base_url: config.base_url.clone(),
        model: config.model.clone(),
        temperature: 0.0,
        request_timeout_secs: config.timeout_secs,
        ..Default::default()
    };
    let llm = OpenAIProvider::new(provider_config).map_err(|e| AppError::collaborator(e.to_string()))?;
    info!(provider = %provider, model = %config.model, "decision engine enabled");

    Ok(Some(Arc::new(llm)))
}
