//! Windsite orchestrator CLI
//!
//! Reads newline-delimited JSON requests on stdin and writes one JSON
//! response per line on stdout. Logs go to stderr.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use windsite_core::ExplicitContext;

use windsite_orchestrator::models::request::{OrchestratorRequest, OrchestratorResponse};
use windsite_orchestrator::models::settings::{SettingsUpdate, StorageBackend};
use windsite_orchestrator::state::AppState;
use windsite_orchestrator::storage::ConfigService;
use windsite_orchestrator::utils::logging;

#[derive(Parser)]
#[command(name = "windsite")]
#[command(about = "Wind-site workflow orchestrator")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ~/.windsite/config.json)
    #[arg(long, env = "WINDSITE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Keep projects in memory instead of the configured store
    #[arg(long, global = true)]
    memory: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Process newline-delimited JSON requests from stdin (default)
    Serve,
    /// Run a single request
    Ask {
        /// Request text
        text: String,
        #[arg(long, default_value = "cli")]
        session: String,
        /// Explicit context as a JSON object
        #[arg(long)]
        context: Option<String>,
    },
    /// Show or change the configuration file
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
    /// Check the project store and the decision engine
    Check,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration (default)
    Show,
    /// Change settings and save them to the config file
    Set {
        #[arg(long)]
        confidence_threshold: Option<f64>,
        #[arg(long)]
        coordinate_precision: Option<u32>,
        #[arg(long)]
        decision_enabled: Option<bool>,
        #[arg(long)]
        tools_base_url: Option<String>,
    },
    /// Restore the default configuration
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config_service = match &cli.config {
        Some(path) => ConfigService::open(path),
        None => ConfigService::new(),
    }
    .context("failed to load configuration")?;
    let mut config = config_service.get_config().clone();
    if cli.memory {
        config.storage.backend = StorageBackend::Memory;
    }

    logging::initialize(&config.logging);
    info!(config = %config_service.path().display(), "configuration loaded");

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Config { action } => {
            let shown = match action.unwrap_or(ConfigAction::Show) {
                ConfigAction::Show => config,
                ConfigAction::Set {
                    confidence_threshold,
                    coordinate_precision,
                    decision_enabled,
                    tools_base_url,
                } => {
                    let update = SettingsUpdate {
                        confidence_threshold,
                        coordinate_precision,
                        decision_enabled,
                        tools_base_url,
                    };
                    let saved = config_service
                        .update_config(update)
                        .context("failed to update configuration")?;
                    info!(config = %config_service.path().display(), "configuration saved");
                    saved
                }
                ConfigAction::Reset => config_service.reset().context("failed to reset configuration")?,
            };
            println!("{}", serde_json::to_string_pretty(&shown)?);
            Ok(())
        }
        Commands::Check => {
            let state = AppState::from_config(config).context("failed to initialize services")?;
            let store = state.is_healthy();
            let decision_engine = state.check_decision_engine().await;
            let report = serde_json::json!({
                "store": store,
                "decisionEngine": decision_engine,
                "decisionEngineEnabled": state.orchestrator().has_decision_engine(),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !(store && decision_engine) {
                anyhow::bail!("health check failed");
            }
            Ok(())
        }
        Commands::Ask { text, session, context } => {
            let state = AppState::from_config(config).context("failed to initialize services")?;
            let context = match context {
                Some(raw) => serde_json::from_str::<ExplicitContext>(&raw).context("--context must be a JSON object")?,
                None => ExplicitContext::new(),
            };
            let request = OrchestratorRequest::new(text, session).with_context(context);
            let response = state.orchestrator().handle(request).await;
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Commands::Serve => {
            let state = AppState::from_config(config).context("failed to initialize services")?;
            // An unreachable decision engine is logged, not fatal.
            state.check_decision_engine().await;
            serve(state).await
        }
    }
}

/// Answer stdin requests until EOF or Ctrl-C. A request in flight when
/// Ctrl-C arrives is abandoned without a response.
async fn serve(state: AppState) -> Result<()> {
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_token.cancel();
        }
    });

    let orchestrator = state.orchestrator();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.next_line() => line.context("failed to read stdin")?,
        };
        let Some(line) = line else { break };
        if line.trim().is_empty() {
            continue;
        }

        let request: OrchestratorRequest = match serde_json::from_str(&line) {
            Ok(request) => request,
            Err(e) => {
                error!(error = %e, "malformed request line");
                let response = OrchestratorResponse {
                    success: false,
                    message: format!("Malformed request: {}", e),
                    artifacts: Vec::new(),
                    thought_steps: Vec::new(),
                    warning: None,
                    project_id: None,
                };
                println!("{}", serde_json::to_string(&response)?);
                continue;
            }
        };

        match orchestrator.handle_cancellable(request, cancel.clone()).await {
            Some(response) => println!("{}", serde_json::to_string(&response)?),
            None => break,
        }
    }

    info!("shutting down");
    Ok(())
}
