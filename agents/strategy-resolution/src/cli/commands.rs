//! CLI command definitions for the Strategy Resolution Agent
//!
//! Profiles come from a JSON/YAML file, from per-axis flags, or both; flags
//! override values read from the file.

use clap::{Args, Parser, Subcommand};
use deploy_strategy_core::{RawWorkloadProfile, RuleCatalog};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use super::output::{self, CatalogReport, OutputFormat};
use super::ExitCode;
use crate::client::StrategyResolutionClient;
use crate::config::{AgentConfig, ENV_CATALOG_PATH};
use crate::contracts::{DecisionEvent, ResolveRequest};
use crate::engine::StrategyEngine;
use crate::error::{AgentError, Result};
use crate::handler::{create_router, AppState};

/// Strategy Resolution Agent CLI
///
/// Resolve workload profiles into deployment plans and audit rule catalogs.
#[derive(Parser, Debug)]
#[command(name = "strategy-resolve")]
#[command(about = "Strategy Resolution Agent - deterministic deployment strategy resolution", long_about = None)]
#[command(version)]
pub struct StrategyCli {
    #[command(subcommand)]
    pub command: StrategyCommands,
}

#[derive(Subcommand, Debug)]
pub enum StrategyCommands {
    /// Start the HTTP server
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Catalog file served instead of the built-in matrix
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Agent configuration file (TOML)
        #[arg(short, long, env = "STRATEGY_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Resolve a workload profile into a deployment plan
    Resolve {
        #[command(flatten)]
        profile: ProfileArgs,

        /// Catalog file to resolve against (built-in matrix when absent)
        #[arg(long, env = ENV_CATALOG_PATH)]
        catalog: Option<PathBuf>,

        /// Base URL of a running agent; resolves remotely when set
        #[arg(long, env = "STRATEGY_AGENT_URL")]
        remote: Option<String>,

        /// Requester recorded in the decision event
        #[arg(long)]
        requested_by: Option<String>,

        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Show every rule evaluated against a profile and which one wins
    Explain {
        #[command(flatten)]
        profile: ProfileArgs,

        #[arg(long, env = ENV_CATALOG_PATH)]
        catalog: Option<PathBuf>,

        #[arg(long, env = "STRATEGY_AGENT_URL")]
        remote: Option<String>,

        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Load a catalog file, report its tables and any uncovered profiles
    CheckCatalog {
        /// Catalog file (YAML, JSON or TOML); checks the built-in matrix when absent
        #[arg(short, long)]
        catalog: Option<PathBuf>,

        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
}

impl StrategyCommands {
    pub fn format(&self) -> OutputFormat {
        match self {
            StrategyCommands::Serve { .. } => OutputFormat::Table,
            StrategyCommands::Resolve { format, .. }
            | StrategyCommands::Explain { format, .. }
            | StrategyCommands::CheckCatalog { format, .. } => *format,
        }
    }
}

/// Profile given as a file, as per-axis flags, or both
#[derive(Args, Debug, Clone, Default)]
pub struct ProfileArgs {
    /// Profile document (JSON or YAML)
    #[arg(long)]
    pub profile: Option<PathBuf>,

    #[arg(long)]
    pub phase: Option<String>,

    #[arg(long)]
    pub app_type: Option<String>,

    #[arg(long)]
    pub compliance_tier: Option<String>,

    #[arg(long)]
    pub scale: Option<String>,

    #[arg(long)]
    pub criticality_tier: Option<String>,
}

impl ProfileArgs {
    /// Merge the file and flags into an unvalidated profile
    pub fn to_raw(&self) -> Result<RawWorkloadProfile> {
        let mut raw = match &self.profile {
            Some(path) => read_profile(path)?,
            None => RawWorkloadProfile::default(),
        };

        if let Some(v) = &self.phase {
            raw.phase = v.clone();
        }
        if let Some(v) = &self.app_type {
            raw.app_type = v.clone();
        }
        if let Some(v) = &self.compliance_tier {
            raw.compliance_tier = v.clone();
        }
        if let Some(v) = &self.scale {
            raw.scale = v.clone();
        }
        if self.criticality_tier.is_some() {
            raw.criticality_tier = self.criticality_tier.clone();
        }

        let missing: Vec<&str> = [
            ("--phase", &raw.phase),
            ("--app-type", &raw.app_type),
            ("--compliance-tier", &raw.compliance_tier),
            ("--scale", &raw.scale),
        ]
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(flag, _)| *flag)
        .collect();

        if !missing.is_empty() {
            return Err(AgentError::invalid_input(format!(
                "missing {} (or supply them in --profile)",
                missing.join(", ")
            )));
        }
        Ok(raw)
    }
}

fn read_profile(path: &Path) -> Result<RawWorkloadProfile> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        AgentError::file_error(format!(
            "Failed to read profile file '{}': {}",
            path.display(),
            e
        ))
    })?;

    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => Ok(serde_json::from_str(&content)?),
        _ => Ok(serde_yaml::from_str(&content)?),
    }
}

fn load_engine(catalog: Option<PathBuf>) -> Result<StrategyEngine> {
    match catalog {
        Some(path) => {
            if !path.exists() {
                return Err(AgentError::file_error(format!(
                    "catalog file '{}' not found",
                    path.display()
                )));
            }
            StrategyEngine::from_file(path)
        }
        None => StrategyEngine::builtin(),
    }
}

/// Execute the resolve command
pub async fn execute_resolve(
    profile: ProfileArgs,
    catalog: Option<PathBuf>,
    remote: Option<String>,
    requested_by: Option<String>,
    format: OutputFormat,
) -> Result<ExitCode> {
    let raw = profile.to_raw()?;

    let plan = match remote {
        Some(url) => {
            let client = StrategyResolutionClient::new(url);
            client.resolve(raw, requested_by).await?.data.plan
        }
        None => {
            let engine = load_engine(catalog)?;
            let request = ResolveRequest {
                profile: raw,
                requested_by: Some(requested_by.unwrap_or_else(|| "cli".to_string())),
                ..Default::default()
            };
            let input = StrategyEngine::create_input(request)?;
            let record = engine.resolve(&input);
            info!(
                event_id = %record.event.event_id,
                inputs_hash = %record.event.inputs_hash,
                "{}",
                record.event.summary()
            );
            record.result?
        }
    };

    output::render_plan(&plan, format)?;
    Ok(ExitCode::Success)
}

/// Execute the explain command
pub async fn execute_explain(
    profile: ProfileArgs,
    catalog: Option<PathBuf>,
    remote: Option<String>,
    format: OutputFormat,
) -> Result<ExitCode> {
    let raw = profile.to_raw()?;

    let explanation = match remote {
        Some(url) => {
            let client = StrategyResolutionClient::new(url);
            client.explain(raw).await?.data.explanation
        }
        None => {
            let engine = load_engine(catalog)?;
            let input = StrategyEngine::create_input(ResolveRequest::new(raw))?;
            engine.explain(&input).explanation
        }
    };

    output::render_explanation(&explanation, format)?;
    Ok(if explanation.selected_rule_id.is_some() {
        ExitCode::Success
    } else {
        ExitCode::NoMatch
    })
}

/// Execute the check-catalog command
pub fn execute_check_catalog(catalog: Option<PathBuf>, format: OutputFormat) -> Result<ExitCode> {
    let (loaded, source) = match &catalog {
        Some(path) => {
            if !path.exists() {
                return Err(AgentError::file_error(format!(
                    "catalog file '{}' not found",
                    path.display()
                )));
            }
            (RuleCatalog::from_file(path), path.display().to_string())
        }
        None => (RuleCatalog::builtin(), "built-in".to_string()),
    };

    let report = match &loaded {
        Ok(catalog) => CatalogReport::from_catalog(catalog, &source),
        Err(e) => CatalogReport::rejected(&source, e),
    };
    report.render(format)?;

    Ok(match loaded {
        Ok(_) => ExitCode::Success,
        Err(e) => ExitCode::from_strategy_error(&e),
    })
}

/// Execute the serve command
pub async fn execute_serve(config: AgentConfig) -> Result<ExitCode> {
    let address = config.bind_address();
    let state = Arc::new(AppState::from_config(&config)?);
    let router = create_router(Arc::clone(&state));

    info!(
        address = %address,
        agent_id = DecisionEvent::AGENT_ID,
        agent_version = DecisionEvent::AGENT_VERSION,
        catalog_version = %state.engine.snapshot().fingerprint(),
        events_enabled = state.emitter.is_enabled(),
        "Starting Strategy Resolution Agent"
    );

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .map_err(|e| AgentError::config_error(format!("cannot bind {}: {}", address, e)))?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AgentError::internal(e.to_string()))?;

    info!("Strategy Resolution Agent stopped");
    Ok(ExitCode::Success)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
