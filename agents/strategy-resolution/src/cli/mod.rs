//! CLI module for the Strategy Resolution Agent
//!
//! Resolves and explains profiles locally or against a running agent,
//! audits catalog files, and starts the HTTP server.

pub mod commands;
pub mod output;

pub use commands::{ProfileArgs, StrategyCli, StrategyCommands};
pub use output::{CatalogReport, OutputFormat};

use deploy_strategy_core::{ErrorCode, StrategyError};

use crate::config::AgentConfig;
use crate::error::AgentError;

/// Exit codes for CLI operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// A plan was produced, or the catalog is valid
    Success = 0,
    /// No rule or failover tier matched the profile
    NoMatch = 1,
    /// Invalid profile, arguments or configuration
    InvalidInput = 3,
    /// File not found or inaccessible
    FileError = 4,
    /// Catalog rejected at load
    CatalogError = 5,
    /// Internal error
    InternalError = 10,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl ExitCode {
    pub fn from_strategy_error(error: &StrategyError) -> Self {
        Self::from_code(error.code())
    }

    fn from_code(code: ErrorCode) -> Self {
        match code {
            ErrorCode::NoMatch => ExitCode::NoMatch,
            ErrorCode::ValidationError => ExitCode::InvalidInput,
            ErrorCode::AmbiguousMatch | ErrorCode::CatalogLoadError => ExitCode::CatalogError,
        }
    }

    /// Determine exit code from an agent error
    pub fn from_error(error: &AgentError) -> Self {
        match error {
            AgentError::Strategy(e) => Self::from_strategy_error(e),
            AgentError::InvalidInput(_) | AgentError::ParseError(_) | AgentError::ConfigError(_) => {
                ExitCode::InvalidInput
            }
            AgentError::FileError(_) => ExitCode::FileError,
            AgentError::Remote { code, .. } => {
                serde_json::from_value::<ErrorCode>(serde_json::Value::String(code.clone()))
                    .map(Self::from_code)
                    .unwrap_or(ExitCode::InternalError)
            }
            AgentError::SerializationError(_) | AgentError::InternalError(_) => {
                ExitCode::InternalError
            }
        }
    }
}

/// Run the CLI and return the exit code
pub async fn run(cli: StrategyCli) -> Result<ExitCode, AgentError> {
    match cli.command {
        StrategyCommands::Serve {
            host,
            port,
            catalog,
            config,
        } => {
            let mut agent_config = AgentConfig::load(config.as_deref())?;
            if let Some(host) = host {
                agent_config.host = host;
            }
            if let Some(port) = port {
                agent_config.port = port;
            }
            if catalog.is_some() {
                agent_config.catalog_path = catalog;
            }
            commands::execute_serve(agent_config).await
        }
        StrategyCommands::Resolve {
            profile,
            catalog,
            remote,
            requested_by,
            format,
        } => commands::execute_resolve(profile, catalog, remote, requested_by, format).await,
        StrategyCommands::Explain {
            profile,
            catalog,
            remote,
            format,
        } => commands::execute_explain(profile, catalog, remote, format).await,
        StrategyCommands::CheckCatalog { catalog, format } => {
            commands::execute_check_catalog(catalog, format)
        }
    }
}

/// Run the CLI, rendering any error, and return the process exit code
pub async fn run_cli(cli: StrategyCli) -> ExitCode {
    let format = cli.command.format();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            output::render_error(&e, format);
            ExitCode::from_error(&e)
        }
    }
}
