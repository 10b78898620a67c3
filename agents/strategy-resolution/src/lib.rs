//! Strategy Resolution Agent
//!
//! Serves deterministic deployment strategy resolution over HTTP and the
//! command line, and records a DecisionEvent for every resolution.
//!
//! # Design Principles
//! - Deterministic: the same profile and catalog always produce the same plan
//! - Snapshot-consistent: a resolution never sees two catalog versions
//! - Traceable: every decision carries its inputs hash and catalog version

pub mod cli;
pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod handler;
pub mod telemetry;

// Re-export contracts
#[path = "../contracts/mod.rs"]
pub mod contracts;

pub use cli::{run, run_cli, ExitCode, OutputFormat, StrategyCli, StrategyCommands};
pub use client::{ClientError, StrategyResolutionClient};
pub use config::AgentConfig;
pub use contracts::*;
pub use engine::StrategyEngine;
pub use error::{AgentError, Result};
pub use handler::{create_router, AppState};
