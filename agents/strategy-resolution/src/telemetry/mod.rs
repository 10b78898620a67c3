//! Telemetry for the Strategy Resolution Agent
//!
//! - `metrics` - Prometheus metrics for resolutions and catalog reloads
//! - `emitter` - Non-blocking DecisionEvent emission

pub mod emitter;
pub mod metrics;

pub use emitter::DecisionEventEmitter;
pub use metrics::{MetricsRegistry, StrategyMetrics};

use thiserror::Error;

/// Telemetry errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to emit decision event: {0}")]
    EmissionFailed(String),

    #[error("Failed to serialize event: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(String),

    #[error("Metrics error: {0}")]
    MetricsError(#[from] prometheus::Error),
}

pub type Result<T> = std::result::Result<T, TelemetryError>;
