//! Strategy Resolution Agent CLI
//!
//! # Usage
//!
//! ```bash
//! # Resolve a profile against the built-in deployment matrix
//! strategy-resolve resolve --phase growth_phase --app-type web_applications \
//!     --compliance-tier standard_compliance --scale medium --criticality-tier business_critical
//!
//! # Show which rules matched and why one won
//! strategy-resolve explain --profile workload.yaml --format json
//!
//! # Audit a catalog file before deploying it
//! strategy-resolve check-catalog --catalog catalogs/deployment-matrix.yaml
//!
//! # Serve the HTTP API
//! strategy-resolve serve --port 8085 --catalog catalogs/deployment-matrix.yaml
//! ```
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: No rule or failover tier matched
//! - 3: Invalid profile, arguments or configuration
//! - 4: File not found or inaccessible
//! - 5: Catalog rejected
//! - 10: Internal error

use clap::Parser;
use strategy_resolution::{run_cli, StrategyCli};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
        .try_init()?;

    let cli = StrategyCli::parse();

    let exit_code = run_cli(cli).await;
    std::process::exit(exit_code.into());
}
