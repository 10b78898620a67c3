//! # Deploy Strategy Core
//!
//! Deterministic resolution of deployment strategies for workload profiles.
//!
//! A workload is described along five closed axes (phase, application type,
//! compliance tier, scale and an optional criticality tier). A declarative
//! [`RuleCatalog`] maps predicate patterns over those axes to
//! recommendation bundles. Resolution picks the matching rule with the
//! highest specificity, breaking ties by declaration order, and annotates
//! the bundle with a failover chain and a cost band.
//!
//! Catalogs are validated exhaustively at load time: unknown tokens,
//! duplicate predicate sets, incomplete bundles, non-monotonic failover
//! chains and cost decreases across the profile space are all rejected
//! before a catalog can serve a request.
//!
//! ```no_run
//! use deploy_strategy_core::{resolve, RuleCatalog, WorkloadProfile};
//! use deploy_strategy_core::profile::{AppType, ComplianceTier, Phase, Scale};
//!
//! let catalog = RuleCatalog::builtin()?;
//! let profile = WorkloadProfile::new(
//!     Phase::MvpPrototype,
//!     AppType::StaticSites,
//!     ComplianceTier::Low,
//!     Scale::Small,
//! );
//! let plan = resolve(&profile, &catalog)?;
//! println!("{}", plan.summary());
//! # Ok::<(), deploy_strategy_core::StrategyError>(())
//! ```

pub mod catalog;
pub mod cost;
pub mod error;
pub mod failover;
pub mod plan;
pub mod profile;
pub mod resolver;
pub mod store;

pub use catalog::source::{CatalogDocument, CatalogFormat};
pub use catalog::{Predicate, PredicateSet, RecommendationBundle, Rule, RuleCatalog, WILDCARD};
pub use cost::{CostBand, CostTable};
pub use error::{ErrorCode, Result, StrategyError};
pub use failover::{FailoverChain, FailoverEntry, FailoverTable, RecoveryObjective};
pub use plan::ResolvedPlan;
pub use profile::{Axis, AxisValue, RawWorkloadProfile, WorkloadProfile};
pub use resolver::{explain, resolve, Candidate, Explanation};
pub use store::{CatalogStore, ReloadOutcome};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
