//! Strategy Resolution Agent Contracts
//!
//! Request and response shapes shared by the HTTP surface, the CLI and the
//! remote client.

mod decision_event;

pub use decision_event::*;

use chrono::{DateTime, Utc};
use deploy_strategy_core::{Explanation, RawWorkloadProfile, ResolvedPlan, WorkloadProfile};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Validated input for a single resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionInput {
    /// Unique request identifier
    pub request_id: Uuid,

    pub profile: WorkloadProfile,

    /// Free-form caller context, echoed into the decision event metadata
    #[serde(default)]
    pub context: HashMap<String, String>,

    pub requested_at: DateTime<Utc>,

    pub requested_by: String,
}

/// Output of a successful resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionOutput {
    /// Request ID correlation
    pub request_id: Uuid,

    pub plan: ResolvedPlan,

    /// Decision event recorded for this resolution
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision_event_id: Option<Uuid>,

    pub completed_at: DateTime<Utc>,

    /// Duration in microseconds
    pub duration_us: u64,
}

/// Body of `POST /api/v1/strategy/resolve` and `/explain`
///
/// Profile fields sit at the top level next to the optional requester.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolveRequest {
    #[serde(flatten)]
    pub profile: RawWorkloadProfile,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_by: Option<String>,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, String>,
}

impl ResolveRequest {
    pub fn new(profile: RawWorkloadProfile) -> Self {
        Self {
            profile,
            ..Default::default()
        }
    }

    pub fn with_requested_by(mut self, requested_by: impl Into<String>) -> Self {
        self.requested_by = Some(requested_by.into());
        self
    }
}

/// Explanation wrapped with its request id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplainOutput {
    pub request_id: Uuid,
    #[serde(flatten)]
    pub explanation: Explanation,
}

/// Active catalog summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogInfo {
    /// Content fingerprint
    pub version: String,
    /// Author-chosen label
    pub label: String,
    pub rule_count: usize,
    pub failover_tiers: Vec<String>,
    pub cost_bands: Vec<String>,
    /// Successful reloads since startup
    pub generation: u64,
    /// File the catalog was loaded from; absent for the built-in matrix
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}
