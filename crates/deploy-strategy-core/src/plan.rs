//! Resolved deployment plans

use serde::{Deserialize, Serialize};

use crate::catalog::RecommendationBundle;
use crate::cost::CostBand;
use crate::failover::FailoverChain;

/// The single plan returned for a workload profile
///
/// `matched_rule_id`, `specificity` and `catalog_version` make every
/// decision reproducible from the plan alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPlan {
    #[serde(flatten)]
    pub bundle: RecommendationBundle,

    pub matched_rule_id: String,

    pub specificity: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failover_chain: Option<FailoverChain>,

    pub cost_band: CostBand,

    /// Fingerprint of the catalog snapshot that produced this plan
    pub catalog_version: String,
}

impl ResolvedPlan {
    pub fn platform_family(&self) -> &str {
        &self.bundle.platform_family
    }

    /// One-line summary for logs and CLI output
    pub fn summary(&self) -> String {
        format!(
            "{} via rule '{}' (specificity {}), cost band {}{}",
            self.bundle.platform_family,
            self.matched_rule_id,
            self.specificity,
            self.cost_band.tier_name,
            self.failover_chain
                .as_ref()
                .map(|c| format!(", failover {}", c.primary().strategy_name))
                .unwrap_or_default()
        )
    }
}
