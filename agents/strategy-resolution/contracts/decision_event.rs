//! DecisionEvent for strategy resolutions
//!
//! One event per resolution attempt, successful or not. The inputs hash
//! covers the canonical profile and the catalog version, so two events with
//! the same hash describe the same decision.

use chrono::{DateTime, Utc};
use deploy_strategy_core::{Axis, ErrorCode, ResolvedPlan, StrategyError, WorkloadProfile};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use uuid::Uuid;

/// Audit record of one strategy decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionEvent {
    pub event_id: Uuid,

    pub agent_id: String,

    pub agent_version: String,

    pub decision_type: StrategyDecisionType,

    /// Hash of canonical profile and catalog version
    pub inputs_hash: String,

    pub outputs: DecisionOutputs,

    /// Share of the five axes the winning rule constrains (0.0-1.0)
    pub confidence: f64,

    /// Catalog fingerprint the decision was made against
    pub catalog_version: String,

    /// Execution reference (request ID)
    pub execution_ref: String,

    pub timestamp: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance: Option<PerformanceMetrics>,
}

impl DecisionEvent {
    pub const AGENT_ID: &'static str = "strategy-resolution-agent";

    pub const AGENT_VERSION: &'static str = env!("CARGO_PKG_VERSION");

    /// Event for a resolved plan
    pub fn from_plan(inputs_hash: String, plan: &ResolvedPlan, execution_ref: String) -> Self {
        let confidence = plan.specificity as f64 / Axis::ALL.len() as f64;
        Self::new(
            StrategyDecisionType::StrategyResolution,
            inputs_hash,
            DecisionOutputs::from_plan(plan),
            confidence,
            plan.catalog_version.clone(),
            execution_ref,
        )
    }

    /// Event for a resolution that ended in an error
    pub fn from_error(
        inputs_hash: String,
        error: &StrategyError,
        catalog_version: String,
        execution_ref: String,
    ) -> Self {
        Self::new(
            StrategyDecisionType::StrategyResolution,
            inputs_hash,
            DecisionOutputs::from_error(error),
            0.0,
            catalog_version,
            execution_ref,
        )
    }

    pub fn new(
        decision_type: StrategyDecisionType,
        inputs_hash: String,
        outputs: DecisionOutputs,
        confidence: f64,
        catalog_version: String,
        execution_ref: String,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            agent_id: Self::AGENT_ID.to_string(),
            agent_version: Self::AGENT_VERSION.to_string(),
            decision_type,
            inputs_hash,
            outputs,
            confidence: confidence.clamp(0.0, 1.0),
            catalog_version,
            execution_ref,
            timestamp: Utc::now(),
            metadata: HashMap::new(),
            performance: None,
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn with_performance(mut self, duration_us: u64, rules_evaluated: usize) -> Self {
        self.performance = Some(PerformanceMetrics {
            duration_us,
            rules_evaluated,
        });
        self
    }

    /// Get summary for logging
    pub fn summary(&self) -> String {
        match &self.outputs.matched_rule_id {
            Some(rule_id) => format!(
                "[{}] {} - rule={}, platform={}, confidence={:.2}",
                self.agent_id,
                self.decision_type.as_str(),
                rule_id,
                self.outputs.platform_family.as_deref().unwrap_or("-"),
                self.confidence,
            ),
            None => format!(
                "[{}] {} - error={}",
                self.agent_id,
                self.decision_type.as_str(),
                self.outputs.error_code.map(|c| c.as_str()).unwrap_or("-"),
            ),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.outputs.error_code.is_none()
    }
}

/// Kinds of decision the agent records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyDecisionType {
    StrategyResolution,
    CatalogReload,
}

impl StrategyDecisionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StrategyResolution => "strategy_resolution",
            Self::CatalogReload => "catalog_reload",
        }
    }
}

/// Structured outputs for analytics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecisionOutputs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_rule_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub specificity: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_family: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_band: Option<String>,

    /// Primary failover strategy, when a tier was requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failover_primary: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorCode>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl DecisionOutputs {
    pub fn from_plan(plan: &ResolvedPlan) -> Self {
        Self {
            matched_rule_id: Some(plan.matched_rule_id.clone()),
            specificity: Some(plan.specificity),
            platform_family: Some(plan.bundle.platform_family.clone()),
            cost_band: Some(plan.cost_band.tier_name.clone()),
            failover_primary: plan
                .failover_chain
                .as_ref()
                .map(|chain| chain.primary().strategy_name.clone()),
            error_code: None,
            error_message: None,
        }
    }

    pub fn from_error(error: &StrategyError) -> Self {
        Self {
            error_code: Some(error.code()),
            error_message: Some(error.to_string()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub duration_us: u64,
    pub rules_evaluated: usize,
}

/// Deterministic hash of a profile against a catalog version
///
/// Tokens are written in axis order with an explicit marker for an absent
/// criticality tier, so the hash does not depend on request field order,
/// token case or serializer details.
pub fn compute_inputs_hash(profile: &WorkloadProfile, catalog_version: &str) -> String {
    let mut hasher = Sha256::new();
    for axis in Axis::ALL {
        hasher.update(axis.as_str().as_bytes());
        hasher.update(b"=");
        hasher.update(profile.token(axis).unwrap_or("-").as_bytes());
        hasher.update(b";");
    }
    hasher.update(b"catalog=");
    hasher.update(catalog_version.as_bytes());
    hex::encode(hasher.finalize())
}

/// Hash identifying a catalog swap from one version to another
pub fn compute_reload_hash(previous_version: &str, current_version: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"previous=");
    hasher.update(previous_version.as_bytes());
    hasher.update(b";current=");
    hasher.update(current_version.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use deploy_strategy_core::profile::{AppType, ComplianceTier, CriticalityTier, Phase, Scale};
    use deploy_strategy_core::{resolve, RuleCatalog};

    fn profile() -> WorkloadProfile {
        WorkloadProfile::new(
            Phase::EnterprisePhase,
            AppType::Microservices,
            ComplianceTier::High,
            Scale::Large,
        )
    }

    #[test]
    fn test_inputs_hash_is_stable() {
        let a = compute_inputs_hash(&profile(), "abc");
        let b = compute_inputs_hash(&profile(), "abc");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_inputs_hash_covers_tier_and_catalog() {
        let base = compute_inputs_hash(&profile(), "abc");
        let tiered = compute_inputs_hash(
            &profile().with_criticality(CriticalityTier::Administrative),
            "abc",
        );
        let other_catalog = compute_inputs_hash(&profile(), "abd");
        assert_ne!(base, tiered);
        assert_ne!(base, other_catalog);
    }

    #[test]
    fn test_reload_hash_orders_versions() {
        let forward = compute_reload_hash("aaa", "bbb");
        assert_eq!(forward.len(), 64);
        assert_eq!(forward, compute_reload_hash("aaa", "bbb"));
        assert_ne!(forward, compute_reload_hash("bbb", "aaa"));
        assert_ne!(forward, "bbb");
    }

    #[test]
    fn test_event_from_plan() {
        let catalog = RuleCatalog::builtin().unwrap();
        let p = profile().with_criticality(CriticalityTier::MissionCritical);
        let plan = resolve(&p, &catalog).unwrap();

        let event = DecisionEvent::from_plan(
            compute_inputs_hash(&p, catalog.fingerprint()),
            &plan,
            "req-1".to_string(),
        );

        assert!(event.is_resolved());
        assert_eq!(event.agent_id, DecisionEvent::AGENT_ID);
        assert_eq!(event.catalog_version, catalog.fingerprint());
        assert_eq!(
            event.outputs.matched_rule_id.as_deref(),
            Some("enterprise-mission-regulated")
        );
        assert_eq!(
            event.outputs.failover_primary.as_deref(),
            Some("active_active_multi_region")
        );
        assert!((event.confidence - 0.6).abs() < f64::EPSILON);
    }

    #[test]
    fn test_event_from_error() {
        let err = StrategyError::no_match("no rule matches profile {phase=mvp_prototype}");
        let event = DecisionEvent::from_error("h".into(), &err, "v1".into(), "req-2".into());

        assert!(!event.is_resolved());
        assert_eq!(event.confidence, 0.0);
        assert!(event.summary().contains("NO_MATCH"));

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["outputs"]["error_code"], "NO_MATCH");
        assert_eq!(json["decision_type"], "strategy_resolution");
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn arb_profile() -> impl Strategy<Value = WorkloadProfile> {
            prop::sample::select(WorkloadProfile::cross_product().collect::<Vec<_>>())
        }

        proptest! {
            #[test]
            fn prop_inputs_hash_is_deterministic(
                profile in arb_profile(),
                version in "[0-9a-f]{16}",
            ) {
                prop_assert_eq!(
                    compute_inputs_hash(&profile, &version),
                    compute_inputs_hash(&profile, &version)
                );
            }

            #[test]
            fn prop_inputs_hash_separates_profiles(
                a in arb_profile(),
                b in arb_profile(),
                version in "[0-9a-f]{16}",
            ) {
                let same = compute_inputs_hash(&a, &version) == compute_inputs_hash(&b, &version);
                prop_assert_eq!(same, a == b);
            }
        }
    }
}
