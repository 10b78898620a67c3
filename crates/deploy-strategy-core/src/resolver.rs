//! Specificity resolver
//!
//! A rule matches a profile when every one of its predicates is either the
//! wildcard or equal to the profile's value on that axis. Among matching
//! rules only those with maximal specificity are eligible; if several
//! remain, the one declared first in the catalog wins. No other precedence
//! exists.
//!
//! Resolution is pure and synchronous: no I/O, no locking, no allocation
//! beyond the returned plan.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{Rule, RuleCatalog};
use crate::error::{Result, StrategyError};
use crate::plan::ResolvedPlan;
use crate::profile::{Axis, WorkloadProfile};

/// Pick the winning rule: highest specificity, then lowest priority
pub(crate) fn select_rule<'a>(profile: &WorkloadProfile, rules: &'a [Rule]) -> Option<&'a Rule> {
    let mut best: Option<&Rule> = None;

    // Rules are stored in declaration order, so only a strictly more
    // specific match may replace the current best.
    for rule in rules {
        if !rule.predicates.matches(profile) {
            continue;
        }
        match best {
            Some(current) if current.specificity >= rule.specificity => {}
            _ => best = Some(rule),
        }
    }

    best
}

/// Resolve a profile against a catalog into a single plan
pub fn resolve(profile: &WorkloadProfile, catalog: &RuleCatalog) -> Result<ResolvedPlan> {
    let rule = select_rule(profile, catalog.rules()).ok_or_else(|| {
        StrategyError::no_match(format!("no rule matches profile {{{}}}", profile))
    })?;

    let failover_chain = match profile.criticality_tier {
        Some(tier) => Some(catalog.plan_failover(tier)?),
        None => None,
    };

    let cost_band = catalog.costs().estimate(&rule.bundle, profile.scale)?;

    debug!(
        rule_id = %rule.id,
        specificity = rule.specificity,
        catalog_version = %catalog.fingerprint(),
        platform = %rule.bundle.platform_family,
        cost_band = %cost_band.tier_name,
        "Resolved workload profile"
    );

    Ok(ResolvedPlan {
        bundle: rule.bundle.clone(),
        matched_rule_id: rule.id.clone(),
        specificity: rule.specificity,
        failover_chain,
        cost_band,
        catalog_version: catalog.fingerprint().to_string(),
    })
}

/// How one rule fared against a profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub rule_id: String,
    pub priority: usize,
    pub specificity: usize,
    pub matched: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mismatched_axes: Vec<Axis>,
}

/// Audit trail of a resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explanation {
    pub profile: WorkloadProfile,
    pub catalog_version: String,
    /// Every rule in declaration order
    pub candidates: Vec<Candidate>,
    pub selected_rule_id: Option<String>,
    /// Matching rules that tied with the winner and lost on declaration order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shadowed_by_order: Vec<String>,
}

impl Explanation {
    pub fn matching(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates.iter().filter(|c| c.matched)
    }
}

/// Evaluate every rule against a profile without building a plan
pub fn explain(profile: &WorkloadProfile, catalog: &RuleCatalog) -> Explanation {
    let candidates: Vec<Candidate> = catalog
        .rules()
        .iter()
        .map(|rule| {
            let mismatched_axes = rule.predicates.mismatched_axes(profile);
            Candidate {
                rule_id: rule.id.clone(),
                priority: rule.priority,
                specificity: rule.specificity,
                matched: mismatched_axes.is_empty(),
                mismatched_axes,
            }
        })
        .collect();

    let selected = select_rule(profile, catalog.rules());
    let shadowed_by_order = match selected {
        Some(winner) => candidates
            .iter()
            .filter(|c| {
                c.matched && c.specificity == winner.specificity && c.rule_id != winner.id
            })
            .map(|c| c.rule_id.clone())
            .collect(),
        None => Vec::new(),
    };

    Explanation {
        profile: *profile,
        catalog_version: catalog.fingerprint().to_string(),
        candidates,
        selected_rule_id: selected.map(|r| r.id.clone()),
        shadowed_by_order,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::source::CatalogFormat;
    use crate::profile::{AppType, ComplianceTier, CriticalityTier, Phase, Scale};

    const CATALOG: &str = r#"
version: "resolver-test"
platforms: { vercel: edge, netlify: edge, fargate: containers }
cost_bands:
  - { tier_name: minimal, lower_bound: 0, upper_bound: 50, justification: "free" }
  - { tier_name: low, lower_bound: 50, upper_bound: 500, justification: "small" }
cost_table:
  edge: { small: minimal, medium: minimal, large: minimal, hyperscale: low }
  containers: { small: minimal, medium: low, large: low, hyperscale: low }
failover:
  business_critical:
    - { strategy_name: warm_standby, rto: 15m, rpo: 5m }
    - { strategy_name: pilot_light, rto: 1h, rpo: 15m }
    - { strategy_name: backup_restore, rto: 4h, rpo: 1h }
rules:
  - id: mvp-any
    predicates: { phase: mvp_prototype, app_type: ANY }
    bundle: { platform_family: netlify, container_base: none, infra_tooling: netlify_cli }
  - id: mvp-static
    predicates: { phase: mvp_prototype, app_type: static_sites }
    bundle: { platform_family: vercel, container_base: none, infra_tooling: vercel_cli }
  - id: small-scale
    predicates: { phase: mvp_prototype, scale: small }
    bundle: { platform_family: fargate, container_base: distroless, infra_tooling: terraform }
"#;

    fn catalog() -> RuleCatalog {
        RuleCatalog::from_str(CATALOG, CatalogFormat::Yaml).unwrap()
    }

    fn profile(phase: Phase, app: AppType, scale: Scale) -> WorkloadProfile {
        WorkloadProfile::new(phase, app, ComplianceTier::Low, scale)
    }

    #[test]
    fn test_more_specific_rule_wins_regardless_of_order() {
        let plan = resolve(
            &profile(Phase::MvpPrototype, AppType::StaticSites, Scale::Large),
            &catalog(),
        )
        .unwrap();
        assert_eq!(plan.matched_rule_id, "mvp-static");
        assert_eq!(plan.specificity, 2);
        assert_eq!(plan.bundle.platform_family, "vercel");
    }

    #[test]
    fn test_tie_goes_to_first_declared() {
        // mvp-static and small-scale both have specificity 2 and both match
        let explanation = explain(
            &profile(Phase::MvpPrototype, AppType::StaticSites, Scale::Small),
            &catalog(),
        );
        assert_eq!(explanation.selected_rule_id.as_deref(), Some("mvp-static"));
        assert_eq!(explanation.shadowed_by_order, vec!["small-scale".to_string()]);
    }

    #[test]
    fn test_wildcard_rule_used_when_nothing_narrower_matches() {
        let plan = resolve(
            &profile(Phase::MvpPrototype, AppType::Microservices, Scale::Medium),
            &catalog(),
        )
        .unwrap();
        assert_eq!(plan.matched_rule_id, "mvp-any");
        assert_eq!(plan.specificity, 1);
        assert_eq!(plan.cost_band.tier_name, "minimal");
        assert!(plan.failover_chain.is_none());
    }

    #[test]
    fn test_no_match_names_profile() {
        let err = resolve(
            &profile(Phase::EnterprisePhase, AppType::StaticSites, Scale::Small),
            &catalog(),
        )
        .unwrap_err();

        match err {
            StrategyError::NoMatch { subject } => {
                assert!(subject.contains("phase=enterprise_phase"));
                assert!(subject.contains("app_type=static_sites"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_failover_attached_when_tier_present() {
        let p = profile(Phase::MvpPrototype, AppType::ApiServices, Scale::Medium)
            .with_criticality(CriticalityTier::BusinessCritical);
        let plan = resolve(&p, &catalog()).unwrap();
        let chain = plan.failover_chain.unwrap();
        assert_eq!(chain.primary().strategy_name, "warm_standby");
    }

    #[test]
    fn test_missing_failover_tier_is_no_match() {
        let p = profile(Phase::MvpPrototype, AppType::ApiServices, Scale::Medium)
            .with_criticality(CriticalityTier::MissionCritical);
        let err = resolve(&p, &catalog()).unwrap_err();
        assert!(matches!(err, StrategyError::NoMatch { ref subject } if subject.contains("mission_critical")));
    }

    #[test]
    fn test_explain_lists_mismatched_axes() {
        let explanation = explain(
            &profile(Phase::GrowthPhase, AppType::StaticSites, Scale::Large),
            &catalog(),
        );
        assert!(explanation.selected_rule_id.is_none());
        assert_eq!(explanation.matching().count(), 0);

        let small = &explanation.candidates[2];
        assert_eq!(small.rule_id, "small-scale");
        assert_eq!(small.mismatched_axes, vec![Axis::Phase, Axis::Scale]);
    }
}
