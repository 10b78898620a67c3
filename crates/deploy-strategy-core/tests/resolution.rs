//! Integration tests for strategy resolution against the built-in and
//! file-backed catalogs

use deploy_strategy_core::profile::{AppType, ComplianceTier, CriticalityTier, Phase, Scale};
use deploy_strategy_core::*;
use proptest::prelude::*;
use std::sync::Arc;

fn builtin() -> RuleCatalog {
    RuleCatalog::builtin().expect("built-in catalog loads")
}

fn arb_profile() -> impl Strategy<Value = WorkloadProfile> {
    (
        prop::sample::select(Phase::ALL),
        prop::sample::select(AppType::ALL),
        prop::sample::select(ComplianceTier::ALL),
        prop::sample::select(Scale::ALL),
        prop::option::of(prop::sample::select(CriticalityTier::ALL)),
    )
        .prop_map(|(phase, app_type, compliance, scale, tier)| {
            let profile = WorkloadProfile::new(phase, app_type, compliance, scale);
            match tier {
                Some(tier) => profile.with_criticality(tier),
                None => profile,
            }
        })
}

#[test]
fn test_static_mvp_lands_on_edge_platform() {
    let catalog = builtin();
    for compliance in ComplianceTier::ALL {
        for scale in Scale::ALL {
            let profile =
                WorkloadProfile::new(Phase::MvpPrototype, AppType::StaticSites, *compliance, *scale);
            let plan = resolve(&profile, &catalog).unwrap();
            assert!(
                ["vercel", "netlify", "s3_cloudfront"].contains(&plan.platform_family()),
                "{{{}}} resolved to {}",
                profile,
                plan.platform_family()
            );
        }
    }
}

#[test]
fn test_regulated_enterprise_is_dedicated_zero_trust() {
    let catalog = builtin();
    let tiers = std::iter::once(None).chain(CriticalityTier::ALL.iter().copied().map(Some));
    let tiers: Vec<Option<CriticalityTier>> = tiers.collect();

    for app_type in AppType::ALL {
        for scale in Scale::ALL {
            for tier in &tiers {
                let mut profile = WorkloadProfile::new(
                    Phase::EnterprisePhase,
                    *app_type,
                    ComplianceTier::High,
                    *scale,
                );
                profile.criticality_tier = *tier;

                let plan = resolve(&profile, &catalog).unwrap();
                assert_eq!(
                    plan.platform_family(),
                    "kubernetes_private_traditional_dedicated",
                    "{{{}}} resolved to rule {}",
                    profile,
                    plan.matched_rule_id
                );
                assert!(plan.bundle.has_control("zero_trust"));
            }
        }
    }
}

#[test]
fn test_unmatched_profile_is_an_error_not_a_default() {
    let catalog = RuleCatalog::from_str(
        r#"
version: "narrow"
platforms: { vercel: edge }
cost_bands:
  - { tier_name: minimal, lower_bound: 0, upper_bound: 50, justification: "free" }
cost_table:
  edge: { small: minimal, medium: minimal, large: minimal, hyperscale: minimal }
rules:
  - id: static-only
    predicates: { app_type: static_sites }
    bundle: { platform_family: vercel, container_base: none, infra_tooling: vercel_cli }
"#,
        CatalogFormat::Yaml,
    )
    .unwrap();

    let profile = WorkloadProfile::new(
        Phase::GrowthPhase,
        AppType::ApiServices,
        ComplianceTier::Standard,
        Scale::Medium,
    );
    let err = resolve(&profile, &catalog).unwrap_err();
    assert_eq!(err.code(), ErrorCode::NoMatch);
    assert!(err.to_string().contains("app_type=api_services"));
}

#[test]
fn test_mission_critical_plan_carries_strictest_chain() {
    let profile = WorkloadProfile::new(
        Phase::EnterprisePhase,
        AppType::Microservices,
        ComplianceTier::Standard,
        Scale::Hyperscale,
    )
    .with_criticality(CriticalityTier::MissionCritical);

    let plan = resolve(&profile, &builtin()).unwrap();
    assert_eq!(plan.matched_rule_id, "enterprise-mission-microservices");
    assert_eq!(plan.specificity, 3);

    let chain = plan.failover_chain.expect("tier requested");
    assert_eq!(chain.primary().rpo.to_string(), "0s");
    assert!(chain.primary().rto <= chain.secondary().rto);
    assert!(chain.secondary().rto <= chain.tertiary().rto);
}

#[test]
fn test_explain_agrees_with_resolve() {
    let catalog = builtin();
    for profile in WorkloadProfile::cross_product().step_by(7) {
        let plan = resolve(&profile, &catalog).unwrap();
        let explanation = explain(&profile, &catalog);

        assert_eq!(explanation.selected_rule_id.as_deref(), Some(plan.matched_rule_id.as_str()));
        let best = explanation.matching().map(|c| c.specificity).max();
        assert_eq!(best, Some(plan.specificity));
    }
}

#[test]
fn test_catalog_formats_are_equivalent() {
    let yaml = builtin();
    let document: CatalogDocument =
        serde_yaml::from_str(deploy_strategy_core::catalog::builtin::DEPLOYMENT_MATRIX).unwrap();

    let json = serde_json::to_string(&document).unwrap();
    let from_json = RuleCatalog::from_str(&json, CatalogFormat::Json).unwrap();

    let toml = toml::to_string(&document).unwrap();
    let from_toml = RuleCatalog::from_str(&toml, CatalogFormat::Toml).unwrap();

    assert_eq!(yaml.fingerprint(), from_json.fingerprint());
    assert_eq!(yaml.fingerprint(), from_toml.fingerprint());
    assert_eq!(yaml.len(), from_toml.len());
}

#[test]
fn test_ambiguous_reload_keeps_serving_old_catalog() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.yaml");
    std::fs::write(
        &path,
        r#"
version: "conflicting"
platforms: { vercel: edge }
cost_bands:
  - { tier_name: minimal, lower_bound: 0, upper_bound: 50, justification: "free" }
cost_table:
  edge: { small: minimal, medium: minimal, large: minimal, hyperscale: minimal }
rules:
  - id: a
    predicates: { phase: mvp_prototype }
    bundle: { platform_family: vercel, container_base: none, infra_tooling: cli }
  - id: b
    predicates: { phase: mvp_prototype, scale: ANY }
    bundle: { platform_family: vercel, container_base: none, infra_tooling: cli }
"#,
    )
    .unwrap();

    let store = Arc::new(CatalogStore::builtin().unwrap());
    let before = store.version();

    let err = store.reload_file(&path).unwrap_err();
    assert_eq!(err.code(), ErrorCode::AmbiguousMatch);
    assert_eq!(err.conflicting_rule_ids(), vec!["a", "b"]);
    assert_eq!(store.version(), before);
    assert_eq!(store.snapshot().label(), "2024.2");
}

proptest! {
    #[test]
    fn prop_resolution_is_deterministic(profile in arb_profile()) {
        let catalog = builtin();
        let first = resolve(&profile, &catalog).unwrap();
        let second = resolve(&profile, &catalog).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_cost_never_drops_when_scale_grows(profile in arb_profile()) {
        let catalog = builtin();
        let plan = resolve(&profile, &catalog).unwrap();
        if let Some(next) = profile.scale.step_up() {
            let bigger = resolve(&profile.with_scale(next), &catalog).unwrap();
            prop_assert!(bigger.cost_band.lower_bound >= plan.cost_band.lower_bound);
        }
    }

    #[test]
    fn prop_cost_never_drops_when_compliance_tightens(profile in arb_profile()) {
        let catalog = builtin();
        let plan = resolve(&profile, &catalog).unwrap();
        if let Some(next) = profile.compliance_tier.step_up() {
            let stricter = resolve(&profile.with_compliance(next), &catalog).unwrap();
            prop_assert!(stricter.cost_band.lower_bound >= plan.cost_band.lower_bound);
        }
    }

    #[test]
    fn prop_winner_has_maximal_specificity(profile in arb_profile()) {
        let catalog = builtin();
        let plan = resolve(&profile, &catalog).unwrap();
        for rule in catalog.rules().iter().filter(|r| r.predicates.matches(&profile)) {
            prop_assert!(rule.specificity <= plan.specificity);
            if rule.specificity == plan.specificity {
                prop_assert!(rule.priority >= catalog.rule(&plan.matched_rule_id).unwrap().priority);
            }
        }
    }
}
