//! Rule catalog
//!
//! A catalog is an ordered arena of rules plus the failover and cost tables
//! the plan annotations are drawn from. It is built only through
//! [`RuleCatalog::from_document`], which validates everything up front and
//! either returns a complete, immutable catalog or an error. A partially
//! valid catalog is never produced.
//!
//! # Load checks
//!
//! 1. Every predicate axis and value belongs to the fact model enumerations.
//! 2. Specificity is computed per rule.
//! 3. No two rules share an identical predicate set.
//! 4. Declaration order is the tie-break priority.
//! 5. Bundles are complete and their platform families are costed.
//! 6. Failover and cost tables pass their own checks.
//! 7. Across the full profile cross-product, cost never decreases when scale
//!    or compliance steps up.

pub mod builtin;
pub mod source;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use tracing::info;

use crate::cost::CostTable;
use crate::error::{Result, StrategyError};
use crate::failover::{FailoverChain, FailoverTable};
use crate::profile::{
    AppType, Axis, AxisValue, ComplianceTier, CriticalityTier, Phase, Scale, WorkloadProfile,
};
use crate::resolver;
use source::{CatalogDocument, CatalogFormat, RuleRecord};

/// Wildcard token accepted in predicate position
pub const WILDCARD: &str = "ANY";

/// A predicate on a single axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Predicate<T> {
    Wildcard,
    Concrete(T),
}

impl<T: AxisValue> Predicate<T> {
    pub fn matches(&self, value: T) -> bool {
        match self {
            Predicate::Wildcard => true,
            Predicate::Concrete(expected) => *expected == value,
        }
    }

    /// A concrete predicate never matches an absent value
    pub fn matches_optional(&self, value: Option<T>) -> bool {
        match (self, value) {
            (Predicate::Wildcard, _) => true,
            (Predicate::Concrete(expected), Some(actual)) => *expected == actual,
            (Predicate::Concrete(_), None) => false,
        }
    }

    pub fn is_concrete(&self) -> bool {
        matches!(self, Predicate::Concrete(_))
    }

    pub fn token(&self) -> &'static str {
        match self {
            Predicate::Wildcard => WILDCARD,
            Predicate::Concrete(value) => value.as_str(),
        }
    }

    /// Parse `ANY` or a concrete token
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.trim().eq_ignore_ascii_case(WILDCARD) {
            Ok(Predicate::Wildcard)
        } else {
            T::parse_token(raw).map(Predicate::Concrete)
        }
    }
}

impl<T> Default for Predicate<T> {
    fn default() -> Self {
        Predicate::Wildcard
    }
}

impl<T: AxisValue> Serialize for Predicate<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.token())
    }
}

impl<'de, T: AxisValue> Deserialize<'de> for Predicate<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// One predicate per axis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PredicateSet {
    #[serde(default)]
    pub phase: Predicate<Phase>,
    #[serde(default)]
    pub app_type: Predicate<AppType>,
    #[serde(default)]
    pub compliance_tier: Predicate<ComplianceTier>,
    #[serde(default)]
    pub scale: Predicate<Scale>,
    #[serde(default)]
    pub criticality_tier: Predicate<CriticalityTier>,
}

impl PredicateSet {
    /// Count of non-wildcard predicates
    pub fn specificity(&self) -> usize {
        [
            self.phase.is_concrete(),
            self.app_type.is_concrete(),
            self.compliance_tier.is_concrete(),
            self.scale.is_concrete(),
            self.criticality_tier.is_concrete(),
        ]
        .iter()
        .filter(|concrete| **concrete)
        .count()
    }

    pub fn matches(&self, profile: &WorkloadProfile) -> bool {
        self.mismatched_axes(profile).is_empty()
    }

    /// Axes whose predicate rejects the profile
    pub fn mismatched_axes(&self, profile: &WorkloadProfile) -> Vec<Axis> {
        let checks = [
            (Axis::Phase, self.phase.matches(profile.phase)),
            (Axis::AppType, self.app_type.matches(profile.app_type)),
            (
                Axis::ComplianceTier,
                self.compliance_tier.matches(profile.compliance_tier),
            ),
            (Axis::Scale, self.scale.matches(profile.scale)),
            (
                Axis::CriticalityTier,
                self.criticality_tier
                    .matches_optional(profile.criticality_tier),
            ),
        ];

        checks
            .into_iter()
            .filter(|(_, matched)| !matched)
            .map(|(axis, _)| axis)
            .collect()
    }

    /// Token for an axis, `ANY` for wildcards
    pub fn token(&self, axis: Axis) -> &'static str {
        match axis {
            Axis::Phase => self.phase.token(),
            Axis::AppType => self.app_type.token(),
            Axis::ComplianceTier => self.compliance_tier.token(),
            Axis::Scale => self.scale.token(),
            Axis::CriticalityTier => self.criticality_tier.token(),
        }
    }

    fn from_record(record: &RuleRecord) -> Result<Self> {
        let mut set = PredicateSet::default();
        let mut seen = BTreeSet::new();

        for (name, raw) in &record.predicates {
            let axis = Axis::from_name(name).ok_or_else(|| {
                StrategyError::catalog_load(format!(
                    "rule '{}' names unknown axis '{}' (allowed: {})",
                    record.id,
                    name,
                    Axis::ALL.map(|a| a.as_str()).join(", ")
                ))
            })?;
            if !seen.insert(axis) {
                return Err(StrategyError::catalog_load(format!(
                    "rule '{}' constrains axis '{}' more than once",
                    record.id, axis
                )));
            }

            let unknown = |_| {
                StrategyError::catalog_load(format!(
                    "rule '{}' has unknown value '{}' for axis '{}' (allowed: {}, {})",
                    record.id,
                    raw,
                    axis,
                    WILDCARD,
                    axis.allowed_tokens().join(", ")
                ))
            };

            match axis {
                Axis::Phase => set.phase = Predicate::parse(raw).map_err(unknown)?,
                Axis::AppType => set.app_type = Predicate::parse(raw).map_err(unknown)?,
                Axis::ComplianceTier => {
                    set.compliance_tier = Predicate::parse(raw).map_err(unknown)?
                }
                Axis::Scale => set.scale = Predicate::parse(raw).map_err(unknown)?,
                Axis::CriticalityTier => {
                    set.criticality_tier = Predicate::parse(raw).map_err(unknown)?
                }
            }
        }

        Ok(set)
    }
}

/// What a matching rule recommends
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationBundle {
    pub platform_family: String,
    pub container_base: String,
    pub infra_tooling: String,
    #[serde(default)]
    pub security_controls: BTreeSet<String>,
    #[serde(default)]
    pub rationale: String,
}

impl RecommendationBundle {
    pub fn has_control(&self, control: &str) -> bool {
        self.security_controls.contains(control)
    }

    fn check_complete(&self, rule_id: &str) -> Result<()> {
        let fields = [
            ("platform_family", &self.platform_family),
            ("container_base", &self.container_base),
            ("infra_tooling", &self.infra_tooling),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(StrategyError::catalog_load(format!(
                    "rule '{}' bundle has an empty {}",
                    rule_id, name
                )));
            }
        }
        Ok(())
    }
}

/// A validated catalog rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rule {
    pub id: String,
    pub predicates: PredicateSet,
    pub bundle: RecommendationBundle,
    /// Declaration index; lower wins ties
    pub priority: usize,
    pub specificity: usize,
}

/// Immutable, fully validated rule catalog
#[derive(Debug, Clone)]
pub struct RuleCatalog {
    label: String,
    fingerprint: String,
    rules: Vec<Rule>,
    index: HashMap<String, usize>,
    failover: FailoverTable,
    costs: CostTable,
}

impl RuleCatalog {
    /// Validate a parsed document into a catalog
    pub fn from_document(document: CatalogDocument) -> Result<Self> {
        let fingerprint = document.fingerprint();

        let mut rules = Vec::with_capacity(document.rules.len());
        let mut index = HashMap::with_capacity(document.rules.len());

        for (position, record) in document.rules.iter().enumerate() {
            if record.id.trim().is_empty() {
                return Err(StrategyError::catalog_load(format!(
                    "rule #{} has an empty id",
                    position
                )));
            }
            if index.insert(record.id.clone(), position).is_some() {
                return Err(StrategyError::catalog_load(format!(
                    "rule id '{}' declared more than once",
                    record.id
                )));
            }
            if let Some(priority) = record.priority {
                if priority != position {
                    return Err(StrategyError::catalog_load(format!(
                        "rule '{}' declares priority {} but is declared at position {}",
                        record.id, priority, position
                    )));
                }
            }

            record.bundle.check_complete(&record.id)?;
            if !document.platforms.contains_key(&record.bundle.platform_family) {
                return Err(StrategyError::catalog_load(format!(
                    "rule '{}' recommends platform '{}' which is not listed under platforms",
                    record.id, record.bundle.platform_family
                )));
            }

            let predicates = PredicateSet::from_record(record)?;
            rules.push(Rule {
                id: record.id.clone(),
                predicates,
                bundle: record.bundle.clone(),
                priority: position,
                specificity: predicates.specificity(),
            });
        }

        check_ambiguity(&rules)?;

        let failover = FailoverTable::from_records(&document.failover)?;
        let costs = CostTable::from_records(
            &document.cost_bands,
            &document.platforms,
            &document.cost_table,
        )?;

        let catalog = Self {
            label: document.version,
            fingerprint,
            rules,
            index,
            failover,
            costs,
        };
        catalog.check_cross_product()?;

        info!(
            catalog_version = %catalog.fingerprint,
            label = %catalog.label,
            rules = catalog.rules.len(),
            failover_tiers = catalog.failover.len(),
            "Rule catalog loaded"
        );

        Ok(catalog)
    }

    /// Parse and validate catalog text
    pub fn from_str(content: &str, format: CatalogFormat) -> Result<Self> {
        Self::from_document(CatalogDocument::parse(content, format)?)
    }

    /// Read, parse and validate a catalog file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_document(CatalogDocument::from_file(path)?)
    }

    /// The embedded deployment decision matrix
    pub fn builtin() -> Result<Self> {
        Self::from_str(builtin::DEPLOYMENT_MATRIX, CatalogFormat::Yaml)
    }

    /// Rules in declaration order
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn rule(&self, id: &str) -> Option<&Rule> {
        self.index.get(id).map(|&i| &self.rules[i])
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Author-chosen label from the document
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Content fingerprint identifying this catalog version
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn failover(&self) -> &FailoverTable {
        &self.failover
    }

    pub fn costs(&self) -> &CostTable {
        &self.costs
    }

    pub fn plan_failover(&self, tier: CriticalityTier) -> Result<FailoverChain> {
        self.failover.plan(tier)
    }

    fn check_cross_product(&self) -> Result<()> {
        let mut costed: HashMap<WorkloadProfile, (usize, &Rule)> = HashMap::new();
        for profile in WorkloadProfile::cross_product() {
            let Some(rule) = resolver::select_rule(&profile, &self.rules) else {
                continue;
            };
            if let Some(band) = self.costs.rank(&rule.bundle, profile.scale) {
                costed.insert(profile, (band, rule));
            }
        }

        // Each costed profile is compared with the next costed profile up
        // each ordered axis, skipping uncovered ones, so the chain holds
        // across coverage gaps.
        let mut violations = Vec::new();
        for profile in WorkloadProfile::cross_product() {
            let Some(&(band, rule)) = costed.get(&profile) else {
                continue;
            };

            let by_scale = Scale::ALL[profile.scale.rank() + 1..]
                .iter()
                .map(|&s| profile.with_scale(s))
                .find(|p| costed.contains_key(p));
            let by_compliance = ComplianceTier::ALL[profile.compliance_tier.rank() + 1..]
                .iter()
                .map(|&c| profile.with_compliance(c))
                .find(|p| costed.contains_key(p));

            for neighbour in [by_scale, by_compliance].into_iter().flatten() {
                let Some(&(next_band, next_rule)) = costed.get(&neighbour) else {
                    continue;
                };
                if next_band < band {
                    violations.push(format!(
                        "cost band drops from '{}' (rule '{}') to '{}' (rule '{}') going from {{{}}} to {{{}}}",
                        self.costs.bands()[band].tier_name,
                        rule.id,
                        self.costs.bands()[next_band].tier_name,
                        next_rule.id,
                        profile,
                        neighbour
                    ));
                }
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            violations.dedup();
            Err(StrategyError::catalog_load(format!(
                "{} monotonicity violation(s): {}",
                violations.len(),
                violations.join("; ")
            )))
        }
    }
}

/// Reject catalogs where two rules share an identical predicate set
fn check_ambiguity(rules: &[Rule]) -> Result<()> {
    let mut groups: HashMap<PredicateSet, Vec<usize>> = HashMap::new();
    for (i, rule) in rules.iter().enumerate() {
        groups.entry(rule.predicates).or_default().push(i);
    }

    let mut conflicts: Vec<Vec<usize>> = groups
        .into_values()
        .filter(|members| members.len() > 1)
        .collect();

    if conflicts.is_empty() {
        return Ok(());
    }

    // Report groups in declaration order so the error is deterministic
    conflicts.sort();
    Err(StrategyError::AmbiguousMatch {
        conflicts: conflicts
            .into_iter()
            .map(|members| members.into_iter().map(|i| rules[i].id.clone()).collect())
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLES: &str = r#"
version: "test"
platforms:
  vercel: edge_static
  netlify: edge_static
  fargate: containers
cost_bands:
  - { tier_name: minimal, lower_bound: 0, upper_bound: 50, justification: "free tiers" }
  - { tier_name: low, lower_bound: 50, upper_bound: 500, justification: "small fleet" }
cost_table:
  edge_static: { small: minimal, medium: minimal, large: low, hyperscale: low }
  containers: { small: low, medium: low, large: low, hyperscale: low }
failover:
  mission_critical:
    - { strategy_name: active_active, rto: 1m, rpo: 0s }
    - { strategy_name: warm_standby, rto: 15m, rpo: 5m }
    - { strategy_name: backup_restore, rto: 4h, rpo: 1h }
"#;

    fn catalog_with_rules(rules: &str) -> Result<RuleCatalog> {
        RuleCatalog::from_str(&format!("{}{}", TABLES, rules), CatalogFormat::Yaml)
    }

    const BUNDLE: &str =
        "{ platform_family: vercel, container_base: none, infra_tooling: vercel_cli }";

    #[test]
    fn test_predicate_parse() {
        assert_eq!(Predicate::<Phase>::parse("ANY").unwrap(), Predicate::Wildcard);
        assert_eq!(Predicate::<Phase>::parse("any").unwrap(), Predicate::Wildcard);
        assert_eq!(
            Predicate::<Phase>::parse("growth_phase").unwrap(),
            Predicate::Concrete(Phase::GrowthPhase)
        );
        assert!(Predicate::<Phase>::parse("*").is_err());
    }

    #[test]
    fn test_specificity_counts_concrete_predicates() {
        let set = PredicateSet {
            phase: Predicate::Concrete(Phase::MvpPrototype),
            app_type: Predicate::Concrete(AppType::StaticSites),
            ..Default::default()
        };
        assert_eq!(set.specificity(), 2);
        assert_eq!(PredicateSet::default().specificity(), 0);
    }

    #[test]
    fn test_concrete_criticality_needs_a_tier() {
        let set = PredicateSet {
            criticality_tier: Predicate::Concrete(CriticalityTier::MissionCritical),
            ..Default::default()
        };
        let profile =
            WorkloadProfile::new(Phase::GrowthPhase, AppType::ApiServices, ComplianceTier::Low, Scale::Small);
        assert_eq!(set.mismatched_axes(&profile), vec![Axis::CriticalityTier]);
        assert!(set.matches(&profile.with_criticality(CriticalityTier::MissionCritical)));
    }

    #[test]
    fn test_load_assigns_priority_and_specificity() {
        let catalog = catalog_with_rules(&format!(
            r#"
rules:
  - id: broad
    predicates: {{ phase: mvp_prototype }}
    bundle: {BUNDLE}
  - id: narrow
    predicates: {{ phase: mvp_prototype, app_type: static_sites, scale: ANY }}
    bundle: {BUNDLE}
"#
        ))
        .unwrap();

        assert_eq!(catalog.len(), 2);
        let narrow = catalog.rule("narrow").unwrap();
        assert_eq!(narrow.priority, 1);
        assert_eq!(narrow.specificity, 2);
        assert_eq!(catalog.rule("broad").unwrap().specificity, 1);
        assert_eq!(catalog.fingerprint().len(), 16);
    }

    #[test]
    fn test_duplicate_predicate_sets_are_ambiguous() {
        let err = catalog_with_rules(&format!(
            r#"
rules:
  - id: first
    predicates: {{ phase: mvp_prototype, app_type: static_sites }}
    bundle: {BUNDLE}
  - id: unrelated
    predicates: {{ phase: growth_phase }}
    bundle: {BUNDLE}
  - id: second
    predicates: {{ app_type: static_sites, phase: mvp_prototype, scale: ANY }}
    bundle: {BUNDLE}
"#
        ))
        .unwrap_err();

        match err {
            StrategyError::AmbiguousMatch { conflicts } => {
                assert_eq!(conflicts, vec![vec!["first".to_string(), "second".to_string()]]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_predicate_value_rejected() {
        let err = catalog_with_rules(&format!(
            r#"
rules:
  - id: bad
    predicates: {{ phase: beta }}
    bundle: {BUNDLE}
"#
        ))
        .unwrap_err();

        assert!(matches!(err, StrategyError::CatalogLoad { .. }));
        let message = err.to_string();
        assert!(message.contains("rule 'bad'"));
        assert!(message.contains("'beta'"));
        assert!(message.contains("mvp_prototype"));
    }

    #[test]
    fn test_unknown_axis_rejected() {
        let err = catalog_with_rules(&format!(
            r#"
rules:
  - id: bad
    predicates: {{ region: eu }}
    bundle: {BUNDLE}
"#
        ))
        .unwrap_err();
        assert!(err.to_string().contains("unknown axis 'region'"));
    }

    #[test]
    fn test_priority_must_follow_declaration_order() {
        let err = catalog_with_rules(&format!(
            r#"
rules:
  - id: a
    predicates: {{ phase: mvp_prototype }}
    bundle: {BUNDLE}
    priority: 1
"#
        ))
        .unwrap_err();
        assert!(err.to_string().contains("declares priority 1"));
    }

    #[test]
    fn test_duplicate_rule_id_rejected() {
        let err = catalog_with_rules(&format!(
            r#"
rules:
  - id: a
    predicates: {{ phase: mvp_prototype }}
    bundle: {BUNDLE}
  - id: a
    predicates: {{ phase: growth_phase }}
    bundle: {BUNDLE}
"#
        ))
        .unwrap_err();
        assert!(err.to_string().contains("declared more than once"));
    }

    #[test]
    fn test_uncosted_platform_rejected() {
        let err = catalog_with_rules(
            r#"
rules:
  - id: a
    predicates: { phase: mvp_prototype }
    bundle: { platform_family: heroku, container_base: none, infra_tooling: cli }
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("platform 'heroku'"));
    }

    #[test]
    fn test_cost_decrease_across_compliance_rejected() {
        // containers is "low" everywhere; edge_static is "minimal" at small scale
        let err = catalog_with_rules(
            r#"
rules:
  - id: regular
    predicates: { phase: mvp_prototype }
    bundle: { platform_family: fargate, container_base: distroless, infra_tooling: terraform }
  - id: regulated
    predicates: { phase: mvp_prototype, compliance_tier: high_compliance }
    bundle: { platform_family: vercel, container_base: none, infra_tooling: vercel_cli }
"#,
        )
        .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("monotonicity violation"));
        assert!(message.contains("rule 'regulated'"));
    }

    #[test]
    fn test_cost_decrease_across_coverage_gap_rejected() {
        // No rule covers medium scale, so small and large are only
        // comparable by skipping over it.
        let err = RuleCatalog::from_str(
            r#"
version: "gapped"
platforms: { vercel: edge, dedicated: metal }
cost_bands:
  - { tier_name: minimal, lower_bound: 0, upper_bound: 50, justification: "free" }
  - { tier_name: premium, lower_bound: 50, upper_bound: 5000, justification: "owned hardware" }
cost_table:
  edge: { small: minimal, medium: minimal, large: minimal, hyperscale: minimal }
  metal: { small: premium, medium: premium, large: premium, hyperscale: premium }
rules:
  - id: small-dedicated
    predicates: { scale: small }
    bundle: { platform_family: dedicated, container_base: debian, infra_tooling: ansible }
  - id: large-edge
    predicates: { scale: large }
    bundle: { platform_family: vercel, container_base: none, infra_tooling: vercel_cli }
"#,
            CatalogFormat::Yaml,
        )
        .unwrap_err();

        assert_eq!(err.code(), crate::error::ErrorCode::CatalogLoadError);
        let message = err.to_string();
        assert!(message.contains("rule 'small-dedicated'"));
        assert!(message.contains("rule 'large-edge'"));
    }
}
