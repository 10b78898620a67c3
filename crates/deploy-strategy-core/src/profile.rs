//! Workload fact model
//!
//! A [`WorkloadProfile`] describes a workload along five fixed axes. Every
//! axis is a closed enumeration; raw input is validated token by token and
//! either yields a complete profile or a [`StrategyError::Validation`] naming
//! the offending axis and its allowed set.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use crate::error::{Result, StrategyError};

/// The axes a workload is described along
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Phase,
    AppType,
    ComplianceTier,
    Scale,
    CriticalityTier,
}

impl Axis {
    pub const ALL: [Axis; 5] = [
        Axis::Phase,
        Axis::AppType,
        Axis::ComplianceTier,
        Axis::Scale,
        Axis::CriticalityTier,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Phase => "phase",
            Self::AppType => "app_type",
            Self::ComplianceTier => "compliance_tier",
            Self::Scale => "scale",
            Self::CriticalityTier => "criticality_tier",
        }
    }

    /// Allowed tokens for this axis, in declaration order
    pub fn allowed_tokens(&self) -> Vec<&'static str> {
        match self {
            Self::Phase => Phase::tokens(),
            Self::AppType => AppType::tokens(),
            Self::ComplianceTier => ComplianceTier::tokens(),
            Self::Scale => Scale::tokens(),
            Self::CriticalityTier => CriticalityTier::tokens(),
        }
    }

    /// Resolve an axis name as written in a request or catalog record
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "phase" => Some(Self::Phase),
            "app_type" | "appType" => Some(Self::AppType),
            "compliance_tier" | "complianceTier" => Some(Self::ComplianceTier),
            "scale" => Some(Self::Scale),
            "criticality_tier" | "criticalityTier" => Some(Self::CriticalityTier),
            _ => None,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value drawn from one axis' closed enumeration
pub trait AxisValue:
    Copy + Eq + Ord + Hash + fmt::Debug + Send + Sync + Sized + 'static
{
    /// Axis this enumeration belongs to
    const AXIS: Axis;

    /// Every value, ordered from least to most demanding
    const ALL: &'static [Self];

    /// Wire token
    fn as_str(&self) -> &'static str;

    fn tokens() -> Vec<&'static str> {
        Self::ALL.iter().map(|v| v.as_str()).collect()
    }

    /// Position within [`AxisValue::ALL`]
    fn rank(&self) -> usize {
        Self::ALL.iter().position(|v| v == self).unwrap_or(0)
    }

    /// Next value up the enumeration, if any
    fn step_up(&self) -> Option<Self> {
        Self::ALL.get(self.rank() + 1).copied()
    }

    /// Parse a token, case-insensitively and ignoring surrounding whitespace
    fn parse_token(raw: &str) -> Result<Self> {
        let token = raw.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|v| v.as_str() == token)
            .ok_or_else(|| StrategyError::validation(Self::AXIS.as_str(), raw, &Self::tokens()))
    }
}

/// Maturity phase of the product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    MvpPrototype,
    GrowthPhase,
    EnterprisePhase,
}

impl AxisValue for Phase {
    const AXIS: Axis = Axis::Phase;
    const ALL: &'static [Self] = &[Self::MvpPrototype, Self::GrowthPhase, Self::EnterprisePhase];

    fn as_str(&self) -> &'static str {
        match self {
            Self::MvpPrototype => "mvp_prototype",
            Self::GrowthPhase => "growth_phase",
            Self::EnterprisePhase => "enterprise_phase",
        }
    }
}

/// Shape of the application being deployed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppType {
    StaticSites,
    WebApplications,
    ApiServices,
    Microservices,
    DataIntensive,
}

impl AxisValue for AppType {
    const AXIS: Axis = Axis::AppType;
    const ALL: &'static [Self] = &[
        Self::StaticSites,
        Self::WebApplications,
        Self::ApiServices,
        Self::Microservices,
        Self::DataIntensive,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            Self::StaticSites => "static_sites",
            Self::WebApplications => "web_applications",
            Self::ApiServices => "api_services",
            Self::Microservices => "microservices",
            Self::DataIntensive => "data_intensive",
        }
    }
}

/// Regulatory burden the workload carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComplianceTier {
    #[serde(rename = "low_compliance")]
    Low,
    #[serde(rename = "standard_compliance")]
    Standard,
    #[serde(rename = "high_compliance")]
    High,
}

impl AxisValue for ComplianceTier {
    const AXIS: Axis = Axis::ComplianceTier;
    const ALL: &'static [Self] = &[Self::Low, Self::Standard, Self::High];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low_compliance",
            Self::Standard => "standard_compliance",
            Self::High => "high_compliance",
        }
    }
}

/// Traffic and footprint indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scale {
    Small,
    Medium,
    Large,
    Hyperscale,
}

impl AxisValue for Scale {
    const AXIS: Axis = Axis::Scale;
    const ALL: &'static [Self] = &[Self::Small, Self::Medium, Self::Large, Self::Hyperscale];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
            Self::Hyperscale => "hyperscale",
        }
    }
}

/// Required failover rigor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriticalityTier {
    MissionCritical,
    BusinessCritical,
    BusinessOperational,
    Administrative,
}

impl AxisValue for CriticalityTier {
    const AXIS: Axis = Axis::CriticalityTier;
    const ALL: &'static [Self] = &[
        Self::MissionCritical,
        Self::BusinessCritical,
        Self::BusinessOperational,
        Self::Administrative,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            Self::MissionCritical => "mission_critical",
            Self::BusinessCritical => "business_critical",
            Self::BusinessOperational => "business_operational",
            Self::Administrative => "administrative",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for AppType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ComplianceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for CriticalityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = StrategyError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_token(s)
    }
}

impl FromStr for AppType {
    type Err = StrategyError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_token(s)
    }
}

impl FromStr for ComplianceTier {
    type Err = StrategyError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_token(s)
    }
}

impl FromStr for Scale {
    type Err = StrategyError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_token(s)
    }
}

impl FromStr for CriticalityTier {
    type Err = StrategyError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_token(s)
    }
}

/// Unvalidated request fields, exactly as received
///
/// Missing fields deserialize as empty strings and non-string scalars are
/// stringified, so that validation, not the decoder, reports which axis is
/// wrong.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawWorkloadProfile {
    #[serde(deserialize_with = "lenient_token")]
    pub phase: String,
    #[serde(alias = "appType", deserialize_with = "lenient_token")]
    pub app_type: String,
    #[serde(alias = "complianceTier", deserialize_with = "lenient_token")]
    pub compliance_tier: String,
    #[serde(deserialize_with = "lenient_token")]
    pub scale: String,
    #[serde(
        default,
        alias = "criticalityTier",
        deserialize_with = "lenient_optional_token",
        skip_serializing_if = "Option::is_none"
    )]
    pub criticality_tier: Option<String>,
}

fn token_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn lenient_token<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    Value::deserialize(deserializer).map(token_text)
}

fn lenient_optional_token<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        other => Some(token_text(other)),
    })
}

/// Validated, immutable description of a workload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawWorkloadProfile", into = "RawWorkloadProfile")]
pub struct WorkloadProfile {
    pub phase: Phase,
    pub app_type: AppType,
    pub compliance_tier: ComplianceTier,
    pub scale: Scale,
    pub criticality_tier: Option<CriticalityTier>,
}

impl WorkloadProfile {
    /// Create a profile without a criticality tier
    pub fn new(
        phase: Phase,
        app_type: AppType,
        compliance_tier: ComplianceTier,
        scale: Scale,
    ) -> Self {
        Self {
            phase,
            app_type,
            compliance_tier,
            scale,
            criticality_tier: None,
        }
    }

    /// Copy of this profile carrying the given criticality tier
    pub fn with_criticality(self, tier: CriticalityTier) -> Self {
        Self {
            criticality_tier: Some(tier),
            ..self
        }
    }

    pub fn with_scale(self, scale: Scale) -> Self {
        Self { scale, ..self }
    }

    pub fn with_compliance(self, compliance_tier: ComplianceTier) -> Self {
        Self {
            compliance_tier,
            ..self
        }
    }

    /// Token for an axis; `None` only for an absent criticality tier
    pub fn token(&self, axis: Axis) -> Option<&'static str> {
        match axis {
            Axis::Phase => Some(self.phase.as_str()),
            Axis::AppType => Some(self.app_type.as_str()),
            Axis::ComplianceTier => Some(self.compliance_tier.as_str()),
            Axis::Scale => Some(self.scale.as_str()),
            Axis::CriticalityTier => self.criticality_tier.map(|t| t.as_str()),
        }
    }

    /// Every distinct profile, including ones without a criticality tier
    pub fn cross_product() -> impl Iterator<Item = WorkloadProfile> {
        let tiers = std::iter::once(None).chain(CriticalityTier::ALL.iter().copied().map(Some));
        let tiers: Vec<Option<CriticalityTier>> = tiers.collect();

        Phase::ALL.iter().flat_map(move |&phase| {
            let tiers = tiers.clone();
            AppType::ALL.iter().flat_map(move |&app_type| {
                let tiers = tiers.clone();
                ComplianceTier::ALL.iter().flat_map(move |&compliance_tier| {
                    let tiers = tiers.clone();
                    Scale::ALL.iter().flat_map(move |&scale| {
                        tiers.clone().into_iter().map(move |criticality_tier| WorkloadProfile {
                            phase,
                            app_type,
                            compliance_tier,
                            scale,
                            criticality_tier,
                        })
                    })
                })
            })
        })
    }
}

impl TryFrom<RawWorkloadProfile> for WorkloadProfile {
    type Error = StrategyError;

    fn try_from(raw: RawWorkloadProfile) -> Result<Self> {
        let criticality_tier = match raw.criticality_tier.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(token) => Some(CriticalityTier::parse_token(token)?),
        };

        Ok(Self {
            phase: Phase::parse_token(&raw.phase)?,
            app_type: AppType::parse_token(&raw.app_type)?,
            compliance_tier: ComplianceTier::parse_token(&raw.compliance_tier)?,
            scale: Scale::parse_token(&raw.scale)?,
            criticality_tier,
        })
    }
}

impl From<WorkloadProfile> for RawWorkloadProfile {
    fn from(profile: WorkloadProfile) -> Self {
        Self {
            phase: profile.phase.as_str().to_string(),
            app_type: profile.app_type.as_str().to_string(),
            compliance_tier: profile.compliance_tier.as_str().to_string(),
            scale: profile.scale.as_str().to_string(),
            criticality_tier: profile.criticality_tier.map(|t| t.as_str().to_string()),
        }
    }
}

impl fmt::Display for WorkloadProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "phase={}, app_type={}, compliance_tier={}, scale={}, criticality_tier={}",
            self.phase,
            self.app_type,
            self.compliance_tier,
            self.scale,
            self.criticality_tier.map(|t| t.as_str()).unwrap_or("none"),
        )
    }
}
