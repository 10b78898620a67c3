//! Failover planning
//!
//! Each criticality tier maps to a chain of exactly three recovery
//! strategies. Recovery objectives may only loosen down the chain, which is
//! checked when the table is built, never at request time.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use crate::catalog::source::FailoverRecord;
use crate::error::{Result, StrategyError};
use crate::profile::{AxisValue, CriticalityTier};

/// A recovery time or recovery point objective
///
/// Written in compact form: an integer followed by `s`, `m`, `h` or `d`
/// (`0s`, `30s`, `15m`, `4h`, `1d`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecoveryObjective(Duration);

impl RecoveryObjective {
    pub fn from_secs(secs: u64) -> Self {
        Self(Duration::from_secs(secs))
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }

    pub fn parse(raw: &str) -> std::result::Result<Self, String> {
        let raw = raw.trim();
        let split = raw
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| format!("'{}' is missing a unit (s, m, h, d)", raw))?;
        let (digits, unit) = raw.split_at(split);

        let amount: u64 = digits
            .parse()
            .map_err(|_| format!("'{}' does not start with a whole number", raw))?;
        let multiplier = match unit {
            "s" => 1,
            "m" => 60,
            "h" => 3_600,
            "d" => 86_400,
            other => return Err(format!("'{}' has unknown unit '{}'", raw, other)),
        };

        amount
            .checked_mul(multiplier)
            .map(Self::from_secs)
            .ok_or_else(|| format!("'{}' overflows", raw))
    }
}

impl fmt::Display for RecoveryObjective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.0.as_secs();
        match secs {
            0 => write!(f, "0s"),
            s if s % 86_400 == 0 => write!(f, "{}d", s / 86_400),
            s if s % 3_600 == 0 => write!(f, "{}h", s / 3_600),
            s if s % 60 == 0 => write!(f, "{}m", s / 60),
            s => write!(f, "{}s", s),
        }
    }
}

impl Serialize for RecoveryObjective {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RecoveryObjective {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// One recovery strategy with its objectives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailoverEntry {
    pub strategy_name: String,
    pub rto: RecoveryObjective,
    pub rpo: RecoveryObjective,
}

/// Primary, secondary and tertiary strategies with loosening objectives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<FailoverEntry>", into = "Vec<FailoverEntry>")]
pub struct FailoverChain {
    entries: [FailoverEntry; 3],
}

const POSITIONS: [&str; 3] = ["primary", "secondary", "tertiary"];

impl FailoverChain {
    /// Build a chain, checking length and monotonicity
    pub fn new(entries: Vec<FailoverEntry>) -> std::result::Result<Self, String> {
        let entries: [FailoverEntry; 3] = entries
            .try_into()
            .map_err(|v: Vec<FailoverEntry>| format!("expected 3 entries, found {}", v.len()))?;

        for (i, entry) in entries.iter().enumerate() {
            if entry.strategy_name.trim().is_empty() {
                return Err(format!("{} strategy_name is empty", POSITIONS[i]));
            }
        }

        for i in 1..3 {
            let (prev, next) = (&entries[i - 1], &entries[i]);
            if next.rto < prev.rto {
                return Err(format!(
                    "rto tightens from {} ({}) to {} ({})",
                    POSITIONS[i - 1],
                    prev.rto,
                    POSITIONS[i],
                    next.rto
                ));
            }
            if next.rpo < prev.rpo {
                return Err(format!(
                    "rpo tightens from {} ({}) to {} ({})",
                    POSITIONS[i - 1],
                    prev.rpo,
                    POSITIONS[i],
                    next.rpo
                ));
            }
        }

        Ok(Self { entries })
    }

    pub fn primary(&self) -> &FailoverEntry {
        &self.entries[0]
    }

    pub fn secondary(&self) -> &FailoverEntry {
        &self.entries[1]
    }

    pub fn tertiary(&self) -> &FailoverEntry {
        &self.entries[2]
    }

    pub fn entries(&self) -> &[FailoverEntry; 3] {
        &self.entries
    }
}

impl TryFrom<Vec<FailoverEntry>> for FailoverChain {
    type Error = String;

    fn try_from(entries: Vec<FailoverEntry>) -> std::result::Result<Self, String> {
        Self::new(entries)
    }
}

impl From<FailoverChain> for Vec<FailoverEntry> {
    fn from(chain: FailoverChain) -> Self {
        chain.entries.into()
    }
}

/// Criticality tier -> failover chain
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailoverTable {
    chains: BTreeMap<CriticalityTier, FailoverChain>,
}

impl FailoverTable {
    /// Validate catalog records into a table
    pub fn from_records(records: &BTreeMap<String, Vec<FailoverRecord>>) -> Result<Self> {
        let mut chains = BTreeMap::new();

        for (tier_token, entries) in records {
            let tier = CriticalityTier::parse_token(tier_token).map_err(|_| {
                StrategyError::catalog_load(format!(
                    "failover table names unknown criticality tier '{}' (allowed: {})",
                    tier_token,
                    CriticalityTier::tokens().join(", ")
                ))
            })?;

            let entries = entries
                .iter()
                .map(|record| {
                    let rto = RecoveryObjective::parse(&record.rto);
                    let rpo = RecoveryObjective::parse(&record.rpo);
                    match (rto, rpo) {
                        (Ok(rto), Ok(rpo)) => Ok(FailoverEntry {
                            strategy_name: record.strategy_name.clone(),
                            rto,
                            rpo,
                        }),
                        (Err(e), _) | (_, Err(e)) => Err(StrategyError::catalog_load(format!(
                            "failover tier '{}', strategy '{}': {}",
                            tier, record.strategy_name, e
                        ))),
                    }
                })
                .collect::<Result<Vec<_>>>()?;

            let chain = FailoverChain::new(entries).map_err(|e| {
                StrategyError::catalog_load(format!("failover tier '{}': {}", tier, e))
            })?;

            if chains.insert(tier, chain).is_some() {
                return Err(StrategyError::catalog_load(format!(
                    "failover tier '{}' declared more than once",
                    tier
                )));
            }
        }

        Ok(Self { chains })
    }

    /// Look up the chain for a tier
    pub fn plan(&self, tier: CriticalityTier) -> Result<FailoverChain> {
        self.chains.get(&tier).cloned().ok_or_else(|| {
            StrategyError::no_match(format!("no failover chain for criticality tier '{}'", tier))
        })
    }

    pub fn contains(&self, tier: CriticalityTier) -> bool {
        self.chains.contains_key(&tier)
    }

    pub fn tiers(&self) -> impl Iterator<Item = CriticalityTier> + '_ {
        self.chains.keys().copied()
    }

    pub fn chains(&self) -> impl Iterator<Item = (CriticalityTier, &FailoverChain)> + '_ {
        self.chains.iter().map(|(tier, chain)| (*tier, chain))
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, rto: &str, rpo: &str) -> FailoverRecord {
        FailoverRecord {
            strategy_name: name.to_string(),
            rto: rto.to_string(),
            rpo: rpo.to_string(),
        }
    }

    fn table(entries: Vec<FailoverRecord>) -> Result<FailoverTable> {
        let mut records = BTreeMap::new();
        records.insert("mission_critical".to_string(), entries);
        FailoverTable::from_records(&records)
    }

    #[test]
    fn test_objective_parse_and_display() {
        assert_eq!(RecoveryObjective::parse("15m").unwrap().as_duration().as_secs(), 900);
        assert_eq!(RecoveryObjective::parse("0s").unwrap().to_string(), "0s");
        assert_eq!(RecoveryObjective::parse("90m").unwrap().to_string(), "90m");
        assert_eq!(RecoveryObjective::parse("120m").unwrap().to_string(), "2h");
        assert_eq!(RecoveryObjective::parse("24h").unwrap().to_string(), "1d");
        assert!(RecoveryObjective::parse("15").is_err());
        assert!(RecoveryObjective::parse("m").is_err());
        assert!(RecoveryObjective::parse("3w").is_err());
    }

    #[test]
    fn test_monotonic_chain_accepted() {
        let table = table(vec![
            record("active_active", "1m", "0s"),
            record("warm_standby", "15m", "1m"),
            record("backup_restore", "4h", "1h"),
        ])
        .unwrap();

        let chain = table.plan(CriticalityTier::MissionCritical).unwrap();
        assert_eq!(chain.primary().strategy_name, "active_active");
        assert_eq!(chain.tertiary().rto.to_string(), "4h");
    }

    #[test]
    fn test_tightening_rto_rejected() {
        let err = table(vec![
            record("a", "1h", "0s"),
            record("b", "15m", "1m"),
            record("c", "4h", "1h"),
        ])
        .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("mission_critical"));
        assert!(message.contains("rto tightens from primary"));
    }

    #[test]
    fn test_tightening_rpo_rejected() {
        let err = table(vec![
            record("a", "1m", "1m"),
            record("b", "15m", "1m"),
            record("c", "4h", "30s"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("rpo tightens from secondary"));
    }

    #[test]
    fn test_wrong_length_rejected() {
        let err = table(vec![record("a", "1m", "0s"), record("b", "15m", "1m")]).unwrap_err();
        assert!(err.to_string().contains("expected 3 entries, found 2"));
    }

    #[test]
    fn test_unknown_tier_rejected() {
        let mut records = BTreeMap::new();
        records.insert("platinum".to_string(), vec![]);
        let err = FailoverTable::from_records(&records).unwrap_err();
        assert!(err.to_string().contains("platinum"));
    }

    #[test]
    fn test_missing_tier_is_no_match() {
        let table = FailoverTable::default();
        let err = table.plan(CriticalityTier::Administrative).unwrap_err();
        assert!(matches!(err, StrategyError::NoMatch { ref subject } if subject.contains("administrative")));
    }

    #[test]
    fn test_chain_deserialize_revalidates() {
        let bad = serde_json::json!([
            {"strategy_name": "a", "rto": "4h", "rpo": "0s"},
            {"strategy_name": "b", "rto": "1h", "rpo": "0s"},
            {"strategy_name": "c", "rto": "8h", "rpo": "0s"}
        ]);
        assert!(serde_json::from_value::<FailoverChain>(bad).is_err());
    }
}
