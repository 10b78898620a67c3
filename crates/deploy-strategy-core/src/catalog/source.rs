//! Catalog document sources
//!
//! Catalogs are declarative files in YAML, JSON or TOML. This module only
//! parses them into an unvalidated [`CatalogDocument`]; every semantic check
//! happens in [`RuleCatalog::from_document`](super::RuleCatalog::from_document).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::catalog::RecommendationBundle;
use crate::cost::CostBand;
use crate::error::{Result, StrategyError};

/// Supported catalog encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogFormat {
    Yaml,
    Json,
    Toml,
}

impl CatalogFormat {
    /// Detect the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("yaml") | Some("yml") => Ok(Self::Yaml),
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            _ => Err(StrategyError::catalog_load(format!(
                "unsupported catalog format for '{}' (expected .yaml, .yml, .json or .toml)",
                path.display()
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Json => "json",
            Self::Toml => "toml",
        }
    }
}

/// One rule record as declared in a catalog file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleRecord {
    pub id: String,

    /// Axis name -> token or `ANY`; omitted axes are wildcards
    #[serde(default)]
    pub predicates: BTreeMap<String, String>,

    pub bundle: RecommendationBundle,

    /// Must equal the declaration index when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<usize>,
}

/// One failover chain entry as declared in a catalog file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailoverRecord {
    pub strategy_name: String,
    pub rto: String,
    pub rpo: String,
}

/// Unvalidated catalog document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogDocument {
    /// Informational label chosen by the catalog author
    #[serde(default)]
    pub version: String,

    /// Platform family -> cost class
    #[serde(default)]
    pub platforms: BTreeMap<String, String>,

    /// Ordered cheapest to most expensive
    #[serde(default)]
    pub cost_bands: Vec<CostBand>,

    /// Cost class -> scale token -> band name
    #[serde(default)]
    pub cost_table: BTreeMap<String, BTreeMap<String, String>>,

    /// Criticality tier token -> primary, secondary, tertiary
    #[serde(default)]
    pub failover: BTreeMap<String, Vec<FailoverRecord>>,

    pub rules: Vec<RuleRecord>,
}

impl CatalogDocument {
    /// Parse a document from text in the given format
    pub fn parse(content: &str, format: CatalogFormat) -> Result<Self> {
        match format {
            CatalogFormat::Yaml => serde_yaml::from_str(content)
                .map_err(|e| StrategyError::catalog_source("invalid YAML catalog", e)),
            CatalogFormat::Json => serde_json::from_str(content)
                .map_err(|e| StrategyError::catalog_source("invalid JSON catalog", e)),
            CatalogFormat::Toml => toml::from_str(content)
                .map_err(|e| StrategyError::catalog_source("invalid TOML catalog", e)),
        }
    }

    /// Read and parse a document, detecting the format from the extension
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = CatalogFormat::from_path(path)?;
        let content = std::fs::read_to_string(path).map_err(|e| {
            StrategyError::catalog_source(format!("cannot read '{}'", path.display()), e)
        })?;
        Self::parse(&content, format)
    }

    /// Stable content fingerprint (first 16 hex chars of SHA-256 over canonical JSON)
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();
        // BTreeMaps and Vecs keep the encoding stable across runs
        if let Ok(json) = serde_json::to_vec(self) {
            hasher.update(&json);
        }
        let digest = hex::encode(hasher.finalize());
        digest[..16].to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const MINIMAL_YAML: &str = r#"
version: "test"
rules:
  - id: only
    predicates: { phase: mvp_prototype }
    bundle:
      platform_family: vercel
      container_base: none
      infra_tooling: vercel_cli
      security_controls: [managed_tls]
      rationale: "minimal"
"#;

    #[test]
    fn test_format_detection() {
        assert_eq!(
            CatalogFormat::from_path(&PathBuf::from("a/catalog.YML")).unwrap(),
            CatalogFormat::Yaml
        );
        assert_eq!(
            CatalogFormat::from_path(&PathBuf::from("catalog.toml")).unwrap(),
            CatalogFormat::Toml
        );
        assert!(CatalogFormat::from_path(&PathBuf::from("catalog.ini")).is_err());
    }

    #[test]
    fn test_parse_yaml() {
        let doc = CatalogDocument::parse(MINIMAL_YAML, CatalogFormat::Yaml).unwrap();
        assert_eq!(doc.rules.len(), 1);
        assert_eq!(doc.rules[0].predicates.get("phase").unwrap(), "mvp_prototype");
        assert!(doc.rules[0].priority.is_none());
    }

    #[test]
    fn test_parse_error_is_catalog_load() {
        let err = CatalogDocument::parse("rules: [", CatalogFormat::Yaml).unwrap_err();
        assert!(matches!(err, StrategyError::CatalogLoad { source: Some(_), .. }));
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let a = CatalogDocument::parse(MINIMAL_YAML, CatalogFormat::Yaml).unwrap();
        let b = CatalogDocument::parse(MINIMAL_YAML, CatalogFormat::Yaml).unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 16);

        let mut c = a.clone();
        c.version = "other".to_string();
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn test_from_file_missing() {
        let err = CatalogDocument::from_file("/nonexistent/catalog.yaml").unwrap_err();
        assert!(err.is_catalog_error());
    }
}
