//! Error types for strategy resolution
//!
//! Every failure the engine can report falls into one of four kinds. Each
//! carries enough detail (axis, rule ids, tier) to reproduce the failure
//! from the report alone.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for resolution and catalog operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StrategyError {
    /// A request axis carried a value outside its closed enumeration
    #[error("Invalid value '{value}' for axis '{axis}' (allowed: {})", allowed.join(", "))]
    Validation {
        axis: String,
        value: String,
        allowed: Vec<String>,
    },

    /// No rule, or no failover tier entry, matched
    #[error("No match: {subject}")]
    NoMatch { subject: String },

    /// Two or more rules share an identical predicate set
    #[error("Ambiguous catalog: {}", format_conflicts(conflicts))]
    AmbiguousMatch { conflicts: Vec<Vec<String>> },

    /// Schema violation, unknown value or failed table check at load
    #[error("Catalog load failed: {reason}")]
    CatalogLoad {
        reason: String,
        #[source]
        source: Option<Box<SourceError>>,
    },
}

/// Underlying parse or I/O failure while reading a catalog source
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct SourceError(pub String);

fn format_conflicts(conflicts: &[Vec<String>]) -> String {
    conflicts
        .iter()
        .map(|ids| format!("[{}]", ids.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Stable machine-readable error code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    NoMatch,
    AmbiguousMatch,
    CatalogLoadError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::NoMatch => "NO_MATCH",
            Self::AmbiguousMatch => "AMBIGUOUS_MATCH",
            Self::CatalogLoadError => "CATALOG_LOAD_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StrategyError {
    /// Create a validation error for an axis
    pub fn validation(
        axis: impl Into<String>,
        value: impl Into<String>,
        allowed: &[&str],
    ) -> Self {
        StrategyError::Validation {
            axis: axis.into(),
            value: value.into(),
            allowed: allowed.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Create a no-match error
    pub fn no_match(subject: impl Into<String>) -> Self {
        StrategyError::NoMatch {
            subject: subject.into(),
        }
    }

    /// Create a catalog load error without an underlying source
    pub fn catalog_load(reason: impl Into<String>) -> Self {
        StrategyError::CatalogLoad {
            reason: reason.into(),
            source: None,
        }
    }

    /// Create a catalog load error wrapping a parse or I/O failure
    pub fn catalog_source(reason: impl Into<String>, source: impl std::fmt::Display) -> Self {
        StrategyError::CatalogLoad {
            reason: reason.into(),
            source: Some(Box::new(SourceError(source.to_string()))),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            StrategyError::Validation { .. } => ErrorCode::ValidationError,
            StrategyError::NoMatch { .. } => ErrorCode::NoMatch,
            StrategyError::AmbiguousMatch { .. } => ErrorCode::AmbiguousMatch,
            StrategyError::CatalogLoad { .. } => ErrorCode::CatalogLoadError,
        }
    }

    /// Errors raised while loading a catalog (as opposed to serving a request)
    pub fn is_catalog_error(&self) -> bool {
        matches!(
            self,
            StrategyError::AmbiguousMatch { .. } | StrategyError::CatalogLoad { .. }
        )
    }

    /// Every rule id involved in an ambiguity report
    pub fn conflicting_rule_ids(&self) -> Vec<&str> {
        match self {
            StrategyError::AmbiguousMatch { conflicts } => conflicts
                .iter()
                .flat_map(|group| group.iter().map(String::as_str))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Result type alias for strategy operations
pub type Result<T> = std::result::Result<T, StrategyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display_names_axis_and_allowed_set() {
        let err = StrategyError::validation("phase", "beta", &["mvp_prototype", "growth_phase"]);
        assert_eq!(
            err.to_string(),
            "Invalid value 'beta' for axis 'phase' (allowed: mvp_prototype, growth_phase)"
        );
        assert_eq!(err.code(), ErrorCode::ValidationError);
    }

    #[test]
    fn test_ambiguous_lists_every_id() {
        let err = StrategyError::AmbiguousMatch {
            conflicts: vec![vec!["a".into(), "b".into()], vec!["c".into(), "d".into()]],
        };
        assert_eq!(err.to_string(), "Ambiguous catalog: [a, b]; [c, d]");
        assert_eq!(err.conflicting_rule_ids(), vec!["a", "b", "c", "d"]);
        assert!(err.is_catalog_error());
    }

    #[test]
    fn test_codes() {
        assert_eq!(StrategyError::no_match("x").code().as_str(), "NO_MATCH");
        assert_eq!(
            StrategyError::catalog_source("bad yaml", "line 3").code(),
            ErrorCode::CatalogLoadError
        );
        assert!(!StrategyError::no_match("x").is_catalog_error());
    }
}
