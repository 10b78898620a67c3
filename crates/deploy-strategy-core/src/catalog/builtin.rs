//! Embedded deployment decision matrix
//!
//! Used whenever no catalog file is configured. The source lives in
//! `catalogs/deployment-matrix.yaml` at the crate root.

/// YAML source of the built-in catalog
pub const DEPLOYMENT_MATRIX: &str = include_str!("../../catalogs/deployment-matrix.yaml");
