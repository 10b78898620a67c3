//! Cost band estimation
//!
//! A bundle's platform family belongs to a cost class; the class and the
//! workload scale select a named band. Bands are ordered cheapest first and
//! every class must cover every scale with a band that never gets cheaper as
//! scale grows.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::catalog::RecommendationBundle;
use crate::error::{Result, StrategyError};
use crate::profile::{AxisValue, Scale};

/// A named monthly price range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostBand {
    pub tier_name: String,
    pub lower_bound: u64,
    pub upper_bound: u64,
    pub justification: String,
}

/// Platform class x scale -> cost band
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CostTable {
    bands: Vec<CostBand>,
    platform_classes: BTreeMap<String, String>,
    /// Band index per class, one slot per [`Scale`] in rank order
    grid: BTreeMap<String, Vec<usize>>,
}

impl CostTable {
    /// Validate catalog records into a table
    pub fn from_records(
        bands: &[CostBand],
        platforms: &BTreeMap<String, String>,
        table: &BTreeMap<String, BTreeMap<String, String>>,
    ) -> Result<Self> {
        if bands.is_empty() {
            return Err(StrategyError::catalog_load("cost_bands is empty"));
        }

        let mut band_index = BTreeMap::new();
        for (i, band) in bands.iter().enumerate() {
            if band.tier_name.trim().is_empty() {
                return Err(StrategyError::catalog_load(format!(
                    "cost band #{} has an empty tier_name",
                    i
                )));
            }
            if band.lower_bound > band.upper_bound {
                return Err(StrategyError::catalog_load(format!(
                    "cost band '{}' has lower_bound {} above upper_bound {}",
                    band.tier_name, band.lower_bound, band.upper_bound
                )));
            }
            if i > 0 {
                let prev = &bands[i - 1];
                if band.lower_bound < prev.lower_bound || band.upper_bound < prev.upper_bound {
                    return Err(StrategyError::catalog_load(format!(
                        "cost band '{}' is cheaper than the preceding band '{}'",
                        band.tier_name, prev.tier_name
                    )));
                }
            }
            if band_index.insert(band.tier_name.as_str(), i).is_some() {
                return Err(StrategyError::catalog_load(format!(
                    "cost band '{}' declared more than once",
                    band.tier_name
                )));
            }
        }

        let mut grid = BTreeMap::new();
        for (class, by_scale) in table {
            let mut named: BTreeMap<Scale, &String> = BTreeMap::new();
            for (token, band_name) in by_scale {
                let scale = Scale::parse_token(token).map_err(|_| {
                    StrategyError::catalog_load(format!(
                        "cost class '{}' names unknown scale '{}' (allowed: {})",
                        class,
                        token,
                        Scale::tokens().join(", ")
                    ))
                })?;
                if named.insert(scale, band_name).is_some() {
                    return Err(StrategyError::catalog_load(format!(
                        "cost class '{}' names scale '{}' more than once",
                        class, scale
                    )));
                }
            }

            let mut row = Vec::with_capacity(Scale::ALL.len());
            for scale in Scale::ALL {
                let band_name = named.get(scale).ok_or_else(|| {
                    StrategyError::catalog_load(format!(
                        "cost class '{}' has no band for scale '{}'",
                        class, scale
                    ))
                })?;
                let index = *band_index.get(band_name.as_str()).ok_or_else(|| {
                    StrategyError::catalog_load(format!(
                        "cost class '{}' at scale '{}' references unknown band '{}'",
                        class, scale, band_name
                    ))
                })?;

                if let Some(&prev) = row.last() {
                    if index < prev {
                        return Err(StrategyError::catalog_load(format!(
                            "cost class '{}' gets cheaper at scale '{}' ('{}' after '{}')",
                            class, scale, bands[index].tier_name, bands[prev].tier_name
                        )));
                    }
                }
                row.push(index);
            }
            grid.insert(class.clone(), row);
        }

        for (family, class) in platforms {
            if !grid.contains_key(class) {
                return Err(StrategyError::catalog_load(format!(
                    "platform '{}' belongs to cost class '{}' which has no cost_table entry",
                    family, class
                )));
            }
        }

        Ok(Self {
            bands: bands.to_vec(),
            platform_classes: platforms.clone(),
            grid,
        })
    }

    /// Cost class of a platform family
    pub fn class_of(&self, platform_family: &str) -> Option<&str> {
        self.platform_classes.get(platform_family).map(String::as_str)
    }

    /// Position of the selected band, cheapest = 0
    pub fn rank(&self, bundle: &RecommendationBundle, scale: Scale) -> Option<usize> {
        let class = self.class_of(&bundle.platform_family)?;
        self.grid.get(class)?.get(scale.rank()).copied()
    }

    /// Select the cost band for a bundle at a scale
    pub fn estimate(&self, bundle: &RecommendationBundle, scale: Scale) -> Result<CostBand> {
        self.rank(bundle, scale)
            .map(|index| self.bands[index].clone())
            .ok_or_else(|| {
                StrategyError::no_match(format!(
                    "no cost class for platform '{}'",
                    bundle.platform_family
                ))
            })
    }

    pub fn bands(&self) -> &[CostBand] {
        &self.bands
    }
}
