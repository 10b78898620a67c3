//! Hot-swappable catalog snapshots
//!
//! Readers take an `Arc` to the current catalog and resolve against it for
//! the whole request. A reload builds and validates the replacement fully
//! before swapping the pointer, so a request sees either the old catalog or
//! the new one, never a mix. A failed reload leaves the current snapshot in
//! place.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::catalog::source::CatalogFormat;
use crate::catalog::RuleCatalog;
use crate::error::Result;

/// Result of a successful reload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReloadOutcome {
    pub previous_version: String,
    pub current_version: String,
    /// Incremented on every successful swap
    pub generation: u64,
    pub rule_count: usize,
}

impl ReloadOutcome {
    pub fn changed(&self) -> bool {
        self.previous_version != self.current_version
    }
}

/// Shared holder of the active catalog
#[derive(Debug)]
pub struct CatalogStore {
    current: RwLock<Arc<RuleCatalog>>,
    generation: AtomicU64,
}

impl CatalogStore {
    pub fn new(catalog: RuleCatalog) -> Self {
        Self {
            current: RwLock::new(Arc::new(catalog)),
            generation: AtomicU64::new(0),
        }
    }

    /// Store seeded with the embedded deployment matrix
    pub fn builtin() -> Result<Self> {
        Ok(Self::new(RuleCatalog::builtin()?))
    }

    /// Current catalog; stays valid for as long as the caller holds it
    pub fn snapshot(&self) -> Arc<RuleCatalog> {
        // The guarded value is a plain Arc, so a poisoned lock still holds
        // a complete catalog.
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Fingerprint of the current catalog
    pub fn version(&self) -> String {
        self.snapshot().fingerprint().to_string()
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Swap in an already validated catalog
    pub fn replace(&self, catalog: RuleCatalog) -> ReloadOutcome {
        let rule_count = catalog.len();
        let current_version = catalog.fingerprint().to_string();
        let next = Arc::new(catalog);

        let previous = {
            let mut guard = match self.current.write() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            std::mem::replace(&mut *guard, next)
        };
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        info!(
            previous_version = %previous.fingerprint(),
            catalog_version = %current_version,
            generation,
            rules = rule_count,
            "Catalog swapped"
        );

        ReloadOutcome {
            previous_version: previous.fingerprint().to_string(),
            current_version,
            generation,
            rule_count,
        }
    }

    /// Load, validate and swap in a catalog file
    pub fn reload_file(&self, path: impl AsRef<Path>) -> Result<ReloadOutcome> {
        let path = path.as_ref();
        match RuleCatalog::from_file(path) {
            Ok(catalog) => Ok(self.replace(catalog)),
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    catalog_version = %self.version(),
                    "Catalog reload rejected, keeping current snapshot"
                );
                Err(e)
            }
        }
    }

    /// Validate and swap in catalog text
    pub fn reload_str(&self, content: &str, format: CatalogFormat) -> Result<ReloadOutcome> {
        match RuleCatalog::from_str(content, format) {
            Ok(catalog) => Ok(self.replace(catalog)),
            Err(e) => {
                warn!(
                    format = format.as_str(),
                    error = %e,
                    catalog_version = %self.version(),
                    "Catalog reload rejected, keeping current snapshot"
                );
                Err(e)
            }
        }
    }
}
