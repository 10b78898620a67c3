//! Strategy resolution engine
//!
//! Wraps the hot-swappable catalog store. Every resolution takes one
//! snapshot up front and uses it for the plan, the inputs hash and the
//! decision event, so all three always name the same catalog version.

use chrono::Utc;
use deploy_strategy_core::{
    explain, resolve, CatalogStore, ReloadOutcome, ResolvedPlan, RuleCatalog, StrategyError,
    WorkloadProfile,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::AgentConfig;
use crate::contracts::*;
use crate::error::{AgentError, Result};

/// Outcome of one resolution together with its audit event
#[derive(Debug)]
pub struct ResolutionRecord {
    pub request_id: Uuid,
    pub result: std::result::Result<ResolvedPlan, StrategyError>,
    pub event: DecisionEvent,
    pub duration: Duration,
}

impl ResolutionRecord {
    /// Convert into the response contract, attaching the event id
    pub fn into_output(self) -> std::result::Result<ResolutionOutput, StrategyError> {
        let duration_us = self.duration.as_micros() as u64;
        let event_id = self.event.event_id;
        self.result.map(|plan| ResolutionOutput {
            request_id: self.request_id,
            plan,
            decision_event_id: Some(event_id),
            completed_at: Utc::now(),
            duration_us,
        })
    }
}

pub struct StrategyEngine {
    store: CatalogStore,
    catalog_path: Option<PathBuf>,
}

impl StrategyEngine {
    /// Engine over a fixed catalog with no reload source
    pub fn new(catalog: RuleCatalog) -> Self {
        Self {
            store: CatalogStore::new(catalog),
            catalog_path: None,
        }
    }

    /// Engine over the embedded deployment matrix
    pub fn builtin() -> Result<Self> {
        Ok(Self::new(RuleCatalog::builtin()?))
    }

    /// Engine loading, and later reloading, a catalog file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let catalog = RuleCatalog::from_file(&path)?;
        Ok(Self {
            store: CatalogStore::new(catalog),
            catalog_path: Some(path),
        })
    }

    pub fn from_config(config: &AgentConfig) -> Result<Self> {
        match &config.catalog_path {
            Some(path) => Self::from_file(path),
            None => Self::builtin(),
        }
    }

    pub fn catalog_path(&self) -> Option<&Path> {
        self.catalog_path.as_deref()
    }

    pub fn snapshot(&self) -> Arc<RuleCatalog> {
        self.store.snapshot()
    }

    /// Validate a request into a resolution input
    pub fn create_input(request: ResolveRequest) -> std::result::Result<ResolutionInput, StrategyError> {
        let profile = WorkloadProfile::try_from(request.profile)?;
        Ok(ResolutionInput {
            request_id: Uuid::new_v4(),
            profile,
            context: request.context,
            requested_at: Utc::now(),
            requested_by: request
                .requested_by
                .unwrap_or_else(|| "anonymous".to_string()),
        })
    }

    /// Resolve against the current snapshot and build the decision event
    pub fn resolve(&self, input: &ResolutionInput) -> ResolutionRecord {
        let start = Instant::now();
        let catalog = self.store.snapshot();
        let inputs_hash = compute_inputs_hash(&input.profile, catalog.fingerprint());
        let execution_ref = input.request_id.to_string();

        let result = resolve(&input.profile, &catalog);
        let duration = start.elapsed();

        let event = match &result {
            Ok(plan) => DecisionEvent::from_plan(inputs_hash, plan, execution_ref),
            Err(e) => DecisionEvent::from_error(
                inputs_hash,
                e,
                catalog.fingerprint().to_string(),
                execution_ref,
            ),
        }
        .with_performance(duration.as_micros() as u64, catalog.len())
        .with_metadata("requested_by", serde_json::json!(input.requested_by));

        let event = if input.context.is_empty() {
            event
        } else {
            event.with_metadata("context", serde_json::json!(input.context))
        };

        debug!(
            request_id = %input.request_id,
            profile = %input.profile,
            resolved = result.is_ok(),
            duration_us = duration.as_micros() as u64,
            "Resolution finished"
        );

        ResolutionRecord {
            request_id: input.request_id,
            result,
            event,
            duration,
        }
    }

    /// Audit view of every rule against the profile
    pub fn explain(&self, input: &ResolutionInput) -> ExplainOutput {
        let catalog = self.store.snapshot();
        ExplainOutput {
            request_id: input.request_id,
            explanation: explain(&input.profile, &catalog),
        }
    }

    /// Re-read the configured catalog file and swap it in
    pub fn reload(&self) -> Result<ReloadOutcome> {
        let path = self
            .catalog_path
            .as_ref()
            .ok_or_else(|| AgentError::invalid_input("no catalog file configured; using the built-in catalog"))?;
        let outcome = self.store.reload_file(path)?;
        info!(
            path = %path.display(),
            catalog_version = %outcome.current_version,
            changed = outcome.changed(),
            "Catalog reloaded"
        );
        Ok(outcome)
    }

    pub fn generation(&self) -> u64 {
        self.store.generation()
    }

    pub fn catalog_info(&self) -> CatalogInfo {
        let catalog = self.store.snapshot();
        CatalogInfo {
            version: catalog.fingerprint().to_string(),
            label: catalog.label().to_string(),
            rule_count: catalog.len(),
            failover_tiers: catalog.failover().tiers().map(|t| t.to_string()).collect(),
            cost_bands: catalog
                .costs()
                .bands()
                .iter()
                .map(|b| b.tier_name.clone())
                .collect(),
            generation: self.store.generation(),
            source: self.catalog_path.as_ref().map(|p| p.display().to_string()),
        }
    }
}
