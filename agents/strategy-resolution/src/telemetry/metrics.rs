//! Prometheus metrics for strategy resolution
//!
//! - `strategy_resolution_resolutions_total` (counter) - by outcome
//! - `strategy_resolution_duration_seconds` (histogram) - resolution latency
//! - `strategy_resolution_specificity` (histogram) - winning rule specificity
//! - `strategy_resolution_plans_total` (counter) - by platform family and cost band
//! - `strategy_resolution_catalog_reloads_total` (counter) - by result
//! - `strategy_resolution_catalog_rules` (gauge) - rules in the active catalog
//! - `strategy_resolution_catalog_generation` (gauge) - successful reloads
//! - `strategy_resolution_events_emitted_total` / `_events_failed_total` (counters)

use prometheus::{
    Counter, CounterVec, Gauge, Histogram, HistogramOpts, HistogramVec, Opts, Registry,
};
use std::sync::Arc;

use super::{Result, TelemetryError};

const NAMESPACE: &str = "strategy_resolution";

pub struct StrategyMetrics {
    resolutions_total: CounterVec,
    duration_seconds: HistogramVec,
    specificity: Histogram,
    plans_total: CounterVec,
    reloads_total: CounterVec,
    catalog_rules: Gauge,
    catalog_generation: Gauge,
    events_emitted_total: Counter,
    events_failed_total: Counter,
}

impl StrategyMetrics {
    /// Create the metrics and register them with `registry`
    pub fn new(registry: &Registry) -> Result<Self> {
        let resolutions_total = CounterVec::new(
            Opts::new("resolutions_total", "Strategy resolutions by outcome").namespace(NAMESPACE),
            &["outcome"],
        )?;

        let duration_seconds = HistogramVec::new(
            HistogramOpts::new("duration_seconds", "Strategy resolution duration in seconds")
                .namespace(NAMESPACE)
                .buckets(vec![0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05]),
            &["operation"],
        )?;

        let specificity = Histogram::with_opts(
            HistogramOpts::new("specificity", "Specificity of the winning rule")
                .namespace(NAMESPACE)
                .buckets(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]),
        )?;

        let plans_total = CounterVec::new(
            Opts::new("plans_total", "Resolved plans by platform family and cost band")
                .namespace(NAMESPACE),
            &["platform_family", "cost_band"],
        )?;

        let reloads_total = CounterVec::new(
            Opts::new("catalog_reloads_total", "Catalog reload attempts by result")
                .namespace(NAMESPACE),
            &["result"],
        )?;

        let catalog_rules = Gauge::with_opts(
            Opts::new("catalog_rules", "Rules in the active catalog").namespace(NAMESPACE),
        )?;

        let catalog_generation = Gauge::with_opts(
            Opts::new("catalog_generation", "Successful catalog swaps since startup")
                .namespace(NAMESPACE),
        )?;

        let events_emitted_total = Counter::with_opts(
            Opts::new("events_emitted_total", "Decision events delivered").namespace(NAMESPACE),
        )?;

        let events_failed_total = Counter::with_opts(
            Opts::new("events_failed_total", "Decision events dropped or rejected")
                .namespace(NAMESPACE),
        )?;

        registry.register(Box::new(resolutions_total.clone()))?;
        registry.register(Box::new(duration_seconds.clone()))?;
        registry.register(Box::new(specificity.clone()))?;
        registry.register(Box::new(plans_total.clone()))?;
        registry.register(Box::new(reloads_total.clone()))?;
        registry.register(Box::new(catalog_rules.clone()))?;
        registry.register(Box::new(catalog_generation.clone()))?;
        registry.register(Box::new(events_emitted_total.clone()))?;
        registry.register(Box::new(events_failed_total.clone()))?;

        Ok(Self {
            resolutions_total,
            duration_seconds,
            specificity,
            plans_total,
            reloads_total,
            catalog_rules,
            catalog_generation,
            events_emitted_total,
            events_failed_total,
        })
    }

    /// Record a resolution outcome: `resolved` or an error code
    pub fn record_resolution(&self, outcome: &str) {
        self.resolutions_total.with_label_values(&[outcome]).inc();
    }

    pub fn observe_duration(&self, operation: &str, duration_secs: f64) {
        self.duration_seconds
            .with_label_values(&[operation])
            .observe(duration_secs);
    }

    pub fn record_plan(&self, platform_family: &str, cost_band: &str, specificity: usize) {
        self.plans_total
            .with_label_values(&[platform_family, cost_band])
            .inc();
        self.specificity.observe(specificity as f64);
    }

    pub fn record_reload(&self, success: bool) {
        let result = if success { "success" } else { "rejected" };
        self.reloads_total.with_label_values(&[result]).inc();
    }

    pub fn set_catalog(&self, rule_count: usize, generation: u64) {
        self.catalog_rules.set(rule_count as f64);
        self.catalog_generation.set(generation as f64);
    }

    pub fn record_event_emitted(&self) {
        self.events_emitted_total.inc();
    }

    pub fn record_event_failed(&self) {
        self.events_failed_total.inc();
    }
}

/// Owns the Prometheus registry the agent exposes on `/metrics`
pub struct MetricsRegistry {
    registry: Registry,
    strategy: Arc<StrategyMetrics>,
}

impl MetricsRegistry {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let strategy = Arc::new(StrategyMetrics::new(&registry)?);
        Ok(Self { registry, strategy })
    }

    pub fn strategy(&self) -> Arc<StrategyMetrics> {
        Arc::clone(&self.strategy)
    }

    /// Encode metrics as text for scraping
    pub fn encode_text(&self) -> Result<String> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| TelemetryError::MetricsError(prometheus::Error::Msg(e.to_string())))
    }
}
