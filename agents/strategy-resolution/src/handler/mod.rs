//! HTTP handler for the Strategy Resolution Agent
//!
//! | Route                            | Purpose                                  |
//! |----------------------------------|------------------------------------------|
//! | `GET  /health`                   | liveness plus active catalog version     |
//! | `POST /api/v1/strategy/resolve`  | resolve a profile, emit a DecisionEvent  |
//! | `POST /api/v1/strategy/explain`  | every rule evaluated against a profile   |
//! | `GET  /api/v1/catalog`           | active catalog summary                   |
//! | `POST /api/v1/catalog/reload`    | re-read the configured catalog file      |
//! | `GET  /metrics`                  | Prometheus text exposition               |
//!
//! Errors map to statuses by kind: validation 400, no match 404, ambiguous
//! catalog 409, catalog load 422.

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use deploy_strategy_core::{ReloadOutcome, StrategyError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::warn;
use uuid::Uuid;

use crate::config::AgentConfig;
use crate::contracts::*;
use crate::engine::StrategyEngine;
use crate::error::AgentError;
use crate::telemetry::{DecisionEventEmitter, MetricsRegistry, StrategyMetrics};

/// Application state
pub struct AppState {
    pub engine: StrategyEngine,
    pub metrics: MetricsRegistry,
    pub emitter: DecisionEventEmitter,
    pub max_body_bytes: usize,
}

impl AppState {
    /// Build state from configuration; starts the event emitter when enabled
    pub fn from_config(config: &AgentConfig) -> Result<Self, AgentError> {
        let engine = StrategyEngine::from_config(config)?;
        let metrics =
            MetricsRegistry::new().map_err(|e| AgentError::internal(e.to_string()))?;
        let emitter = DecisionEventEmitter::new(&config.telemetry, metrics.strategy());
        Ok(Self::new(engine, metrics, emitter, config.max_body_bytes))
    }

    pub fn new(
        engine: StrategyEngine,
        metrics: MetricsRegistry,
        emitter: DecisionEventEmitter,
        max_body_bytes: usize,
    ) -> Self {
        let catalog = engine.snapshot();
        metrics
            .strategy()
            .set_catalog(catalog.len(), engine.generation());
        Self {
            engine,
            metrics,
            emitter,
            max_body_bytes,
        }
    }

    fn strategy_metrics(&self) -> Arc<StrategyMetrics> {
        self.metrics.strategy()
    }
}

/// Create the router
pub fn create_router(state: Arc<AppState>) -> Router {
    let body_limit = state.max_body_bytes;
    Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/strategy/resolve", post(resolve_strategy))
        .route("/api/v1/strategy/explain", post(explain_strategy))
        .route("/api/v1/catalog", get(catalog_info))
        .route("/api/v1/catalog/reload", post(reload_catalog))
        .route("/metrics", get(metrics))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

type ApiFailure = (StatusCode, Json<ApiError>);

async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        agent_id: DecisionEvent::AGENT_ID.to_string(),
        agent_version: DecisionEvent::AGENT_VERSION.to_string(),
        catalog_version: state.engine.snapshot().fingerprint().to_string(),
    })
}

async fn resolve_strategy(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ResolveRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<ResolutionOutput>>, ApiFailure> {
    let metrics = state.strategy_metrics();
    let Json(request) = payload.map_err(rejection_failure)?;

    let input = StrategyEngine::create_input(request).map_err(|e| {
        metrics.record_resolution(e.code().as_str());
        strategy_failure(&e, None)
    })?;

    let record = state.engine.resolve(&input);
    metrics.observe_duration("resolve", record.duration.as_secs_f64());

    match &record.result {
        Ok(plan) => {
            metrics.record_resolution("resolved");
            metrics.record_plan(
                plan.platform_family(),
                &plan.cost_band.tier_name,
                plan.specificity,
            );
        }
        Err(e) => metrics.record_resolution(e.code().as_str()),
    }

    if let Err(e) = state.emitter.emit(record.event.clone()) {
        warn!(error = %e, "Failed to emit decision event");
    }

    let request_id = record.request_id;
    let output = record
        .into_output()
        .map_err(|e| strategy_failure(&e, Some(request_id)))?;

    Ok(Json(ApiResponse {
        success: true,
        data: output,
        request_id,
    }))
}

async fn explain_strategy(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ResolveRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<ExplainOutput>>, ApiFailure> {
    let Json(request) = payload.map_err(rejection_failure)?;
    let input = StrategyEngine::create_input(request).map_err(|e| strategy_failure(&e, None))?;

    let output = state.engine.explain(&input);
    Ok(Json(ApiResponse {
        success: output.explanation.selected_rule_id.is_some(),
        request_id: input.request_id,
        data: output,
    }))
}

async fn catalog_info(State(state): State<Arc<AppState>>) -> Json<CatalogInfo> {
    Json(state.engine.catalog_info())
}

async fn reload_catalog(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<ReloadOutcome>>, ApiFailure> {
    let request_id = Uuid::new_v4();
    let metrics = state.strategy_metrics();

    match state.engine.reload() {
        Ok(outcome) => {
            metrics.record_reload(true);
            metrics.set_catalog(outcome.rule_count, outcome.generation);

            let event = DecisionEvent::new(
                StrategyDecisionType::CatalogReload,
                compute_reload_hash(&outcome.previous_version, &outcome.current_version),
                DecisionOutputs::default(),
                1.0,
                outcome.current_version.clone(),
                request_id.to_string(),
            )
            .with_metadata("previous_version", serde_json::json!(outcome.previous_version));
            if let Err(e) = state.emitter.emit(event) {
                warn!(error = %e, "Failed to emit reload event");
            }

            Ok(Json(ApiResponse {
                success: true,
                data: outcome,
                request_id,
            }))
        }
        Err(AgentError::Strategy(e)) => {
            metrics.record_reload(false);
            Err(strategy_failure(&e, Some(request_id)))
        }
        Err(e) => Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError {
                error: "RELOAD_UNAVAILABLE".to_string(),
                message: e.to_string(),
                details: None,
                request_id: Some(request_id),
            }),
        )),
    }
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.metrics.encode_text() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "text/plain")],
            e.to_string(),
        ),
    }
}

/// HTTP status for each error kind
pub fn status_for(error: &StrategyError) -> StatusCode {
    match error {
        StrategyError::Validation { .. } => StatusCode::BAD_REQUEST,
        StrategyError::NoMatch { .. } => StatusCode::NOT_FOUND,
        StrategyError::AmbiguousMatch { .. } => StatusCode::CONFLICT,
        StrategyError::CatalogLoad { .. } => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

/// Structured details carried alongside the message
pub fn error_details(error: &StrategyError) -> serde_json::Value {
    match error {
        StrategyError::Validation {
            axis,
            value,
            allowed,
        } => serde_json::json!({ "axis": axis, "value": value, "allowed": allowed }),
        StrategyError::NoMatch { subject } => serde_json::json!({ "subject": subject }),
        StrategyError::AmbiguousMatch { conflicts } => {
            serde_json::json!({ "conflicts": conflicts })
        }
        StrategyError::CatalogLoad { reason, source } => serde_json::json!({
            "reason": reason,
            "source": source.as_ref().map(|s| s.to_string()),
        }),
    }
}

fn strategy_failure(error: &StrategyError, request_id: Option<Uuid>) -> ApiFailure {
    (
        status_for(error),
        Json(ApiError {
            error: error.code().as_str().to_string(),
            message: error.to_string(),
            details: Some(error_details(error)),
            request_id,
        }),
    )
}

fn rejection_failure(rejection: JsonRejection) -> ApiFailure {
    let status = match rejection.status() {
        StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
        StatusCode::UNSUPPORTED_MEDIA_TYPE => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        _ => StatusCode::BAD_REQUEST,
    };
    (
        status,
        Json(ApiError {
            error: "INVALID_REQUEST".to_string(),
            message: rejection.body_text(),
            details: None,
            request_id: None,
        }),
    )
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub agent_id: String,
    pub agent_version: String,
    pub catalog_version: String,
}

/// API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    pub request_id: Uuid,
}

/// API error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    /// Machine-readable code, e.g. `NO_MATCH`
    pub error: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<Uuid>,
}
