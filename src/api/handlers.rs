//! HTTP API handlers.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use metrics_exporter_prometheus::PrometheusHandle;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::config::EvaluationConfig;
use crate::error::ConfigError;
use crate::evaluation::{evaluate_event, EvaluationReport};
use crate::market::{EventContext, RawQuote};

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Evaluation settings used when a request overrides nothing.
    pub defaults: Arc<EvaluationConfig>,
    /// Prometheus render handle, when a recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new app state.
    pub fn new(defaults: EvaluationConfig) -> Self {
        Self {
            defaults: Arc::new(defaults),
            metrics: None,
        }
    }

    /// Attach a Prometheus handle for `/metrics`.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(EvaluationConfig::default())
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status: "ok".
    pub status: &'static str,
}

/// Per-request overrides of the evaluation settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigOverrides {
    /// Books treated as sharp.
    pub sharp_sources: Option<Vec<String>>,
    /// Fraction of full Kelly.
    pub kelly_fraction: Option<f64>,
    /// Bankroll for stake sizing.
    pub bankroll: Option<Decimal>,
    /// Stake for expected profit.
    pub stake: Option<Decimal>,
    /// User source identifier.
    pub user_source: Option<String>,
    /// Staleness bound for sharp quotes.
    pub max_quote_age_secs: Option<u64>,
}

impl ConfigOverrides {
    /// Apply the overrides on top of a base config.
    pub fn apply(self, base: &EvaluationConfig) -> EvaluationConfig {
        EvaluationConfig {
            sharp_sources: self.sharp_sources.unwrap_or_else(|| base.sharp_sources.clone()),
            kelly_fraction: self.kelly_fraction.unwrap_or(base.kelly_fraction),
            bankroll: self.bankroll.unwrap_or(base.bankroll),
            stake: self.stake.unwrap_or(base.stake),
            user_source: self.user_source.unwrap_or_else(|| base.user_source.clone()),
            max_quote_age_secs: self.max_quote_age_secs.or(base.max_quote_age_secs),
        }
    }
}

/// Evaluation request body.
#[derive(Debug, Clone, Deserialize)]
pub struct EvaluateRequest {
    /// Event the quotes belong to.
    pub event: EventContext,
    /// Market for quotes that do not name one.
    #[serde(default)]
    pub market: Option<String>,
    /// Raw quote tuples, user and sharp.
    pub quotes: Vec<RawQuote>,
    /// Setting overrides.
    #[serde(default)]
    pub config: Option<ConfigOverrides>,
    /// Evaluation time, defaults to now.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub as_of: Option<OffsetDateTime>,
}

/// Error body returned with non-2xx statuses.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Machine-readable error kind.
    pub error: &'static str,
    /// Human-readable detail.
    pub message: String,
}

/// Handler error with its status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorResponse {
                error: "invalid_config",
                message: err.to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Health check handler - always returns 200.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// Evaluate a batch of quotes for one event.
pub async fn evaluate(
    State(state): State<AppState>,
    Json(request): Json<EvaluateRequest>,
) -> Result<Json<EvaluationReport>, ApiError> {
    let config = request.config.unwrap_or_default().apply(&state.defaults);
    if let Err(e) = config.validate() {
        warn!(error = %e, "Rejecting evaluation request");
        return Err(e.into());
    }

    let mut quotes = request.quotes;
    if let Some(market) = request.market.as_deref() {
        for quote in quotes.iter_mut().filter(|q| q.market.trim().is_empty()) {
            quote.market = market.to_string();
        }
    }

    let as_of = request.as_of.unwrap_or_else(OffsetDateTime::now_utc);
    let report = evaluate_event(&request.event, &quotes, &config, as_of);

    info!(
        event = %report.event_id,
        results = report.results.len(),
        "Served evaluation"
    );

    Ok(Json(report))
}

/// Prometheus metrics in text format.
pub async fn metrics(State(state): State<AppState>) -> Result<String, ApiError> {
    state.metrics.as_ref().map(|handle| handle.render()).ok_or(ApiError {
        status: StatusCode::NOT_FOUND,
        body: ErrorResponse {
            error: "metrics_disabled",
            message: "no metrics recorder is installed".to_string(),
        },
    })
}
