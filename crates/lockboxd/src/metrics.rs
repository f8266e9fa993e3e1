//! Prometheus /metrics + health check HTTP endpoints
//!
//! Endpoints:
//!   GET /metrics  — Prometheus text format
//!   GET /healthz  — Liveness probe (always 200 if process is running)
//!   GET /readyz   — Readiness probe (200 once the gate is serving)

use anyhow::Result;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};
use prometheus_client::encoding::{text::encode, EncodeLabelSet};
use prometheus_client::metrics::{counter::Counter, family::Family};
use prometheus_client::registry::Registry;
use std::sync::Arc;

use lockbox_core::Session;
use lockbox_gate::{Decision, DecisionObserver, RequestInfo, ResourceCategory};

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct DecisionLabels {
    pub outcome: String,
    pub category: String,
}

/// Gate decision counters, fed as a [`DecisionObserver`]
#[derive(Clone)]
pub struct GateMetrics {
    decisions: Family<DecisionLabels, Counter>,
}

impl GateMetrics {
    pub fn register(registry: &mut Registry) -> Self {
        let decisions = Family::<DecisionLabels, Counter>::default();
        registry.register(
            "lockbox_gate_decisions",
            "Credential gate decisions by outcome and resource category",
            decisions.clone(),
        );
        Self { decisions }
    }

    #[cfg(test)]
    pub fn count(&self, outcome: &str, category: &str) -> u64 {
        self.decisions
            .get_or_create(&DecisionLabels {
                outcome: outcome.into(),
                category: category.into(),
            })
            .get()
    }
}

impl DecisionObserver for GateMetrics {
    fn observe(
        &self,
        _request: &RequestInfo,
        category: ResourceCategory,
        _session: Option<&Session>,
        decision: &Decision,
    ) {
        self.decisions
            .get_or_create(&DecisionLabels {
                outcome: decision.outcome().into(),
                category: category.as_str().into(),
            })
            .inc();
    }
}

/// Shared state for the health/metrics server
#[derive(Clone)]
pub struct HealthState {
    pub registry: Arc<Registry>,
    /// The session secret was generated but could not be persisted
    pub ephemeral_secret: bool,
}

/// Serve Prometheus metrics and health endpoints on `addr` (e.g. "127.0.0.1:9100")
pub async fn serve(addr: String, state: HealthState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("metrics bind {addr}: {e}"))?;

    tracing::info!(addr = %addr, "metrics: listening on /metrics, /healthz, /readyz");

    axum::serve(listener, router(state))
        .await
        .map_err(|e| anyhow::anyhow!("metrics server: {e}"))
}

fn router(state: HealthState) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/healthz", get(healthz_handler))
        .route("/readyz", get(readyz_handler))
        .with_state(state)
}

async fn metrics_handler(State(state): State<HealthState>) -> impl IntoResponse {
    let mut body = String::new();
    match encode(&mut body, &state.registry) {
        Ok(()) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4")],
            body,
        ),
        Err(e) => {
            tracing::error!("metrics encode failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                e.to_string(),
            )
        }
    }
}

/// Liveness probe: returns 200 if the process is running.
async fn healthz_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Readiness probe. An unpersisted secret still serves, but sessions will be
/// lost on restart, so say so.
async fn readyz_handler(State(state): State<HealthState>) -> impl IntoResponse {
    if state.ephemeral_secret {
        (StatusCode::OK, "ready (ephemeral session secret)")
    } else {
        (StatusCode::OK, "ready")
    }
}
