//! HTTP handlers: trigger, health, and operational introspection.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::{info, warn};

use telepull_connector::{PointerStore, TickReport, TriggerKind};
use telepull_core::CursorSet;

use crate::state::AppState;

// ── Trigger ───────────────────────────────────────────────────────

/// Scheduled-trigger entry point.
///
/// Returns 200 with the literal body `Success` so external schedulers can
/// string-match the ack, or 500 with the error message.
pub async fn tick(State(state): State<Arc<AppState>>) -> (StatusCode, String) {
    match state.runner.run(TriggerKind::Manual).await {
        Ok(report) => {
            info!(
                tick = %report.id,
                records = report.records_fetched,
                advanced = report.cursors_advanced.len(),
                duration_ms = report.duration_ms,
                "tick succeeded"
            );
            (StatusCode::OK, "Success".to_string())
        }
        Err(e) => {
            warn!(error = %e, "tick failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

// ── Health ────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub channels_tracked: usize,
    pub ticks_recorded: usize,
    pub started_at: String,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let channels_tracked = state
        .store
        .list_all()
        .await
        .map(|c| c.len())
        .unwrap_or(0);
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        channels_tracked,
        ticks_recorded: state.runner.recent().await.len(),
        started_at: state.started_at.to_rfc3339(),
    })
}

// ── Introspection ─────────────────────────────────────────────────

/// Current cursor set.
pub async fn pointers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CursorSet>, (StatusCode, String)> {
    match state.store.list_all().await {
        Ok(set) => Ok(Json(set)),
        Err(e) => Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}

/// Recent tick reports, oldest first.
pub async fn ticks(State(state): State<Arc<AppState>>) -> Json<Vec<TickReport>> {
    Json(state.runner.recent().await)
}

/// Redacted configuration view.
pub async fn config(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(state.config.redacted_summary())
}
