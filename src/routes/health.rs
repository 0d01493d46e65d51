use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/info", get(info))
        .route("/live", get(live))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    timestamp: String,
    vocab_source: &'static str,
    active_sessions: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthInfoResponse {
    service: &'static str,
    version: String,
    start_time: String,
    uptime: u64,
    auto_advance_ms: u64,
}

#[derive(Serialize)]
struct LivenessResponse {
    status: &'static str,
    timestamp: String,
    uptime: u64,
}

async fn root(State(state): State<AppState>) -> impl IntoResponse {
    // fallback vocabulary keeps the service usable, so an unconfigured source is not degraded
    let vocab_source = if state.fetcher().is_configured() {
        "notion"
    } else {
        "fallback"
    };

    Json(HealthResponse {
        status: "ok",
        timestamp: now_iso(),
        vocab_source,
        active_sessions: state.sessions().len(),
    })
}

async fn info(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthInfoResponse {
        service: "tango-backend",
        version: std::env::var("APP_VERSION")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string()),
        start_time: system_time_iso(state.started_at_system()),
        uptime: state.uptime_seconds(),
        auto_advance_ms: state.config().auto_advance.as_millis() as u64,
    })
}

async fn live(State(state): State<AppState>) -> impl IntoResponse {
    Json(LivenessResponse {
        status: "healthy",
        timestamp: now_iso(),
        uptime: state.uptime_seconds(),
    })
}

fn system_time_iso(time: std::time::SystemTime) -> String {
    let datetime: chrono::DateTime<chrono::Utc> = time.into();
    datetime.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
