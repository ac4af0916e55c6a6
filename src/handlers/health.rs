//! Health check handlers
//!
//! Service banner, liveness, and reachability of the upstream endpoints

use crate::handlers::AppState;
use crate::models::StatusReport;
use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// `GET /` body
#[derive(Debug, Serialize, Deserialize)]
pub struct HomeResponse {
    pub status: String,
    pub service: String,
    pub developer: String,
    pub github: String,
    pub channel: String,
    pub timestamp: String,
}

/// `GET /health` body
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub bot_status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub timestamp: String,
}

/// Service banner
///
/// GET /
pub async fn home(State(state): State<Arc<AppState>>) -> Json<HomeResponse> {
    let credits = &state.config.credits;
    Json(HomeResponse {
        status: "online".to_string(),
        service: credits.service.clone(),
        developer: credits.developer.clone(),
        github: credits.github.clone(),
        channel: credits.channel.clone(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Liveness check
///
/// GET /health
/// Does not touch external dependencies
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    debug!("Executing health check");

    Json(HealthResponse {
        status: "healthy".to_string(),
        bot_status: if state.is_bot_running() { "running" } else { "stopped" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: get_uptime_seconds(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Reachability of every configured endpoint
///
/// GET /api/status
pub async fn api_status(State(state): State<Arc<AppState>>) -> Json<StatusReport> {
    debug!("Checking upstream reachability");
    Json(state.status.check_all().await)
}

/// Get service uptime in seconds
pub fn get_uptime_seconds() -> u64 {
    use std::sync::OnceLock;
    use std::time::Instant;

    static START_TIME: OnceLock<Instant> = OnceLock::new();

    START_TIME.get_or_init(Instant::now).elapsed().as_secs()
}
