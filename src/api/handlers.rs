//! Service banner and status endpoints

use axum::{Json, extract::State as AxumState};
use serde::Serialize;

use crate::SharedState;

/// Status report; never includes secrets
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub name: &'static str,
    pub version: &'static str,
    pub started_at: String,
    pub uptime_seconds: u64,
    pub relay_url: String,
    pub github_api_url: String,
}

pub async fn root() -> &'static str {
    "contentful_lambci_relay - healthy"
}

/// GET /status
pub async fn status(AxumState(state): AxumState<SharedState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        started_at: state.started_at.to_rfc3339(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        relay_url: state.lambci.webhook_url().to_string(),
        github_api_url: state.config.github.api_url.clone(),
    })
}
