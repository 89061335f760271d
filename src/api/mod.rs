//! HTTP surface of the relay

pub mod handlers;
pub mod webhook;

use axum::{Router, routing};

use crate::SharedState;

pub use handlers::{root, status};
pub use webhook::{handle_contentful, handle_contentful_branch};

pub const DEFAULT_BRANCH: &str = "master";

/// Builds the application router
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", routing::get(root))
        .route("/status", routing::get(status))
        .route(
            "/webhooks/contentful/{org}/{repo}",
            routing::get(handle_contentful).post(handle_contentful),
        )
        .route(
            "/webhooks/contentful/{org}/{repo}/{branch}",
            routing::get(handle_contentful_branch).post(handle_contentful_branch),
        )
        .with_state(state)
}
