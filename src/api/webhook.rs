//! Contentful webhook handler: turns a content notification into a signed
//! LambCI push delivery for the current head of a branch.

use axum::{
    extract::{Path, State as AxumState},
    http::{HeaderMap, header},
    response::{IntoResponse, Response},
};
use tracing::{info, instrument};

use crate::AppState;
use crate::SharedState;
use crate::api::DEFAULT_BRANCH;
use crate::error::{RelayError, Result};
use crate::relay::RelayResponse;
use crate::utils::{bearer_token, sign_payload, sign_payload_sha256};
use crate::webhook::PushPayload;

/// GET|POST /webhooks/contentful/{org}/{repo}
pub async fn handle_contentful(
    AxumState(state): AxumState<SharedState>,
    Path((org, repo)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    relay_and_respond(&state, &org, &repo, DEFAULT_BRANCH, &headers).await
}

/// GET|POST /webhooks/contentful/{org}/{repo}/{branch}
pub async fn handle_contentful_branch(
    AxumState(state): AxumState<SharedState>,
    Path((org, repo, branch)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Response {
    relay_and_respond(&state, &org, &repo, &branch, &headers).await
}

/// Runs the relay and maps its outcome, all inside one span so error lines
/// carry the org, repo and branch.
#[instrument(name = "contentful", skip(state, headers))]
async fn relay_and_respond(
    state: &AppState,
    org: &str,
    repo: &str,
    branch: &str,
    headers: &HeaderMap,
) -> Response {
    respond(relay_branch(state, org, repo, branch, authorization(headers)).await)
}

fn authorization(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
}

fn respond(result: Result<RelayResponse>) -> Response {
    match result {
        Ok(relayed) => {
            let mut response = (relayed.status, relayed.body).into_response();
            match relayed.content_type {
                Some(content_type) => {
                    response
                        .headers_mut()
                        .insert(header::CONTENT_TYPE, content_type);
                }
                None => {
                    response.headers_mut().remove(header::CONTENT_TYPE);
                }
            }
            response
        }
        Err(e) => e.into_response(),
    }
}

/// Authenticates the caller, looks up the branch, and relays a signed push
/// event to LambCI. Nothing is sent downstream unless every check passes.
pub async fn relay_branch(
    state: &AppState,
    org: &str,
    repo: &str,
    branch: &str,
    auth_header: Option<&str>,
) -> Result<RelayResponse> {
    let token = auth_header.map(bearer_token).ok_or(RelayError::Unauthorized)?;
    if !state.config.shared_secret.matches(token) {
        return Err(RelayError::Unauthorized);
    }

    let snapshot = state.github.fetch_branch(org, repo, branch).await?;

    let payload = PushPayload::from_snapshot(&snapshot)
        .to_bytes()
        .map_err(|e| RelayError::RelayFailed(format!("Failed to serialize payload: {}", e)))?;
    let secret = state.config.shared_secret.expose();
    let signature = sign_payload(secret, &payload)?;
    let signature_256 = sign_payload_sha256(secret, &payload)?;

    info!(
        "Relaying {} at {} to {}",
        snapshot.repository_full_name,
        snapshot.commit_sha,
        state.lambci.webhook_url()
    );
    state.lambci.deliver(payload, &signature, &signature_256).await
}
