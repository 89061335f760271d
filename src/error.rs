use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{error, warn};

/// Error type for everything the relay can fail at
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("bad token")]
    Unauthorized,

    #[error("no repo: {full_name}")]
    RepositoryNotFound { full_name: String },

    #[error("no branch '{branch}' in {full_name}")]
    BranchNotFound { full_name: String, branch: String },

    #[error("Hosting provider lookup failed: {0}")]
    HostingProvider(String),

    #[error("Downstream relay failed: {0}")]
    RelayFailed(String),

    #[error("Downstream relay timed out")]
    RelayTimedOut,

    #[error("Configuration error: {0}")]
    Config(String),
}

impl RelayError {
    /// Status code the caller sees for this error.
    ///
    /// Authentication and lookup failures all collapse to 404 so a caller
    /// cannot tell a bad token from a missing repository or branch.
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::Unauthorized
            | RelayError::RepositoryNotFound { .. }
            | RelayError::BranchNotFound { .. } => StatusCode::NOT_FOUND,
            RelayError::HostingProvider(_) | RelayError::RelayFailed(_) => StatusCode::BAD_GATEWAY,
            RelayError::RelayTimedOut => StatusCode::GATEWAY_TIMEOUT,
            RelayError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_body(&self) -> &'static str {
        match self {
            RelayError::Unauthorized
            | RelayError::RepositoryNotFound { .. }
            | RelayError::BranchNotFound { .. } => "",
            RelayError::HostingProvider(_) => "hosting provider lookup failed",
            RelayError::RelayFailed(_) => "downstream relay failed",
            RelayError::RelayTimedOut => "downstream relay timed out",
            RelayError::Config(_) => "relay misconfigured",
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status == StatusCode::NOT_FOUND {
            warn!("{}", self);
        } else {
            error!("{}", self);
        }
        (status, self.public_body()).into_response()
    }
}

/// Helper type for Results that use RelayError
pub type Result<T> = std::result::Result<T, RelayError>;
