pub mod api;
pub mod config;
pub mod error;
pub mod github;
pub mod logging;
pub mod relay;
pub mod utils;
pub mod webhook;

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;

use config::RelayConfig;
use error::Result;
use github::{BranchLookup, GitHubClient};
use relay::LambciClient;

pub struct AppState {
    pub config: RelayConfig,
    pub github: Arc<dyn BranchLookup>,
    pub lambci: LambciClient,
    pub start_time: Instant,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// State backed by the real GitHub API
    pub fn new(config: RelayConfig) -> Result<Self> {
        let github = Arc::new(GitHubClient::new(&config.github)?);
        Self::with_lookup(config, github)
    }

    /// State with a caller-supplied branch source
    pub fn with_lookup(config: RelayConfig, github: Arc<dyn BranchLookup>) -> Result<Self> {
        let lambci = LambciClient::new(&config.lambci)?;
        Ok(Self {
            config,
            github,
            lambci,
            start_time: Instant::now(),
            started_at: Utc::now(),
        })
    }
}

pub type SharedState = Arc<AppState>;
