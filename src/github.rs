//! Branch lookups against the GitHub REST API

use async_trait::async_trait;
use reqwest::{StatusCode, Url, header};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::GitHubSettings;
use crate::error::{RelayError, Result};
use crate::webhook::BranchSnapshot;

const USER_AGENT: &str = concat!("contentful-lambci-relay/", env!("CARGO_PKG_VERSION"));

/// Source of branch state for the relay
#[async_trait]
pub trait BranchLookup: Send + Sync {
    /// Resolves `org/repo` and then `branch` within it.
    ///
    /// Returns [`RelayError::RepositoryNotFound`] or
    /// [`RelayError::BranchNotFound`] when either does not exist.
    async fn fetch_branch(&self, org: &str, repo: &str, branch: &str) -> Result<BranchSnapshot>;
}

#[derive(Debug, Deserialize)]
struct RepositoryResponse {
    full_name: String,
    private: bool,
    clone_url: String,
}

#[derive(Debug, Deserialize)]
struct BranchResponse {
    commit: BranchCommit,
}

#[derive(Debug, Deserialize)]
struct BranchCommit {
    sha: String,
    commit: GitCommit,
    /// GitHub account linked to the commit author, if any
    author: Option<Account>,
}

#[derive(Debug, Deserialize)]
struct GitCommit {
    message: String,
    tree: Tree,
    author: Option<GitAuthor>,
}

#[derive(Debug, Deserialize)]
struct Tree {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct GitAuthor {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Account {
    login: String,
}

pub struct GitHubClient {
    http: reqwest::Client,
    api_url: Url,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(settings: &GitHubSettings) -> Result<Self> {
        let api_url = Url::parse(&settings.api_url).map_err(|e| {
            RelayError::Config(format!("Invalid GitHub API URL '{}': {}", settings.api_url, e))
        })?;
        if api_url.cannot_be_a_base() {
            return Err(RelayError::Config(format!(
                "Invalid GitHub API URL '{}'",
                settings.api_url
            )));
        }
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| RelayError::Config(format!("Failed to build GitHub client: {}", e)))?;

        Ok(Self {
            http,
            api_url,
            token: settings.token.clone(),
        })
    }

    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.api_url.clone();
        // Checked for cannot-be-a-base in new(), so this always succeeds.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// GET a resource, mapping 404 to `Ok(None)`
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>> {
        debug!("GET {}", url);
        let mut request = self
            .http
            .get(url.clone())
            .header(header::ACCEPT, "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                RelayError::HostingProvider(format!("GET {} timed out", url))
            } else {
                RelayError::HostingProvider(format!("GET {} failed: {}", url, e))
            }
        })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => response.json::<T>().await.map(Some).map_err(|e| {
                RelayError::HostingProvider(format!("Unexpected response from {}: {}", url, e))
            }),
            status => Err(RelayError::HostingProvider(format!(
                "GET {} returned {}",
                url, status
            ))),
        }
    }
}

#[async_trait]
impl BranchLookup for GitHubClient {
    async fn fetch_branch(&self, org: &str, repo: &str, branch: &str) -> Result<BranchSnapshot> {
        let full_name = format!("{}/{}", org, repo);

        // Url drops `.` and `..` segments, which would address some other resource.
        if !is_plain_segment(org) || !is_plain_segment(repo) {
            return Err(RelayError::RepositoryNotFound { full_name });
        }
        if !branch.split('/').all(is_plain_segment) {
            return Err(RelayError::BranchNotFound {
                full_name,
                branch: branch.to_string(),
            });
        }

        let repository: RepositoryResponse = self
            .get_json(self.endpoint(["repos", org, repo]))
            .await?
            .ok_or_else(|| RelayError::RepositoryNotFound {
                full_name: full_name.clone(),
            })?;

        // Slashes in branch names are path separators on GitHub's side.
        let branch_url = self.endpoint(
            ["repos", org, repo, "branches"]
                .into_iter()
                .chain(branch.split('/')),
        );
        let found: BranchResponse =
            self.get_json(branch_url)
                .await?
                .ok_or_else(|| RelayError::BranchNotFound {
                    full_name,
                    branch: branch.to_string(),
                })?;

        // The requested name, even if GitHub answered for a renamed branch.
        Ok(BranchSnapshot {
            branch: branch.to_string(),
            commit_sha: found.commit.sha,
            commit_message: found.commit.commit.message,
            tree_sha: found.commit.commit.tree.sha,
            author_name: found
                .commit
                .commit
                .author
                .map(|a| a.name)
                .unwrap_or_default(),
            author_login: found.commit.author.map(|a| a.login),
            repository_full_name: repository.full_name,
            repository_private: repository.private,
            clone_url: repository.clone_url,
        })
    }
}

fn is_plain_segment(segment: &str) -> bool {
    !segment.is_empty() && segment != "." && segment != ".."
}
