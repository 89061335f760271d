//! Relay configuration
//!
//! Settings come from the environment (optionally seeded by `.env`) and an
//! optional TOML file for the non-secret parts. Environment wins over the file.
//! Secrets are only ever read from the environment.

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{RelayError, Result};

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8888";
pub const DEFAULT_CONFIG_PATH: &str = "relay_config.toml";
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
pub const DEFAULT_GITHUB_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_LAMBCI_TIMEOUT_SECS: u64 = 30;

/// Token callers must present, also used as the HMAC key for LambCI.
#[derive(Clone, PartialEq, Eq)]
pub struct SharedSecret(String);

impl SharedSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Exact string comparison against a presented credential.
    pub fn matches(&self, candidate: &str) -> bool {
        self.0 == candidate
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret(***)")
    }
}

#[derive(Clone)]
pub struct GitHubSettings {
    pub api_url: String,
    pub token: Option<String>,
    pub timeout: Duration,
}

impl fmt::Debug for GitHubSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubSettings")
            .field("api_url", &self.api_url)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct LambciSettings {
    pub base_url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub shared_secret: SharedSecret,
    pub github: GitHubSettings,
    pub lambci: LambciSettings,
    pub bind_address: String,
    pub log_dir: Option<PathBuf>,
}

/// Shape of the optional TOML file
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub server: ServerSection,
    pub github: GitHubSection,
    pub lambci: LambciSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind_address: Option<String>,
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GitHubSection {
    pub api_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LambciSection {
    pub url: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl FileConfig {
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| RelayError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Reads the file at `path`; a missing file yields the empty config.
    pub fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|e| {
            RelayError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        Self::parse(&text)
    }
}

impl RelayConfig {
    /// Loads the config from the process environment plus the file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let file = FileConfig::read(path)?;
        Self::from_sources(file, |key| std::env::var(key).ok())
    }

    /// Builds the config from a parsed file and an environment lookup.
    /// Empty environment values count as unset.
    pub fn from_sources<F>(file: FileConfig, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let shared_secret = var("AUTH_TOKEN")
            .map(SharedSecret::new)
            .ok_or_else(|| RelayError::Config("AUTH_TOKEN must be set".to_string()))?;

        let lambci_url = var("LAMBCI_URL").or(file.lambci.url).ok_or_else(|| {
            RelayError::Config("LAMBCI_URL must be set (or [lambci] url)".to_string())
        })?;

        let github_timeout = match var("GITHUB_TIMEOUT_SECS") {
            Some(raw) => parse_secs("GITHUB_TIMEOUT_SECS", &raw)?,
            None => file
                .github
                .timeout_secs
                .unwrap_or(DEFAULT_GITHUB_TIMEOUT_SECS),
        };
        let lambci_timeout = match var("LAMBCI_TIMEOUT_SECS") {
            Some(raw) => parse_secs("LAMBCI_TIMEOUT_SECS", &raw)?,
            None => file
                .lambci
                .timeout_secs
                .unwrap_or(DEFAULT_LAMBCI_TIMEOUT_SECS),
        };

        Ok(Self {
            shared_secret,
            github: GitHubSettings {
                api_url: var("GITHUB_API_URL")
                    .or(file.github.api_url)
                    .unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string()),
                token: var("GITHUB_TOKEN"),
                timeout: Duration::from_secs(github_timeout),
            },
            lambci: LambciSettings {
                base_url: lambci_url.trim_end_matches('/').to_string(),
                timeout: Duration::from_secs(lambci_timeout),
            },
            bind_address: var("BIND_ADDRESS")
                .or(file.server.bind_address)
                .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            log_dir: var("LOG_DIR").map(PathBuf::from).or(file.server.log_dir),
        })
    }
}

fn parse_secs(key: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse()
        .map_err(|e| RelayError::Config(format!("{} must be a number of seconds: {}", key, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn minimal_env_uses_defaults() {
        let config = RelayConfig::from_sources(
            FileConfig::default(),
            env_of(&[("AUTH_TOKEN", "s3cret"), ("LAMBCI_URL", "https://ci.example.com/")]),
        )
        .unwrap();

        assert!(config.shared_secret.matches("s3cret"));
        assert_eq!(config.lambci.base_url, "https://ci.example.com");
        assert_eq!(config.github.api_url, DEFAULT_GITHUB_API_URL);
        assert_eq!(config.github.token, None);
        assert_eq!(config.github.timeout, Duration::from_secs(10));
        assert_eq!(config.lambci.timeout, Duration::from_secs(30));
        assert_eq!(config.bind_address, DEFAULT_BIND_ADDRESS);
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn missing_secret_is_rejected() {
        let err = RelayConfig::from_sources(
            FileConfig::default(),
            env_of(&[("AUTH_TOKEN", ""), ("LAMBCI_URL", "https://ci.example.com")]),
        )
        .unwrap_err();
        assert!(matches!(err, RelayError::Config(msg) if msg.contains("AUTH_TOKEN")));
    }

    #[test]
    fn missing_lambci_url_is_rejected() {
        let err =
            RelayConfig::from_sources(FileConfig::default(), env_of(&[("AUTH_TOKEN", "s3cret")]))
                .unwrap_err();
        assert!(matches!(err, RelayError::Config(msg) if msg.contains("LAMBCI_URL")));
    }

    #[test]
    fn env_overrides_file() {
        let file = FileConfig::parse(
            r#"
            [server]
            bind_address = "0.0.0.0:9000"
            log_dir = "/var/log/relay"

            [github]
            api_url = "https://ghe.example.com/api/v3"
            timeout_secs = 5

            [lambci]
            url = "https://file.example.com"
            timeout_secs = 60
            "#,
        )
        .unwrap();

        let config = RelayConfig::from_sources(
            file,
            env_of(&[
                ("AUTH_TOKEN", "s3cret"),
                ("LAMBCI_URL", "https://env.example.com"),
                ("GITHUB_TIMEOUT_SECS", "3"),
                ("GITHUB_TOKEN", "ghp_token"),
            ]),
        )
        .unwrap();

        assert_eq!(config.lambci.base_url, "https://env.example.com");
        assert_eq!(config.lambci.timeout, Duration::from_secs(60));
        assert_eq!(config.github.api_url, "https://ghe.example.com/api/v3");
        assert_eq!(config.github.timeout, Duration::from_secs(3));
        assert_eq!(config.github.token.as_deref(), Some("ghp_token"));
        assert_eq!(config.bind_address, "0.0.0.0:9000");
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/relay")));
    }

    #[test]
    fn bad_timeout_is_rejected() {
        let err = RelayConfig::from_sources(
            FileConfig::default(),
            env_of(&[
                ("AUTH_TOKEN", "s3cret"),
                ("LAMBCI_URL", "https://ci.example.com"),
                ("LAMBCI_TIMEOUT_SECS", "soon"),
            ]),
        )
        .unwrap_err();
        assert!(matches!(err, RelayError::Config(msg) if msg.contains("LAMBCI_TIMEOUT_SECS")));
    }

    #[test]
    fn malformed_file_is_rejected() {
        assert!(FileConfig::parse("[github\napi_url = 1").is_err());
    }

    #[test]
    fn missing_file_is_empty_config() {
        let file = FileConfig::read(Path::new("/nonexistent/relay_config.toml")).unwrap();
        assert!(file.lambci.url.is_none());
    }

    #[test]
    fn secrets_are_redacted_in_debug() {
        let config = RelayConfig::from_sources(
            FileConfig::default(),
            env_of(&[
                ("AUTH_TOKEN", "s3cret"),
                ("GITHUB_TOKEN", "ghp_token"),
                ("LAMBCI_URL", "https://ci.example.com"),
            ]),
        )
        .unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("s3cret"));
        assert!(!rendered.contains("ghp_token"));
    }
}
