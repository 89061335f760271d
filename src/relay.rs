//! Delivery of signed push events to LambCI

use axum::body::Bytes;
use reqwest::{StatusCode, header};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::LambciSettings;
use crate::error::{RelayError, Result};

/// Whatever LambCI answered, passed back to the caller untouched
#[derive(Debug, Clone)]
pub struct RelayResponse {
    pub status: StatusCode,
    pub content_type: Option<header::HeaderValue>,
    pub body: Bytes,
}

pub struct LambciClient {
    http: reqwest::Client,
    webhook_url: String,
}

impl LambciClient {
    pub fn new(settings: &LambciSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| RelayError::Config(format!("Failed to build LambCI client: {}", e)))?;

        Ok(Self {
            http,
            webhook_url: format!("{}/lambci/webhook", settings.base_url.trim_end_matches('/')),
        })
    }

    pub fn webhook_url(&self) -> &str {
        &self.webhook_url
    }

    /// POSTs the payload as a GitHub `push` delivery. Any HTTP status counts
    /// as delivered; only transport failures are errors. No retries.
    pub async fn deliver(
        &self,
        payload: Vec<u8>,
        signature: &str,
        signature_256: &str,
    ) -> Result<RelayResponse> {
        let delivery_id = Uuid::new_v4();
        debug!("Delivering {} to {}", delivery_id, self.webhook_url);

        let response = self
            .http
            .post(&self.webhook_url)
            .header(header::CONTENT_TYPE, "application/json")
            .header("X-GitHub-Event", "push")
            .header("X-GitHub-Delivery", delivery_id.to_string())
            .header("X-Hub-Signature", signature)
            .header("X-Hub-Signature-256", signature_256)
            .body(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RelayError::RelayTimedOut
                } else {
                    RelayError::RelayFailed(e.to_string())
                }
            })?;

        let status = response.status();
        let content_type = response.headers().get(header::CONTENT_TYPE).cloned();
        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                RelayError::RelayTimedOut
            } else {
                RelayError::RelayFailed(format!("Failed to read response body: {}", e))
            }
        })?;

        info!("Delivery {} answered with {}", delivery_id, status);
        Ok(RelayResponse {
            status,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn webhook_url_is_under_lambci_path() {
        let client = LambciClient::new(&LambciSettings {
            base_url: "https://ci.example.com/".to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap();
        assert_eq!(client.webhook_url(), "https://ci.example.com/lambci/webhook");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_relay_failure() {
        // Bind then drop to get a port with nothing listening.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = LambciClient::new(&LambciSettings {
            base_url: format!("http://{}", addr),
            timeout: Duration::from_secs(2),
        })
        .unwrap();
        let err = client
            .deliver(b"{}".to_vec(), "sha1=00", "sha256=00")
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::RelayFailed(_)));
    }
}
