use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;

use crate::error::{RelayError, Result};

type HmacSha1 = Hmac<Sha1>;
type HmacSha256 = Hmac<Sha256>;

/// Extracts the bearer credential from an `Authorization` header value.
/// A value without the `Bearer ` prefix is taken as the credential itself.
pub fn bearer_token(header: &str) -> &str {
    header.strip_prefix("Bearer ").unwrap_or(header)
}

/// Signs a payload the way GitHub does for `X-Hub-Signature`: "sha1=<hex>"
pub fn sign_payload(secret: &str, payload: &[u8]) -> Result<String> {
    let mut mac = HmacSha1::new_from_slice(secret.as_bytes())
        .map_err(|e| RelayError::Config(format!("Invalid signing key: {}", e)))?;
    mac.update(payload);
    Ok(format!("sha1={}", hex::encode(mac.finalize().into_bytes())))
}

/// Same as [`sign_payload`] for `X-Hub-Signature-256`: "sha256=<hex>"
pub fn sign_payload_sha256(secret: &str, payload: &[u8]) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| RelayError::Config(format!("Invalid signing key: {}", e)))?;
    mac.update(payload);
    Ok(format!("sha256={}", hex::encode(mac.finalize().into_bytes())))
}
