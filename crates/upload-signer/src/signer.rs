//! Signing of direct-upload authentication parameters.

use std::time::{SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use uuid::Uuid;

use crate::config::UploadSignerConfig;
use crate::error::{Result, UploadSignerError};

type HmacSha1 = Hmac<Sha1>;

/// Parameters a browser presents to the CDN to authorize one upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticationParameters {
    /// Single-use token.
    pub token: String,
    /// Unix timestamp (seconds) after which the parameters are rejected.
    pub expire: u64,
    /// Hex HMAC-SHA1 of `token` followed by `expire`, keyed with the private key.
    pub signature: String,
}

/// Issues signed upload parameters.
#[derive(Debug, Clone)]
pub struct UploadSigner {
    config: UploadSignerConfig,
}

impl UploadSigner {
    /// Create a signer from a validated configuration.
    pub fn new(config: UploadSignerConfig) -> Result<Self> {
        config.validate()?;
        tracing::info!(endpoint = %config.url_endpoint, "Upload signer configured");
        Ok(Self { config })
    }

    /// Create a signer from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(UploadSignerConfig::from_env()?)
    }

    /// Get the configuration.
    pub fn config(&self) -> &UploadSignerConfig {
        &self.config
    }

    /// Issue parameters with a fresh token and the configured lifetime.
    pub fn authentication_parameters(&self) -> Result<AuthenticationParameters> {
        self.authentication_parameters_with(None, None)
    }

    /// Issue parameters with a caller-chosen token and/or expiry.
    ///
    /// A missing or empty token is replaced by a fresh UUID; a missing expiry
    /// defaults to now plus the configured lifetime.
    pub fn authentication_parameters_with(
        &self,
        token: Option<&str>,
        expire: Option<u64>,
    ) -> Result<AuthenticationParameters> {
        let token = match token {
            Some(token) if !token.is_empty() => token.to_string(),
            _ => Uuid::new_v4().to_string(),
        };
        let expire = expire.unwrap_or_else(|| unix_timestamp() + self.config.expire_secs);
        let signature = sign(&self.config.private_key, &format!("{}{}", token, expire))?;

        tracing::debug!(expire, "Issued upload parameters");

        Ok(AuthenticationParameters {
            token,
            expire,
            signature,
        })
    }
}

/// Lowercase hex HMAC-SHA1 of `payload` keyed with `key`.
pub(crate) fn sign(key: &str, payload: &str) -> Result<String> {
    let mut mac = HmacSha1::new_from_slice(key.as_bytes())
        .map_err(|e| UploadSignerError::Config(format!("unusable signing key: {}", e)))?;
    mac.update(payload.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> UploadSigner {
        UploadSigner::new(UploadSignerConfig::new(
            "public_key_test",
            "private_key_test",
            "https://ik.example/demo",
        ))
        .unwrap()
    }

    #[test]
    fn test_hmac_sha1_known_vector() {
        assert_eq!(
            sign("key", "The quick brown fox jumps over the lazy dog").unwrap(),
            "de7c9b85b8b78aa6bc8a7a36f70a90701c9db4d9"
        );
    }

    #[test]
    fn test_signature_covers_token_and_expire() {
        let params = signer()
            .authentication_parameters_with(Some("your_token"), Some(1582269249))
            .unwrap();
        assert_eq!(params.token, "your_token");
        assert_eq!(params.expire, 1582269249);
        assert_eq!(
            params.signature,
            sign("private_key_test", "your_token1582269249").unwrap()
        );
        assert_eq!(params.signature.len(), 40);
    }

    #[test]
    fn test_default_parameters() {
        let before = unix_timestamp();
        let params = signer().authentication_parameters().unwrap();
        let after = unix_timestamp();

        assert!(Uuid::parse_str(&params.token).is_ok());
        assert!(params.expire >= before + crate::config::DEFAULT_EXPIRE_SECS);
        assert!(params.expire <= after + crate::config::DEFAULT_EXPIRE_SECS);
        assert_eq!(
            params.signature,
            sign("private_key_test", &format!("{}{}", params.token, params.expire)).unwrap()
        );
    }

    #[test]
    fn test_tokens_are_fresh() {
        let signer = signer();
        let a = signer.authentication_parameters().unwrap();
        let b = signer.authentication_parameters_with(Some(""), None).unwrap();
        assert_ne!(a.token, b.token);
    }

    #[test]
    fn test_wire_shape() {
        let params = signer().authentication_parameters_with(Some("t"), Some(10)).unwrap();
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["token"], "t");
        assert_eq!(json["expire"], 10);
        assert!(json["signature"].is_string());
    }
}
