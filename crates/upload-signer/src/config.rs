//! Configuration for the upload signer.

use std::env;

use crate::error::{Result, UploadSignerError};

/// Default lifetime of issued parameters, in seconds.
pub const DEFAULT_EXPIRE_SECS: u64 = 30 * 60;

/// Longest lifetime the CDN accepts, in seconds.
pub const MAX_EXPIRE_SECS: u64 = 60 * 60;

/// Upload signer configuration.
#[derive(Clone)]
pub struct UploadSignerConfig {
    /// Public key, shared with the browser client.
    pub public_key: String,
    /// Private key used to sign parameters. Never sent to clients.
    pub private_key: String,
    /// CDN URL endpoint images are served from.
    pub url_endpoint: String,
    /// Lifetime of issued parameters, in seconds.
    pub expire_secs: u64,
}

impl std::fmt::Debug for UploadSignerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadSignerConfig")
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .field("url_endpoint", &self.url_endpoint)
            .field("expire_secs", &self.expire_secs)
            .finish()
    }
}

impl UploadSignerConfig {
    /// Create a config with the default lifetime.
    pub fn new(
        public_key: impl Into<String>,
        private_key: impl Into<String>,
        url_endpoint: impl Into<String>,
    ) -> Self {
        Self {
            public_key: public_key.into(),
            private_key: private_key.into(),
            url_endpoint: url_endpoint.into(),
            expire_secs: DEFAULT_EXPIRE_SECS,
        }
    }

    /// Set the lifetime of issued parameters.
    pub fn with_expire_secs(mut self, expire_secs: u64) -> Self {
        self.expire_secs = expire_secs;
        self
    }

    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `IMAGE_KIT_PUBLIC_KEY` | CDN public key | (required) |
    /// | `IMAGE_KIT_PRIVATE_KEY` | CDN private key | (required) |
    /// | `IMAGE_KIT_ENDPOINT` | CDN URL endpoint | (required) |
    /// | `IMAGE_KIT_EXPIRE_SECS` | Parameter lifetime | `1800` |
    pub fn from_env() -> Result<Self> {
        let public_key = required("IMAGE_KIT_PUBLIC_KEY")?;
        let private_key = required("IMAGE_KIT_PRIVATE_KEY")?;
        let url_endpoint = required("IMAGE_KIT_ENDPOINT")?;

        let expire_secs = match env::var("IMAGE_KIT_EXPIRE_SECS") {
            Ok(value) => value.trim().parse().map_err(|_| UploadSignerError::InvalidVar {
                var: "IMAGE_KIT_EXPIRE_SECS",
                reason: format!("not a number: {}", value),
            })?,
            Err(_) => DEFAULT_EXPIRE_SECS,
        };

        let config = Self {
            public_key,
            private_key,
            url_endpoint,
            expire_secs,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        if self.private_key.is_empty() {
            return Err(UploadSignerError::Config("private key is empty".to_string()));
        }
        if self.expire_secs == 0 || self.expire_secs > MAX_EXPIRE_SECS {
            return Err(UploadSignerError::Config(format!(
                "expire_secs must be between 1 and {}",
                MAX_EXPIRE_SECS
            )));
        }
        Ok(())
    }
}

fn required(var: &'static str) -> Result<String> {
    env::var(var)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or(UploadSignerError::MissingVar(var))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_private_key() {
        let config = UploadSignerConfig::new("public_abc", "private_xyz", "https://ik.example/demo");
        let printed = format!("{:?}", config);
        assert!(printed.contains("public_abc"));
        assert!(!printed.contains("private_xyz"));
    }

    #[test]
    fn test_validate_expire_bounds() {
        let config = UploadSignerConfig::new("p", "k", "e");
        assert!(config.validate().is_ok());
        assert!(config.clone().with_expire_secs(0).validate().is_err());
        assert!(config.with_expire_secs(MAX_EXPIRE_SECS + 1).validate().is_err());
    }

    #[test]
    fn test_from_env_scenarios() {
        use std::sync::Mutex;
        static ENV_LOCK: Mutex<()> = Mutex::new(());
        let _guard = ENV_LOCK.lock().unwrap();

        fn clear_all() {
            std::env::remove_var("IMAGE_KIT_PUBLIC_KEY");
            std::env::remove_var("IMAGE_KIT_PRIVATE_KEY");
            std::env::remove_var("IMAGE_KIT_ENDPOINT");
            std::env::remove_var("IMAGE_KIT_EXPIRE_SECS");
        }

        clear_all();
        assert!(matches!(
            UploadSignerConfig::from_env(),
            Err(UploadSignerError::MissingVar("IMAGE_KIT_PUBLIC_KEY"))
        ));

        std::env::set_var("IMAGE_KIT_PUBLIC_KEY", "public_abc");
        std::env::set_var("IMAGE_KIT_PRIVATE_KEY", "private_xyz");
        std::env::set_var("IMAGE_KIT_ENDPOINT", "https://ik.example/demo");
        let config = UploadSignerConfig::from_env().unwrap();
        assert_eq!(config.expire_secs, DEFAULT_EXPIRE_SECS);
        assert_eq!(config.url_endpoint, "https://ik.example/demo");

        std::env::set_var("IMAGE_KIT_EXPIRE_SECS", "soon");
        assert!(matches!(
            UploadSignerConfig::from_env(),
            Err(UploadSignerError::InvalidVar { .. })
        ));

        std::env::set_var("IMAGE_KIT_EXPIRE_SECS", "600");
        assert_eq!(UploadSignerConfig::from_env().unwrap().expire_secs, 600);

        clear_all();
    }
}
