//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;

/// Which chat model backs the answer route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelProvider {
    /// Hosted Gemini model (`GEMINI_*` variables).
    Gemini,
    /// Local echo model, for development.
    Mock,
    /// No model; the answer route returns 503.
    None,
}

/// Session token verification settings.
#[derive(Clone, Default)]
pub struct AuthConfig {
    /// PEM-encoded RSA public key of the identity provider (RS256).
    pub jwt_public_key: Option<String>,
    /// Shared secret (HS256).
    pub jwt_secret: Option<String>,
    /// Accepted `iss` values; empty accepts any issuer.
    pub issuers: Vec<String>,
    /// Accepted `azp` values; empty accepts any party.
    pub authorized_parties: Vec<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_public_key", &self.jwt_public_key.as_ref().map(|_| "<set>"))
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "<redacted>"))
            .field("issuers", &self.issuers)
            .field("authorized_parties", &self.authorized_parties)
            .finish()
    }
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// SQLite database URL.
    pub database_url: String,
    /// Database connection pool size.
    pub database_pool_size: u32,
    /// Origins allowed to call the API from a browser.
    pub allowed_origins: Vec<String>,
    /// Session verification.
    pub auth: AuthConfig,
    /// Model behind the answer route.
    pub model_provider: ModelProvider,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `API_ADDR` | Server bind address | `127.0.0.1:3000` |
    /// | `PORT` | Port on all interfaces, used when `API_ADDR` is unset | |
    /// | `DATABASE_URL` | SQLite database URL | `sqlite:chat.db?mode=rwc` |
    /// | `DATABASE_POOL_SIZE` | Connection pool size | `10` |
    /// | `CORS_ALLOWED_ORIGINS` | Comma-separated origins | `CLIENT_URL` |
    /// | `AUTH_JWT_PUBLIC_KEY` / `CLERK_JWT_KEY` | RS256 PEM key | |
    /// | `AUTH_JWT_SECRET` | HS256 secret | |
    /// | `AUTH_ISSUERS` | Comma-separated accepted issuers | (any) |
    /// | `AUTH_AUTHORIZED_PARTIES` | Comma-separated accepted `azp` | (any) |
    /// | `MODEL_PROVIDER` | `gemini`, `mock` or `none` | `gemini` if `GEMINI_API_KEY` is set |
    ///
    /// One of the two JWT keys is required.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let addr = match (var("API_ADDR"), var("PORT")) {
            (Some(addr), _) => addr
                .parse::<SocketAddr>()
                .map_err(|_| ConfigError::InvalidAddr(addr))?,
            (None, Some(port)) => {
                let port: u16 = port
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidPort(port.clone()))?;
                SocketAddr::from(([0, 0, 0, 0], port))
            }
            (None, None) => SocketAddr::from(([127, 0, 0, 1], 3000)),
        };

        let database_url =
            var("DATABASE_URL").unwrap_or_else(|| "sqlite:chat.db?mode=rwc".to_string());

        let database_pool_size = match var("DATABASE_POOL_SIZE") {
            Some(size) => size
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|size| *size > 0)
                .ok_or(ConfigError::InvalidPoolSize(size))?,
            None => database::Database::DEFAULT_POOL_SIZE,
        };

        let allowed_origins = var("CORS_ALLOWED_ORIGINS")
            .or_else(|| var("CLIENT_URL"))
            .map(|origins| split_list(&origins))
            .unwrap_or_default();

        if allowed_origins.iter().any(|origin| origin == "*") {
            return Err(ConfigError::WildcardOrigin);
        }

        let auth = AuthConfig {
            jwt_public_key: var("AUTH_JWT_PUBLIC_KEY")
                .or_else(|| var("CLERK_JWT_KEY"))
                .map(|pem| pem.replace("\\n", "\n")),
            jwt_secret: var("AUTH_JWT_SECRET"),
            issuers: var("AUTH_ISSUERS").map(|v| split_list(&v)).unwrap_or_default(),
            authorized_parties: var("AUTH_AUTHORIZED_PARTIES")
                .map(|v| split_list(&v))
                .unwrap_or_default(),
        };

        if auth.jwt_public_key.is_none() && auth.jwt_secret.is_none() {
            return Err(ConfigError::MissingAuthKey);
        }

        let model_provider = match var("MODEL_PROVIDER") {
            Some(provider) => match provider.trim().to_lowercase().as_str() {
                "gemini" => ModelProvider::Gemini,
                "mock" => ModelProvider::Mock,
                "none" => ModelProvider::None,
                _ => return Err(ConfigError::InvalidModelProvider(provider)),
            },
            None if var("GEMINI_API_KEY").is_some() => ModelProvider::Gemini,
            None => ModelProvider::None,
        };

        Ok(Self {
            addr,
            database_url,
            database_pool_size,
            allowed_origins,
            auth,
            model_provider,
        })
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|item| item.trim().trim_end_matches('/').to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid API_ADDR format: {0}")]
    InvalidAddr(String),

    #[error("Invalid PORT: {0}")]
    InvalidPort(String),

    #[error("Invalid DATABASE_POOL_SIZE: {0}")]
    InvalidPoolSize(String),

    #[error("CORS origins must be listed explicitly; '*' cannot be used with credentials")]
    WildcardOrigin,

    #[error("AUTH_JWT_PUBLIC_KEY (or CLERK_JWT_KEY) or AUTH_JWT_SECRET is required")]
    MissingAuthKey,

    #[error("Invalid MODEL_PROVIDER (expected gemini, mock or none): {0}")]
    InvalidModelProvider(String),
}
