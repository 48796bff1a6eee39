//! Session authentication.
//!
//! Protected routes require a session JWT issued by the identity provider,
//! sent either as `Authorization: Bearer <token>` or in the `__session`
//! cookie. The token is verified locally against the provider's public key
//! (RS256) or a shared secret (HS256); its subject is the user id.

use axum::extract::{Request, State};
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use thiserror::Error;

use crate::config::AuthConfig;
use crate::error::ApiError;
use crate::state::AppState;

/// Cookie the identity provider stores the session token in.
pub const SESSION_COOKIE: &str = "__session";

/// Allowed clock skew when checking `exp` and `nbf`, in seconds.
const LEEWAY_SECS: u64 = 5;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing session token")]
    MissingToken,

    #[error("invalid session token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("session token has no subject")]
    MissingSubject,

    #[error("unauthorized party: {0}")]
    UnauthorizedParty(String),

    #[error("auth configuration error: {0}")]
    Configuration(String),
}

/// The authenticated caller, available to handlers as an extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: String,
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    #[serde(default)]
    sid: Option<String>,
    #[serde(default)]
    azp: Option<String>,
}

/// Verifies session tokens.
#[derive(Clone)]
pub struct SessionVerifier {
    key: DecodingKey,
    validation: Validation,
    authorized_parties: Vec<String>,
}

impl SessionVerifier {
    /// Build a verifier from configuration, preferring the public key.
    pub fn from_config(config: &AuthConfig) -> Result<Self, AuthError> {
        let mut verifier = if let Some(pem) = &config.jwt_public_key {
            Self::rs256_pem(pem.as_bytes())?
        } else if let Some(secret) = &config.jwt_secret {
            Self::hs256(secret.as_bytes())
        } else {
            return Err(AuthError::Configuration(
                "no session verification key configured".to_string(),
            ));
        };

        if !config.issuers.is_empty() {
            verifier.validation.set_issuer(&config.issuers);
            verifier.validation.set_required_spec_claims(&["exp", "iss"]);
        }
        verifier.authorized_parties = config.authorized_parties.clone();
        Ok(verifier)
    }

    /// Verifier for tokens signed with a shared secret.
    pub fn hs256(secret: &[u8]) -> Self {
        Self::with_key(DecodingKey::from_secret(secret), Algorithm::HS256)
    }

    /// Verifier for tokens signed with the provider's RSA key.
    pub fn rs256_pem(pem: &[u8]) -> Result<Self, AuthError> {
        let key = DecodingKey::from_rsa_pem(pem)
            .map_err(|e| AuthError::Configuration(format!("invalid public key: {}", e)))?;
        Ok(Self::with_key(key, Algorithm::RS256))
    }

    fn with_key(key: DecodingKey, algorithm: Algorithm) -> Self {
        let mut validation = Validation::new(algorithm);
        validation.leeway = LEEWAY_SECS;
        validation.validate_nbf = true;
        validation.validate_aud = false;
        Self {
            key,
            validation,
            authorized_parties: Vec::new(),
        }
    }

    /// Restrict accepted `azp` claims.
    pub fn with_authorized_parties(mut self, parties: Vec<String>) -> Self {
        self.authorized_parties = parties;
        self
    }

    /// Verify a token and return the caller it identifies.
    pub fn verify(&self, token: &str) -> Result<AuthUser, AuthError> {
        let claims = decode::<Claims>(token, &self.key, &self.validation)?.claims;

        if claims.sub.trim().is_empty() {
            return Err(AuthError::MissingSubject);
        }

        if !self.authorized_parties.is_empty() {
            if let Some(azp) = &claims.azp {
                if !self.authorized_parties.iter().any(|party| party == azp) {
                    return Err(AuthError::UnauthorizedParty(azp.clone()));
                }
            }
        }

        Ok(AuthUser {
            user_id: claims.sub,
            session_id: claims.sid,
        })
    }
}

/// Extract the session token from the bearer header or the session cookie.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|cookie| cookie.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Middleware that rejects requests without a valid session.
///
/// On success the [`AuthUser`] is inserted into the request extensions.
pub async fn require_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let Some(token) = session_token(req.headers()) else {
        tracing::debug!(path = %req.uri().path(), "Rejected request without session");
        return ApiError::Unauthorized(AuthError::MissingToken.to_string()).into_response();
    };

    match state.sessions.verify(&token) {
        Ok(user) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Err(e) => {
            tracing::debug!(error = %e, path = %req.uri().path(), "Rejected session");
            ApiError::Unauthorized("invalid or expired session".to_string()).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    const SECRET: &[u8] = b"test-secret";

    fn now() -> u64 {
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs()
    }

    fn mint(claims: serde_json::Value) -> String {
        encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET)).unwrap()
    }

    #[test]
    fn test_verify_valid_token() {
        let token = mint(serde_json::json!({"sub": "user_1", "sid": "sess_1", "exp": now() + 60}));
        let user = SessionVerifier::hs256(SECRET).verify(&token).unwrap();
        assert_eq!(user.user_id, "user_1");
        assert_eq!(user.session_id.as_deref(), Some("sess_1"));
    }

    #[test]
    fn test_rejects_expired_and_wrong_key() {
        let expired = mint(serde_json::json!({"sub": "user_1", "exp": now() - 3600}));
        assert!(matches!(
            SessionVerifier::hs256(SECRET).verify(&expired),
            Err(AuthError::InvalidToken(_))
        ));

        let token = mint(serde_json::json!({"sub": "user_1", "exp": now() + 60}));
        assert!(SessionVerifier::hs256(b"other").verify(&token).is_err());
        assert!(SessionVerifier::hs256(SECRET).verify("not-a-jwt").is_err());
    }

    #[test]
    fn test_rejects_not_yet_valid_and_missing_exp() {
        let future = mint(serde_json::json!({"sub": "u", "nbf": now() + 3600, "exp": now() + 7200}));
        assert!(SessionVerifier::hs256(SECRET).verify(&future).is_err());

        let no_exp = mint(serde_json::json!({"sub": "u"}));
        assert!(SessionVerifier::hs256(SECRET).verify(&no_exp).is_err());
    }

    #[test]
    fn test_rejects_blank_subject() {
        let token = mint(serde_json::json!({"sub": " ", "exp": now() + 60}));
        assert!(matches!(
            SessionVerifier::hs256(SECRET).verify(&token),
            Err(AuthError::MissingSubject)
        ));
    }

    #[test]
    fn test_authorized_parties() {
        let verifier = SessionVerifier::hs256(SECRET)
            .with_authorized_parties(vec!["http://localhost:5173".to_string()]);

        let ok = mint(serde_json::json!({"sub": "u", "azp": "http://localhost:5173", "exp": now() + 60}));
        assert!(verifier.verify(&ok).is_ok());

        let bad = mint(serde_json::json!({"sub": "u", "azp": "https://evil.example", "exp": now() + 60}));
        assert!(matches!(verifier.verify(&bad), Err(AuthError::UnauthorizedParty(_))));
    }

    #[test]
    fn test_issuer_allow_list() {
        let config = AuthConfig {
            jwt_secret: Some("test-secret".to_string()),
            issuers: vec!["https://clerk.example.com".to_string()],
            ..Default::default()
        };
        let verifier = SessionVerifier::from_config(&config).unwrap();

        let ok = mint(serde_json::json!({"sub": "u", "iss": "https://clerk.example.com", "exp": now() + 60}));
        assert!(verifier.verify(&ok).is_ok());

        let bad = mint(serde_json::json!({"sub": "u", "iss": "https://other.example", "exp": now() + 60}));
        assert!(verifier.verify(&bad).is_err());

        let missing = mint(serde_json::json!({"sub": "u", "exp": now() + 60}));
        assert!(matches!(verifier.verify(&missing), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_from_config_requires_key() {
        assert!(matches!(
            SessionVerifier::from_config(&AuthConfig::default()),
            Err(AuthError::Configuration(_))
        ));

        let config = AuthConfig {
            jwt_public_key: Some("not a pem".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            SessionVerifier::from_config(&config),
            Err(AuthError::Configuration(_))
        ));
    }

    #[test]
    fn test_session_token_sources() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_token(&headers), None);

        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; __session=abc.def.ghi"));
        assert_eq!(session_token(&headers).as_deref(), Some("abc.def.ghi"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer xyz"));
        assert_eq!(session_token(&headers).as_deref(), Some("xyz"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic xyz"));
        assert_eq!(session_token(&headers).as_deref(), Some("abc.def.ghi"));
    }
}
