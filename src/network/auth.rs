//! JWT Authentication
//!
//! Validates bearer tokens minted by an external auth provider; the
//! server never issues tokens itself. The validated subject claim is
//! hashed into the `PlayerId` that keys every profile.

use jsonwebtoken::{decode, Algorithm, DecodingKey, TokenData, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

use crate::records::profile::PlayerId;

/// Authentication configuration.
#[derive(Clone, Debug, Default)]
pub struct AuthConfig {
    /// Expected issuer claim. None accepts any issuer.
    pub issuer: Option<String>,
    /// Expected audience claim. None skips audience validation.
    pub audience: Option<String>,
    /// RS256 public key in PEM format, for external providers.
    pub public_key_pem: Option<String>,
    /// HS256 shared secret, for simple setups.
    pub secret: Option<String>,
    /// Skip expiry validation. Testing only.
    pub skip_expiry: bool,
}

impl AuthConfig {
    /// Read configuration from `AUTH_JWT_*` environment variables.
    pub fn from_env() -> Self {
        let flag = |name: &str| {
            std::env::var(name)
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false)
        };
        Self {
            issuer: std::env::var("AUTH_JWT_ISSUER").ok(),
            audience: std::env::var("AUTH_JWT_AUDIENCE").ok(),
            public_key_pem: std::env::var("AUTH_JWT_PUBLIC_KEY").ok(),
            secret: std::env::var("AUTH_JWT_SECRET").ok(),
            skip_expiry: flag("AUTH_JWT_SKIP_EXPIRY"),
        }
    }

    /// Is a verification key configured?
    pub fn is_configured(&self) -> bool {
        self.public_key_pem.is_some() || self.secret.is_some()
    }
}

/// The claims we read out of a provider token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject, the provider's user id.
    pub sub: String,
    /// Expiry, Unix seconds. Zero when the provider omits it.
    #[serde(default)]
    pub exp: u64,
    /// Issued-at, Unix seconds.
    #[serde(default)]
    pub iat: u64,
    /// Issuer name.
    #[serde(default)]
    pub iss: Option<String>,
    /// Audience; providers send either a string or an array here.
    #[serde(default)]
    pub aud: Option<serde_json::Value>,
}

impl TokenClaims {
    /// Derive the player identity from the subject claim.
    ///
    /// SHA-256 over a fixed domain prefix plus the subject, truncated
    /// to 16 bytes, so the same provider account always maps to the
    /// same profile.
    pub fn player_id(&self) -> PlayerId {
        let mut hasher = Sha256::new();
        hasher.update(b"ramen-rush-player:");
        hasher.update(self.sub.as_bytes());
        let digest = hasher.finalize();

        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&digest[..16]);
        PlayerId::new(bytes)
    }
}

/// Why a token was rejected.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The server has no verification key, so nothing can validate.
    #[error("no verification key configured")]
    NotConfigured,
    /// Not a parseable JWT.
    #[error("malformed token")]
    InvalidFormat,
    /// Signature does not verify against the configured key.
    #[error("signature verification failed")]
    InvalidSignature,
    /// The token's expiry has passed.
    #[error("token expired")]
    Expired,
    /// Issuer claim differs from the expected one.
    #[error("issuer mismatch")]
    InvalidIssuer,
    /// Audience claim differs from the expected one.
    #[error("audience mismatch")]
    InvalidAudience,
    /// A claim we require is absent or empty.
    #[error("missing claim: {0}")]
    MissingClaim(String),
    /// Anything else the JWT library reports.
    #[error("token rejected: {0}")]
    DecodeError(String),
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::ExpiredSignature => AuthError::Expired,
            ErrorKind::InvalidSignature => AuthError::InvalidSignature,
            ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
            ErrorKind::InvalidAudience => AuthError::InvalidAudience,
            ErrorKind::InvalidToken | ErrorKind::Base64(_) => AuthError::InvalidFormat,
            _ => AuthError::DecodeError(err.to_string()),
        }
    }
}

/// Validate a token and extract its claims.
pub fn validate_token(token: &str, config: &AuthConfig) -> Result<TokenClaims, AuthError> {
    let (key, algorithm) = match (&config.public_key_pem, &config.secret) {
        (Some(pem), _) => {
            let key = DecodingKey::from_rsa_pem(pem.as_bytes())
                .map_err(|e| AuthError::DecodeError(format!("bad public key: {}", e)))?;
            (key, Algorithm::RS256)
        }
        (None, Some(secret)) => (DecodingKey::from_secret(secret.as_bytes()), Algorithm::HS256),
        (None, None) => return Err(AuthError::NotConfigured),
    };

    let mut validation = Validation::new(algorithm);

    // Claims are checked manually below so providers that omit exp
    // still validate.
    validation.required_spec_claims = std::collections::HashSet::new();

    if let Some(ref issuer) = config.issuer {
        validation.set_issuer(&[issuer]);
    }
    match config.audience {
        Some(ref audience) => validation.set_audience(&[audience]),
        None => validation.validate_aud = false,
    }
    if config.skip_expiry {
        validation.validate_exp = false;
    }

    let data: TokenData<TokenClaims> = decode(token, &key, &validation)?;
    let claims = data.claims;

    if claims.sub.is_empty() {
        return Err(AuthError::MissingClaim("sub".into()));
    }

    // Manual expiry check, covering tokens the library let through
    // with exp dropped from the required claims.
    if !config.skip_expiry && claims.exp > 0 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        if now > claims.exp {
            return Err(AuthError::Expired);
        }
    }

    Ok(claims)
}

// =============================================================================
// TESTS
// =============================================================================
