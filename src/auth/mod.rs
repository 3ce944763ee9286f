use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Role;

/// Minimum signing secret length for HS256. Shorter secrets are a
/// construction error, not a warning.
pub const MIN_SECRET_BYTES: usize = 32;

/// Claims carried by an identity token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub tenant_id: i64,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("JWT signing secret must be at least {MIN_SECRET_BYTES} bytes")]
    WeakSecret,
    /// Malformed, tampered and expired tokens all collapse here so
    /// verification failures are indistinguishable to the caller.
    #[error("invalid token")]
    InvalidToken,
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
}

/// Issues and verifies signed identity tokens. Constructed once at startup
/// with a validated secret and shared read-only across requests.
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenCodec {
    pub fn new(secret: &str, ttl_secs: i64) -> Result<Self, AuthError> {
        if secret.len() < MIN_SECRET_BYTES {
            return Err(AuthError::WeakSecret);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is exact: a token is dead the second its TTL elapses
        validation.leeway = 0;

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl: Duration::seconds(ttl_secs),
        })
    }

    pub fn issue(&self, user_id: i64, tenant_id: i64, role: Role) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            user_id,
            tenant_id,
            role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AuthError::TokenGeneration(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                // Reason goes to the operator log only, never to the client
                tracing::debug!("token rejected: {}", e);
                AuthError::InvalidToken
            })
    }
}
