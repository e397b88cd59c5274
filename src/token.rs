use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::AccountError;
use crate::model::{Identity, IdentityId};
use crate::store;

/// Signing material and lifetimes, passed in at construction. Nothing in
/// the token path reads ambient configuration.
#[derive(Clone, Debug)]
pub struct TokenConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
}

/// Claim set of a short-lived access token.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    pub handle: String,
    pub email: String,
    pub full_name: String,
    pub iat: i64,
    pub exp: i64,
}

/// Claim set of a long-lived refresh token. Carries the identity id plus a
/// per-mint `jti`; rotation compares stored and presented tokens byte for
/// byte, so no two mints may serialize identically.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: String,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

/// Mints and checks both token kinds. Pure CPU work, no I/O, safe to use
/// concurrently without locking.
#[derive(Clone)]
pub struct TokenService {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl TokenService {
    pub fn new(config: &TokenConfig) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(config.access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(config.refresh_secret.as_bytes()),
            access_ttl_secs: config.access_ttl_secs,
            refresh_ttl_secs: config.refresh_ttl_secs,
        }
    }

    pub fn issue_access(&self, identity: &Identity) -> Result<String, AccountError> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let claims = AccessClaims {
            sub: identity.id.as_str().to_string(),
            handle: identity.handle.clone(),
            email: identity.email.clone(),
            full_name: identity.full_name.clone(),
            iat: now,
            exp: now + self.access_ttl_secs,
        };
        encode(&Header::default(), &claims, &self.access_encoding)
            .map_err(|err| AccountError::Internal(anyhow::anyhow!("sign access token: {err}")))
    }

    pub fn issue_refresh(&self, id: &IdentityId) -> Result<String, AccountError> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let claims = RefreshClaims {
            sub: id.as_str().to_string(),
            jti: store::generate_id()?,
            iat: now,
            exp: now + self.refresh_ttl_secs,
        };
        encode(&Header::default(), &claims, &self.refresh_encoding)
            .map_err(|err| AccountError::Internal(anyhow::anyhow!("sign refresh token: {err}")))
    }

    /// Every rejection collapses to [`AccountError::Unauthorized`]; callers
    /// must not learn whether the signature or the expiry failed.
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, AccountError> {
        decode::<AccessClaims>(token, &self.access_decoding, &hs256_validation())
            .map(|data| data.claims)
            .map_err(|err| {
                tracing::debug!(%err, "access token rejected");
                AccountError::Unauthorized
            })
    }

    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, AccountError> {
        decode::<RefreshClaims>(token, &self.refresh_decoding, &hs256_validation())
            .map(|data| data.claims)
            .map_err(|err| {
                tracing::debug!(%err, "refresh token rejected");
                AccountError::Unauthorized
            })
    }
}

fn hs256_validation() -> Validation {
    Validation::new(Algorithm::HS256)
}

#[cfg(test)]
#[path = "tests/token_tests.rs"]
mod tests;
