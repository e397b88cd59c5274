use std::sync::Arc;

use crate::error::AccountError;
use crate::model::{IdentityId, IdentityView};
use crate::store::CredentialStore;
use crate::token::TokenService;

/// Pick the access token out of the transport pieces. A cookie value wins
/// over the `Authorization: Bearer` header.
pub fn token_from_parts(cookie: Option<&str>, authorization: Option<&str>) -> Option<String> {
    if let Some(value) = cookie
        && !value.is_empty()
    {
        return Some(value.to_string());
    }
    authorization
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.to_string())
}

/// Gate logic for authenticated requests: verify the token, load the
/// identity, hand back the sanitized view for the request context. No
/// retries, no side effects.
pub struct RequestAuthenticator {
    store: Arc<CredentialStore>,
    tokens: TokenService,
}

impl RequestAuthenticator {
    pub fn new(store: Arc<CredentialStore>, tokens: TokenService) -> Self {
        Self { store, tokens }
    }

    /// Fails closed: a missing token, a failed verification, and a claimed
    /// identity that no longer exists all collapse to `Unauthorized`.
    pub async fn authenticate(&self, token: Option<&str>) -> Result<IdentityView, AccountError> {
        let token = token.ok_or(AccountError::Unauthorized)?;
        let claims = self.tokens.verify_access(token)?;
        let id = IdentityId(claims.sub);
        let identity = self.store.find_by_id(&id).await.ok_or_else(|| {
            tracing::debug!(identity = %id.as_str(), "token subject no longer exists");
            AccountError::Unauthorized
        })?;
        Ok(identity.to_view())
    }
}

#[cfg(test)]
#[path = "tests/auth_tests.rs"]
mod tests;
