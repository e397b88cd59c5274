use std::sync::Arc;

use argon2::Argon2;
use argon2::password_hash::{
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
};

use crate::error::AccountError;
use crate::model::{Identity, IdentityId, IdentityView};
use crate::store::{self, CredentialStore};
use crate::token::TokenService;

/// Registration input. `avatar` and `cover_image` are the outcomes of the
/// media-upload collaborator: `None` means the upload did not produce a
/// usable reference.
#[derive(Clone)]
pub struct NewRegistration {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub handle: String,
    pub avatar: Option<String>,
    pub cover_image: Option<String>,
}

#[derive(Clone, Debug)]
pub struct LoginOutcome {
    pub identity: IdentityView,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone, Debug)]
pub struct RefreshedTokens {
    pub access_token: String,
    pub refresh_token: String,
}

/// Orchestrates login, logout, and refresh rotation. Owns the invariant
/// that at most one refresh token is live per identity.
pub struct SessionManager {
    store: Arc<CredentialStore>,
    tokens: TokenService,
}

impl SessionManager {
    pub fn new(store: Arc<CredentialStore>, tokens: TokenService) -> Self {
        Self { store, tokens }
    }

    /// The validation and uniqueness half of [`Self::register`], with no
    /// side effects. Callers that stage work before registration (media
    /// uploads) run this first so rejected input stages nothing.
    pub async fn precheck_registration(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
        handle: &str,
    ) -> Result<(), AccountError> {
        required_trimmed("full_name", full_name)?;
        let email = required_trimmed("email", email)?.to_lowercase();
        let handle = required_trimmed("handle", handle)?.to_lowercase();
        require_nonblank("password", password)?;
        validate_handle(&handle)?;

        if self.store.email_in_use(&email).await {
            return Err(AccountError::Conflict(format!(
                "email '{email}' is already registered"
            )));
        }
        if self.store.find_by_handle(&handle).await.is_some() {
            return Err(AccountError::Conflict(format!(
                "handle '{handle}' is already taken"
            )));
        }
        Ok(())
    }

    pub async fn register(&self, reg: NewRegistration) -> Result<IdentityView, AccountError> {
        let full_name = required_trimmed("full_name", &reg.full_name)?;
        let email = required_trimmed("email", &reg.email)?.to_lowercase();
        let handle = required_trimmed("handle", &reg.handle)?.to_lowercase();
        require_nonblank("password", &reg.password)?;
        validate_handle(&handle)?;

        let avatar = reg
            .avatar
            .ok_or_else(|| AccountError::Upload("avatar upload failed".to_string()))?;
        let cover_image = reg.cover_image.unwrap_or_default();

        let identity = Identity {
            id: IdentityId(store::generate_id()?),
            handle,
            email,
            full_name,
            password_hash: hash_password(&reg.password)?,
            avatar,
            cover_image,
            refresh_token: None,
            watch_history: Vec::new(),
            created_at: store::now_ts(),
        };
        let view = identity.to_view();
        self.store.insert_identity(identity).await?;
        tracing::info!(handle = %view.handle, "identity registered");
        Ok(view)
    }

    /// `identifier` matches the email or the handle, case-insensitively.
    pub async fn login(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<LoginOutcome, AccountError> {
        require_nonblank("identifier", identifier)?;
        let identity = self
            .store
            .find_by_identifier(identifier)
            .await
            .ok_or_else(|| {
                AccountError::NotFound("no identity matches that email or handle".to_string())
            })?;
        if !verify_password(password, &identity.password_hash)? {
            return Err(AccountError::InvalidCredentials);
        }

        let access_token = self.tokens.issue_access(&identity)?;
        let refresh_token = self.tokens.issue_refresh(&identity.id)?;
        // Overwrites any prior value, which is the single point where an
        // older session gets invalidated by a newer login.
        self.store
            .set_refresh_token(&identity.id, Some(refresh_token.clone()))
            .await?;
        tracing::info!(handle = %identity.handle, "session opened");
        Ok(LoginOutcome {
            identity: identity.to_view(),
            access_token,
            refresh_token,
        })
    }

    /// Clears the stored refresh token. Idempotent; an identity that no
    /// longer exists still counts as logged out.
    pub async fn logout(&self, id: &IdentityId) -> Result<(), AccountError> {
        match self.store.set_refresh_token(id, None).await {
            Ok(()) => Ok(()),
            Err(AccountError::NotFound(_)) => Ok(()),
            Err(err) => Err(err),
        }
    }

    /// Exchange a refresh token for a new pair. The presented token must
    /// byte-equal the stored one; on success the stored value is replaced,
    /// so each refresh token works exactly once.
    pub async fn refresh(&self, presented: Option<&str>) -> Result<RefreshedTokens, AccountError> {
        let presented = presented
            .filter(|t| !t.trim().is_empty())
            .ok_or(AccountError::Unauthorized)?;
        let claims = self.tokens.verify_refresh(presented)?;
        let id = IdentityId(claims.sub);
        let identity = self
            .store
            .find_by_id(&id)
            .await
            .ok_or_else(|| AccountError::NotFound("identity not found".to_string()))?;
        if identity.refresh_token.as_deref() != Some(presented) {
            tracing::warn!(identity = %id.as_str(), "refresh token reuse detected");
            return Err(AccountError::Unauthorized);
        }

        let access_token = self.tokens.issue_access(&identity)?;
        let refresh_token = self.tokens.issue_refresh(&identity.id)?;
        self.store
            .set_refresh_token(&identity.id, Some(refresh_token.clone()))
            .await?;
        Ok(RefreshedTokens {
            access_token,
            refresh_token,
        })
    }

    /// Re-hash and store a new password. The stored refresh token is left
    /// in place, so existing sessions survive a password change.
    pub async fn change_password(
        &self,
        id: &IdentityId,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AccountError> {
        require_nonblank("new password", new_password)?;
        let identity = self
            .store
            .find_by_id(id)
            .await
            .ok_or_else(|| AccountError::NotFound("identity not found".to_string()))?;
        if !verify_password(old_password, &identity.password_hash)? {
            return Err(AccountError::InvalidCredentials);
        }
        self.store
            .set_password_hash(id, hash_password(new_password)?)
            .await
    }
}

fn required_trimmed(field: &str, value: &str) -> Result<String, AccountError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AccountError::Validation(format!("{field} cannot be blank")));
    }
    Ok(trimmed.to_string())
}

fn require_nonblank(field: &str, value: &str) -> Result<(), AccountError> {
    if value.trim().is_empty() {
        return Err(AccountError::Validation(format!("{field} cannot be blank")));
    }
    Ok(())
}

fn validate_handle(handle: &str) -> Result<(), AccountError> {
    if handle.len() < 3 || handle.len() > 32 {
        return Err(AccountError::Validation(
            "handle must be 3 to 32 characters".to_string(),
        ));
    }
    if !handle
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
    {
        return Err(AccountError::Validation(
            "handle must be lowercase alnum, '-' or '_'".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn hash_password(password: &str) -> Result<String, AccountError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AccountError::Internal(anyhow::anyhow!("hash password: {err}")))
}

fn verify_password(password: &str, stored: &str) -> Result<bool, AccountError> {
    let parsed = PasswordHash::new(stored)
        .map_err(|err| AccountError::Internal(anyhow::anyhow!("parse stored password hash: {err}")))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(err) => Err(AccountError::Internal(anyhow::anyhow!(
            "verify password: {err}"
        ))),
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
