use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tokio::sync::RwLock;

use crate::error::AccountError;
use crate::model::{Identity, IdentityId, SubscriptionEdge, VideoId};

pub fn now_ts() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "<time>".to_string())
}

/// 32 bytes of entropy, hex-encoded.
pub fn generate_id() -> Result<String, AccountError> {
    let mut bytes = [0u8; 32];
    getrandom::getrandom(&mut bytes)
        .map_err(|e| AccountError::Internal(anyhow::anyhow!("getrandom: {:?}", e)))?;
    let mut out = String::with_capacity(64);
    for b in &bytes {
        out.push_str(&format!("{:02x}", b));
    }
    Ok(out)
}

#[derive(Default)]
struct StoreState {
    identities: HashMap<IdentityId, Identity>,
    subscriptions: Vec<SubscriptionEdge>,
}

/// Durable source of truth for identities and subscription edges.
///
/// State lives in memory behind one `RwLock` and is rewritten to disk
/// after every mutation. Mutation and persist happen under the same
/// write guard, so writers serialize and the files never interleave.
pub struct CredentialStore {
    data_dir: PathBuf,
    state: RwLock<StoreState>,
}

fn identities_path(data_dir: &Path) -> PathBuf {
    data_dir.join("identities.json")
}

fn subscriptions_path(data_dir: &Path) -> PathBuf {
    data_dir.join("subscriptions.json")
}

fn write_atomic_overwrite(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create dir {}", parent.display()))?;
    }
    let tmp = path.with_extension(format!("tmp.{}", std::process::id()));
    std::fs::write(&tmp, bytes).with_context(|| format!("write {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("rename {} -> {}", tmp.display(), path.display()))?;
    Ok(())
}

impl CredentialStore {
    pub fn open(data_dir: &Path) -> Result<Self, AccountError> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("create data dir {}", data_dir.display()))?;

        let identities: HashMap<IdentityId, Identity> = if identities_path(data_dir).exists() {
            let bytes =
                std::fs::read(identities_path(data_dir)).context("read identities.json")?;
            let list: Vec<Identity> =
                serde_json::from_slice(&bytes).context("parse identities.json")?;
            list.into_iter().map(|i| (i.id.clone(), i)).collect()
        } else {
            HashMap::new()
        };

        let subscriptions: Vec<SubscriptionEdge> = if subscriptions_path(data_dir).exists() {
            let bytes =
                std::fs::read(subscriptions_path(data_dir)).context("read subscriptions.json")?;
            serde_json::from_slice(&bytes).context("parse subscriptions.json")?
        } else {
            Vec::new()
        };

        Ok(Self {
            data_dir: data_dir.to_path_buf(),
            state: RwLock::new(StoreState {
                identities,
                subscriptions,
            }),
        })
    }

    fn persist(&self, state: &StoreState) -> Result<(), AccountError> {
        let mut list: Vec<Identity> = state.identities.values().cloned().collect();
        list.sort_by(|a, b| a.handle.cmp(&b.handle));
        let bytes = serde_json::to_vec_pretty(&list).context("serialize identities")?;
        write_atomic_overwrite(&identities_path(&self.data_dir), &bytes)
            .context("write identities.json")?;

        let bytes =
            serde_json::to_vec_pretty(&state.subscriptions).context("serialize subscriptions")?;
        write_atomic_overwrite(&subscriptions_path(&self.data_dir), &bytes)
            .context("write subscriptions.json")?;

        Ok(())
    }

    /// Insert a brand-new identity. Email and handle uniqueness are checked
    /// under the write lock, so two racing registrations cannot both win.
    pub async fn insert_identity(&self, identity: Identity) -> Result<(), AccountError> {
        let mut state = self.state.write().await;
        if state.identities.values().any(|i| i.email == identity.email) {
            return Err(AccountError::Conflict(format!(
                "email '{}' is already registered",
                identity.email
            )));
        }
        if state.identities.values().any(|i| i.handle == identity.handle) {
            return Err(AccountError::Conflict(format!(
                "handle '{}' is already taken",
                identity.handle
            )));
        }
        state.identities.insert(identity.id.clone(), identity);
        self.persist(&state)
    }

    pub async fn find_by_id(&self, id: &IdentityId) -> Option<Identity> {
        let state = self.state.read().await;
        state.identities.get(id).cloned()
    }

    pub async fn find_by_handle(&self, handle: &str) -> Option<Identity> {
        let wanted = handle.trim().to_lowercase();
        let state = self.state.read().await;
        state
            .identities
            .values()
            .find(|i| i.handle == wanted)
            .cloned()
    }

    /// Exact-email availability check, used to reject a registration
    /// before side effects. [`Self::insert_identity`] stays the authority
    /// under the write lock.
    pub async fn email_in_use(&self, email: &str) -> bool {
        let wanted = email.trim().to_lowercase();
        let state = self.state.read().await;
        state.identities.values().any(|i| i.email == wanted)
    }

    /// Lookup by email or handle. Both are stored lowercase, so one
    /// normalization of the identifier covers both comparisons.
    pub async fn find_by_identifier(&self, identifier: &str) -> Option<Identity> {
        let wanted = identifier.trim().to_lowercase();
        let state = self.state.read().await;
        state
            .identities
            .values()
            .find(|i| i.email == wanted || i.handle == wanted)
            .cloned()
    }

    /// `None` clears the field. This is the only write path for the
    /// stored refresh token, shared by login, refresh, and logout.
    pub async fn set_refresh_token(
        &self,
        id: &IdentityId,
        token: Option<String>,
    ) -> Result<(), AccountError> {
        let mut state = self.state.write().await;
        let identity = state
            .identities
            .get_mut(id)
            .ok_or_else(|| AccountError::NotFound("identity not found".to_string()))?;
        identity.refresh_token = token;
        self.persist(&state)
    }

    pub async fn set_password_hash(
        &self,
        id: &IdentityId,
        password_hash: String,
    ) -> Result<(), AccountError> {
        let mut state = self.state.write().await;
        let identity = state
            .identities
            .get_mut(id)
            .ok_or_else(|| AccountError::NotFound("identity not found".to_string()))?;
        identity.password_hash = password_hash;
        self.persist(&state)
    }

    pub async fn update_profile(
        &self,
        id: &IdentityId,
        full_name: String,
        email: String,
    ) -> Result<Identity, AccountError> {
        let mut state = self.state.write().await;
        if state
            .identities
            .values()
            .any(|i| i.email == email && &i.id != id)
        {
            return Err(AccountError::Conflict(format!(
                "email '{email}' is already registered"
            )));
        }
        let identity = state
            .identities
            .get_mut(id)
            .ok_or_else(|| AccountError::NotFound("identity not found".to_string()))?;
        identity.full_name = full_name;
        identity.email = email;
        let updated = identity.clone();
        self.persist(&state)?;
        Ok(updated)
    }

    pub async fn set_avatar(&self, id: &IdentityId, url: String) -> Result<Identity, AccountError> {
        let mut state = self.state.write().await;
        let identity = state
            .identities
            .get_mut(id)
            .ok_or_else(|| AccountError::NotFound("identity not found".to_string()))?;
        identity.avatar = url;
        let updated = identity.clone();
        self.persist(&state)?;
        Ok(updated)
    }

    pub async fn set_cover_image(
        &self,
        id: &IdentityId,
        url: String,
    ) -> Result<Identity, AccountError> {
        let mut state = self.state.write().await;
        let identity = state
            .identities
            .get_mut(id)
            .ok_or_else(|| AccountError::NotFound("identity not found".to_string()))?;
        identity.cover_image = url;
        let updated = identity.clone();
        self.persist(&state)?;
        Ok(updated)
    }

    /// Append to the watch history. Order is insertion order and is
    /// preserved across persistence round-trips.
    pub async fn record_watch(&self, id: &IdentityId, video: VideoId) -> Result<(), AccountError> {
        let mut state = self.state.write().await;
        let identity = state
            .identities
            .get_mut(id)
            .ok_or_else(|| AccountError::NotFound("identity not found".to_string()))?;
        identity.watch_history.push(video);
        self.persist(&state)
    }

    pub async fn watch_history(&self, id: &IdentityId) -> Result<Vec<VideoId>, AccountError> {
        let state = self.state.read().await;
        let identity = state
            .identities
            .get(id)
            .ok_or_else(|| AccountError::NotFound("identity not found".to_string()))?;
        Ok(identity.watch_history.clone())
    }

    /// Idempotent: returns `false` when the edge already existed.
    /// (subscriber, channel) pairs form a set, so repeated subscribes
    /// never inflate the counts.
    pub async fn subscribe(
        &self,
        subscriber: &IdentityId,
        channel: &IdentityId,
    ) -> Result<bool, AccountError> {
        let mut state = self.state.write().await;
        let exists = state
            .subscriptions
            .iter()
            .any(|e| &e.subscriber == subscriber && &e.channel == channel);
        if exists {
            return Ok(false);
        }
        state.subscriptions.push(SubscriptionEdge {
            subscriber: subscriber.clone(),
            channel: channel.clone(),
            created_at: now_ts(),
        });
        self.persist(&state)?;
        Ok(true)
    }

    /// Returns `true` when an edge was actually removed.
    pub async fn unsubscribe(
        &self,
        subscriber: &IdentityId,
        channel: &IdentityId,
    ) -> Result<bool, AccountError> {
        let mut state = self.state.write().await;
        let before = state.subscriptions.len();
        state
            .subscriptions
            .retain(|e| !(&e.subscriber == subscriber && &e.channel == channel));
        if state.subscriptions.len() == before {
            return Ok(false);
        }
        self.persist(&state)?;
        Ok(true)
    }

    pub async fn is_subscribed(&self, subscriber: &IdentityId, channel: &IdentityId) -> bool {
        let state = self.state.read().await;
        state
            .subscriptions
            .iter()
            .any(|e| &e.subscriber == subscriber && &e.channel == channel)
    }

    pub async fn subscriber_count(&self, channel: &IdentityId) -> usize {
        let state = self.state.read().await;
        state
            .subscriptions
            .iter()
            .filter(|e| &e.channel == channel)
            .count()
    }

    pub async fn subscription_count(&self, subscriber: &IdentityId) -> usize {
        let state = self.state.read().await;
        state
            .subscriptions
            .iter()
            .filter(|e| &e.subscriber == subscriber)
            .count()
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
