use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::{VideoCatalog, VideoRecord};
use crate::error::AccountError;
use crate::model::{IdentityId, OwnerSummary, VideoId};
use crate::store::CredentialStore;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChannelProfile {
    pub handle: String,
    pub full_name: String,
    pub subscriber_count: usize,
    pub subscription_count: usize,
    pub is_subscribed: bool,
    pub avatar: String,
    pub cover_image: String,
    pub email: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WatchHistoryEntry {
    pub id: VideoId,
    pub title: String,
    pub description: String,
    pub duration_secs: u64,
    pub thumbnail: String,
    pub created_at: String,
    pub owner: OwnerSummary,
}

/// Read-only relational queries keyed by the authenticated viewer.
pub struct ViewerQueries {
    store: Arc<CredentialStore>,
    catalog: Arc<dyn VideoCatalog>,
}

impl ViewerQueries {
    pub fn new(store: Arc<CredentialStore>, catalog: Arc<dyn VideoCatalog>) -> Self {
        Self { store, catalog }
    }

    /// Channel page data for `handle` as seen by `viewer`. A blank handle
    /// and an unknown handle are both `NotFound`.
    pub async fn channel_profile(
        &self,
        viewer: &IdentityId,
        handle: &str,
    ) -> Result<ChannelProfile, AccountError> {
        if handle.trim().is_empty() {
            return Err(AccountError::NotFound("channel not found".to_string()));
        }
        let channel = self.store.find_by_handle(handle).await.ok_or_else(|| {
            AccountError::NotFound(format!("no channel named '{}'", handle.trim().to_lowercase()))
        })?;

        let subscriber_count = self.store.subscriber_count(&channel.id).await;
        let subscription_count = self.store.subscription_count(&channel.id).await;
        let is_subscribed = self.store.is_subscribed(viewer, &channel.id).await;

        Ok(ChannelProfile {
            handle: channel.handle,
            full_name: channel.full_name,
            subscriber_count,
            subscription_count,
            is_subscribed,
            avatar: channel.avatar,
            cover_image: channel.cover_image,
            email: channel.email,
        })
    }

    /// The viewer's watch history in stored order, each entry carrying the
    /// reduced owner projection. Ids the catalog cannot resolve, and
    /// records whose owner identity has vanished, are skipped. An empty
    /// history is an empty vec, never an error.
    pub async fn watch_history(
        &self,
        viewer: &IdentityId,
    ) -> Result<Vec<WatchHistoryEntry>, AccountError> {
        let ids = self.store.watch_history(viewer).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let records: HashMap<VideoId, VideoRecord> = self
            .catalog
            .find_many(&ids)
            .into_iter()
            .map(|v| (v.id.clone(), v))
            .collect();

        let mut history = Vec::with_capacity(ids.len());
        for id in &ids {
            let Some(video) = records.get(id) else {
                continue;
            };
            let Some(owner) = self.store.find_by_id(&video.owner).await else {
                continue;
            };
            history.push(WatchHistoryEntry {
                id: video.id.clone(),
                title: video.title.clone(),
                description: video.description.clone(),
                duration_secs: video.duration_secs,
                thumbnail: video.thumbnail.clone(),
                created_at: video.created_at.clone(),
                owner: OwnerSummary {
                    handle: owner.handle,
                    full_name: owner.full_name,
                    avatar: owner.avatar,
                },
            });
        }
        Ok(history)
    }
}

#[cfg(test)]
#[path = "tests/query_tests.rs"]
mod tests;
