use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::AccountError;
use crate::model::{IdentityId, VideoId};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub id: VideoId,
    pub title: String,
    pub description: String,
    pub duration_secs: u64,
    pub thumbnail: String,
    pub owner: IdentityId,
    pub created_at: String,
}

/// External video-catalog collaborator.
pub trait VideoCatalog: Send + Sync {
    /// Resolve ids to records. Unknown ids are simply absent from the
    /// result, and result order is unspecified.
    fn find_many(&self, ids: &[VideoId]) -> Vec<VideoRecord>;
}

/// Read-only catalog backed by a `videos.json` file. A missing file is an
/// empty catalog.
pub struct FileVideoCatalog {
    videos: HashMap<VideoId, VideoRecord>,
}

impl FileVideoCatalog {
    pub fn open(path: &Path) -> Result<Self, AccountError> {
        let videos = if path.exists() {
            let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
            let list: Vec<VideoRecord> =
                serde_json::from_slice(&bytes).with_context(|| format!("parse {}", path.display()))?;
            list.into_iter().map(|v| (v.id.clone(), v)).collect()
        } else {
            HashMap::new()
        };
        Ok(Self { videos })
    }
}

impl VideoCatalog for FileVideoCatalog {
    fn find_many(&self, ids: &[VideoId]) -> Vec<VideoRecord> {
        ids.iter()
            .filter_map(|id| self.videos.get(id).cloned())
            .collect()
    }
}
