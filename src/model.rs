use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentityId(pub String);

impl IdentityId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoId(pub String);

impl VideoId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Durable account record. `password_hash` and `refresh_token` never leave
/// the library; read paths hand out [`IdentityView`] instead.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Identity {
    pub id: IdentityId,
    pub handle: String,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub avatar: String,

    #[serde(default)]
    pub cover_image: String,

    #[serde(default)]
    pub refresh_token: Option<String>,

    #[serde(default)]
    pub watch_history: Vec<VideoId>,

    pub created_at: String,
}

impl Identity {
    pub fn to_view(&self) -> IdentityView {
        IdentityView {
            id: self.id.clone(),
            handle: self.handle.clone(),
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            avatar: self.avatar.clone(),
            cover_image: self.cover_image.clone(),
            created_at: self.created_at.clone(),
        }
    }
}

/// Sanitized projection of an [`Identity`] for responses and request context.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityView {
    pub id: IdentityId,
    pub handle: String,
    pub email: String,
    pub full_name: String,
    pub avatar: String,
    pub cover_image: String,
    pub created_at: String,
}

/// Directed follow relationship: `subscriber` watches `channel`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionEdge {
    pub subscriber: IdentityId,
    pub channel: IdentityId,
    pub created_at: String,
}

/// Reduced owner projection embedded in watch-history entries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerSummary {
    pub handle: String,
    pub full_name: String,
    pub avatar: String,
}
