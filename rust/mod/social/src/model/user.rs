use serde::{Deserialize, Serialize};

/// A member of the network. Created by the identity resolver the first
/// time an external identity is seen; never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier (UUIDv4, no dashes).
    pub id: String,

    /// Identity provider's id for this user. Unique and immutable.
    pub external_id: String,

    /// Display name.
    pub name: String,

    /// Unique handle, used in profile URLs.
    pub handle: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Avatar image reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,

    /// RFC 3339 creation timestamp.
    pub created_at: String,
}

impl User {
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            handle: self.handle.clone(),
            avatar: self.avatar.clone(),
        }
    }
}

/// The public face of a user, embedded in posts, comments and notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub handle: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// A user with aggregate relationship counts.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: User,
    /// Users following this user.
    pub followers: u64,
    /// Users this user follows.
    pub following: u64,
    pub posts: u64,
}

/// A follow suggestion.
#[derive(Debug, Clone, Serialize)]
pub struct SuggestedUser {
    #[serde(flatten)]
    pub user: UserSummary,
    pub followers: u64,
}

/// Resulting state of a follow toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FollowToggle {
    pub following: bool,
}
