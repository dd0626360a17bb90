use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::{CommentView, UserSummary};

/// A post, owned exclusively by its author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub author_id: String,
    pub content: String,
    /// Image reference, stored by an external collaborator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub created_at: String,
}

/// Input for creating a post.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreatePost {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// A post as rendered in a feed.
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    pub author: UserSummary,
    /// Oldest first.
    pub comments: Vec<CommentView>,
    pub like_count: u64,
    pub comment_count: u64,
    /// Ids of every user who liked the post.
    pub liker_ids: BTreeSet<String>,
    /// Whether the requesting viewer is among the likers.
    pub liked_by_viewer: bool,
}

/// Resulting state of a like toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LikeToggle {
    pub liked: bool,
}
