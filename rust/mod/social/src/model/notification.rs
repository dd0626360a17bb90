use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::UserSummary;

/// What triggered a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NotificationKind {
    Like,
    Comment,
    Follow,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Like => "LIKE",
            NotificationKind::Comment => "COMMENT",
            NotificationKind::Follow => "FOLLOW",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LIKE" => Ok(NotificationKind::Like),
            "COMMENT" => Ok(NotificationKind::Comment),
            "FOLLOW" => Ok(NotificationKind::Follow),
            other => Err(format!("unknown notification kind '{other}'")),
        }
    }
}

/// A stored notification. The actor is never the recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub id: String,
    pub recipient_id: String,
    pub actor_id: String,
    pub kind: NotificationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_id: Option<String>,
    pub read: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostExcerpt {
    pub id: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentExcerpt {
    pub id: String,
    pub content: String,
}

/// A notification as shown in the recipient's inbox.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationView {
    pub id: String,
    pub kind: NotificationKind,
    pub actor: UserSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<PostExcerpt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<CommentExcerpt>,
    pub read: bool,
    pub created_at: String,
}

/// Input for marking notifications read.
#[derive(Debug, Clone, Deserialize)]
pub struct MarkRead {
    pub ids: Vec<String>,
}
