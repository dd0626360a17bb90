//! Content store: posts and comments.

use tracing::info;

use murmur_core::{new_id, now_rfc3339};
use murmur_sql::{Executor, Value};

use crate::model::{Actor, Comment, CreatePost, NotificationKind, Post};
use crate::service::notification::{FanOut, fan_out};
use crate::service::records::{get_record, insert_record};
use crate::service::{
    SocialError, SocialService, clean_content, require_stored_user, require_user,
};

impl SocialService {
    /// Publish a post as the caller.
    ///
    /// A post needs text, an image, or both.
    pub fn create_post(&self, actor: &Actor, input: CreatePost) -> Result<Post, SocialError> {
        let author_id = require_user(actor)?;
        let content = clean_content(&input.content, self.config.max_content_chars, "post")?;
        let image = input
            .image
            .map(|i| i.trim().to_string())
            .filter(|i| !i.is_empty());
        if content.is_empty() && image.is_none() {
            return Err(SocialError::Validation("post needs content or an image".into()));
        }

        let post = Post {
            id: new_id(),
            author_id: author_id.to_string(),
            content,
            image,
            created_at: now_rfc3339(),
        };
        self.unit_of_work(|tx| {
            require_stored_user(tx, author_id)?;
            insert_record(
                tx,
                "posts",
                &post.id,
                &post,
                &[
                    ("author_id", Value::Text(post.author_id.clone())),
                    ("created_at", Value::Text(post.created_at.clone())),
                ],
            )
        })?;

        self.invalidate("/");
        Ok(post)
    }

    /// Delete one of the caller's posts together with its comments, likes
    /// and notifications.
    pub fn delete_post(&self, actor: &Actor, post_id: &str) -> Result<(), SocialError> {
        let actor_id = require_user(actor)?;

        self.unit_of_work(|tx| {
            let post: Post = get_record(tx, "posts", post_id)?;
            if post.author_id != actor_id {
                return Err(SocialError::Unauthorized(
                    "only the author can delete a post".into(),
                ));
            }

            let id = [Value::Text(post_id.to_string())];
            tx.exec(
                "DELETE FROM notifications
                 WHERE post_id = ?1
                    OR comment_id IN (SELECT id FROM comments WHERE post_id = ?1)",
                &id,
            )?;
            tx.exec("DELETE FROM likes WHERE post_id = ?1", &id)?;
            tx.exec("DELETE FROM comments WHERE post_id = ?1", &id)?;
            tx.exec("DELETE FROM posts WHERE id = ?1", &id)?;
            Ok(())
        })?;

        info!(post_id, author_id = actor_id, "post deleted");
        self.invalidate("/");
        Ok(())
    }

    /// Comment on a post as the caller.
    ///
    /// The post author gets a COMMENT notification unless they wrote the
    /// comment themselves.
    pub fn create_comment(
        &self,
        actor: &Actor,
        post_id: &str,
        content: &str,
    ) -> Result<Comment, SocialError> {
        let author_id = require_user(actor)?;
        let content = clean_content(content, self.config.max_content_chars, "comment")?;
        if content.is_empty() {
            return Err(SocialError::Validation("comment content is required".into()));
        }

        let comment = self.unit_of_work(|tx| {
            require_stored_user(tx, author_id)?;
            let post: Post = get_record(tx, "posts", post_id)?;

            let comment = Comment {
                id: new_id(),
                post_id: post.id.clone(),
                author_id: author_id.to_string(),
                content,
                created_at: now_rfc3339(),
            };
            insert_record(
                tx,
                "comments",
                &comment.id,
                &comment,
                &[
                    ("post_id", Value::Text(comment.post_id.clone())),
                    ("author_id", Value::Text(comment.author_id.clone())),
                    ("created_at", Value::Text(comment.created_at.clone())),
                ],
            )?;

            fan_out(
                tx,
                FanOut {
                    kind: NotificationKind::Comment,
                    recipient_id: &post.author_id,
                    actor_id: author_id,
                    post_id: Some(&post.id),
                    comment_id: Some(&comment.id),
                },
            )?;
            Ok(comment)
        })?;

        self.invalidate("/");
        Ok(comment)
    }
}
