//! Notification fan-out and the recipient's inbox.
//!
//! Fan-out writes only ever happen inside the unit of work of the event
//! that caused them, so a notification exists if and only if its event
//! was committed.

use tracing::debug;

use murmur_core::{new_id, now_rfc3339};
use murmur_sql::{Executor, Row, Transaction, Value};

use crate::model::{
    Actor, CommentExcerpt, Notification, NotificationKind, NotificationView, PostExcerpt,
};
use crate::service::feed::user_summaries;
use crate::service::records::{count, placeholders, text_params};
use crate::service::{SocialError, SocialService, require_user};

/// A notification-worthy event.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FanOut<'a> {
    pub kind: NotificationKind,
    pub recipient_id: &'a str,
    pub actor_id: &'a str,
    pub post_id: Option<&'a str>,
    pub comment_id: Option<&'a str>,
}

/// Record a notification for `event` inside `tx`.
///
/// Self-triggered events are dropped; returns the new notification id
/// otherwise.
pub(crate) fn fan_out(tx: &dyn Transaction, event: FanOut<'_>) -> Result<Option<String>, SocialError> {
    if event.actor_id == event.recipient_id {
        debug!(kind = %event.kind, actor = event.actor_id, "skipping self notification");
        return Ok(None);
    }

    let id = new_id();
    tx.exec(
        "INSERT INTO notifications
            (id, recipient_id, actor_id, kind, post_id, comment_id, is_read, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7)",
        &[
            Value::Text(id.clone()),
            Value::Text(event.recipient_id.to_string()),
            Value::Text(event.actor_id.to_string()),
            Value::Text(event.kind.as_str().to_string()),
            Value::opt_text(event.post_id),
            Value::opt_text(event.comment_id),
            Value::Text(now_rfc3339()),
        ],
    )?;
    Ok(Some(id))
}

impl SocialService {
    /// The caller's notifications, newest first. Empty for anonymous callers.
    pub fn get_notifications(&self, actor: &Actor) -> Result<Vec<NotificationView>, SocialError> {
        let Some(recipient_id) = actor.id() else {
            return Ok(Vec::new());
        };
        let db = self.sql.as_ref();

        let rows = db.query(
            "SELECT n.id, n.recipient_id, n.actor_id, n.kind, n.post_id, n.comment_id,
                    n.is_read, n.created_at,
                    p.data AS post_data, c.data AS comment_data
             FROM notifications n
             LEFT JOIN posts p ON p.id = n.post_id
             LEFT JOIN comments c ON c.id = n.comment_id
             WHERE n.recipient_id = ?1
             ORDER BY n.created_at DESC, n.rowid DESC",
            &[Value::Text(recipient_id.to_string())],
        )?;

        let actor_ids: Vec<String> = rows
            .iter()
            .filter_map(|r| r.get_str("actor_id").map(str::to_string))
            .collect();
        let actors = user_summaries(db, &actor_ids)?;

        let mut views = Vec::with_capacity(rows.len());
        for row in &rows {
            let notification = notification_from_row(row)?;
            let actor = actors.get(&notification.actor_id).cloned().ok_or_else(|| {
                SocialError::Internal(format!("notification actor {} missing", notification.actor_id))
            })?;
            views.push(NotificationView {
                id: notification.id,
                kind: notification.kind,
                actor,
                post: post_excerpt(row)?,
                comment: comment_excerpt(row)?,
                read: notification.read,
                created_at: notification.created_at,
            });
        }
        Ok(views)
    }

    /// Raw notification records addressed to `recipient_id`, newest first.
    pub fn list_notifications(&self, recipient_id: &str) -> Result<Vec<Notification>, SocialError> {
        let rows = self.sql.query(
            "SELECT id, recipient_id, actor_id, kind, post_id, comment_id, is_read, created_at
             FROM notifications WHERE recipient_id = ?1
             ORDER BY created_at DESC, rowid DESC",
            &[Value::Text(recipient_id.to_string())],
        )?;
        rows.iter().map(notification_from_row).collect()
    }

    /// Mark the given notifications of the caller as read. Ids addressed to
    /// other users are ignored. Returns how many were updated.
    pub fn mark_notifications_read(&self, actor: &Actor, ids: &[String]) -> Result<u64, SocialError> {
        let recipient_id = require_user(actor)?;
        if ids.is_empty() {
            return Ok(0);
        }

        let sql = format!(
            "UPDATE notifications SET is_read = 1
             WHERE recipient_id = ?1 AND is_read = 0 AND id IN ({})",
            placeholders(2, ids.len())
        );
        let mut params = vec![Value::Text(recipient_id.to_string())];
        params.extend(text_params(ids));
        Ok(self.sql.exec(&sql, &params)?)
    }

    pub fn unread_count(&self, actor: &Actor) -> Result<u64, SocialError> {
        let Some(recipient_id) = actor.id() else {
            return Ok(0);
        };
        count(
            self.sql.as_ref(),
            "SELECT COUNT(*) AS cnt FROM notifications WHERE recipient_id = ?1 AND is_read = 0",
            &[Value::Text(recipient_id.to_string())],
        )
    }
}

fn notification_from_row(row: &Row) -> Result<Notification, SocialError> {
    let text = |name: &str| -> Result<String, SocialError> {
        row.get_str(name)
            .map(str::to_string)
            .ok_or_else(|| SocialError::Internal(format!("notification row missing {}", name)))
    };
    let kind = text("kind")?
        .parse::<NotificationKind>()
        .map_err(SocialError::Internal)?;

    Ok(Notification {
        id: text("id")?,
        recipient_id: text("recipient_id")?,
        actor_id: text("actor_id")?,
        kind,
        post_id: row.get_str("post_id").map(str::to_string),
        comment_id: row.get_str("comment_id").map(str::to_string),
        read: row.get_i64("is_read").unwrap_or(0) != 0,
        created_at: text("created_at")?,
    })
}

fn post_excerpt(row: &Row) -> Result<Option<PostExcerpt>, SocialError> {
    let Some(data) = row.get_str("post_data") else {
        return Ok(None);
    };
    let post: crate::model::Post =
        serde_json::from_str(data).map_err(|e| SocialError::Internal(e.to_string()))?;
    Ok(Some(PostExcerpt {
        id: post.id,
        content: post.content,
        image: post.image,
    }))
}

fn comment_excerpt(row: &Row) -> Result<Option<CommentExcerpt>, SocialError> {
    let Some(data) = row.get_str("comment_data") else {
        return Ok(None);
    };
    let comment: crate::model::Comment =
        serde_json::from_str(data).map_err(|e| SocialError::Internal(e.to_string()))?;
    Ok(Some(CommentExcerpt {
        id: comment.id,
        content: comment.content,
    }))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::model::CreatePost;
    use crate::service::testutil::{actor, test_env, user};

    fn kinds_for(
        svc: &SocialService,
        recipient_id: &str,
    ) -> Result<HashMap<NotificationKind, usize>, SocialError> {
        let mut by_kind = HashMap::new();
        for n in svc.list_notifications(recipient_id)? {
            *by_kind.entry(n.kind).or_insert(0) += 1;
        }
        Ok(by_kind)
    }

    #[test]
    fn test_self_event_is_not_recorded() {
        let env = test_env();
        let alice = user(&env.svc, "alice");
        let id = env
            .svc
            .unit_of_work(|tx| {
                fan_out(
                    tx,
                    FanOut {
                        kind: NotificationKind::Follow,
                        recipient_id: &alice.id,
                        actor_id: &alice.id,
                        post_id: None,
                        comment_id: None,
                    },
                )
            })
            .unwrap();
        assert!(id.is_none());
        assert!(env.svc.list_notifications(&alice.id).unwrap().is_empty());
    }

    #[test]
    fn test_inbox_views_newest_first() {
        let env = test_env();
        let alice = user(&env.svc, "alice");
        let bob = user(&env.svc, "bob");

        let post = env
            .svc
            .create_post(
                &actor(&alice),
                CreatePost {
                    content: "first post".into(),
                    image: None,
                },
            )
            .unwrap();
        env.svc.toggle_follow(&actor(&bob), &alice.id).unwrap();
        env.svc.toggle_like(&actor(&bob), &post.id).unwrap();
        let comment = env
            .svc
            .create_comment(&actor(&bob), &post.id, "nice")
            .unwrap();

        let inbox = env.svc.get_notifications(&actor(&alice)).unwrap();
        let kinds: Vec<NotificationKind> = inbox.iter().map(|n| n.kind).collect();
        assert_eq!(
            kinds,
            vec![
                NotificationKind::Comment,
                NotificationKind::Like,
                NotificationKind::Follow
            ]
        );
        assert!(inbox.iter().all(|n| n.actor.id == bob.id && !n.read));
        assert_eq!(inbox[0].comment.as_ref().unwrap().id, comment.id);
        assert_eq!(inbox[0].post.as_ref().unwrap().content, "first post");
        assert_eq!(inbox[1].post.as_ref().unwrap().id, post.id);
        assert!(inbox[2].post.is_none());

        assert!(env.svc.get_notifications(&actor(&bob)).unwrap().is_empty());
        assert!(env.svc.get_notifications(&Actor::Anonymous).unwrap().is_empty());

        let by_kind = kinds_for(&env.svc, &alice.id).unwrap();
        assert_eq!(by_kind.get(&NotificationKind::Like), Some(&1));
    }

    #[test]
    fn test_mark_read_only_touches_own_notifications() {
        let env = test_env();
        let alice = user(&env.svc, "alice");
        let bob = user(&env.svc, "bob");
        let carol = user(&env.svc, "carol");

        env.svc.toggle_follow(&actor(&bob), &alice.id).unwrap();
        env.svc.toggle_follow(&actor(&alice), &carol.id).unwrap();

        let alice_ids: Vec<String> = env
            .svc
            .list_notifications(&alice.id)
            .unwrap()
            .into_iter()
            .map(|n| n.id)
            .collect();
        let carol_ids: Vec<String> = env
            .svc
            .list_notifications(&carol.id)
            .unwrap()
            .into_iter()
            .map(|n| n.id)
            .collect();

        // Bob cannot mark Alice's or Carol's notifications.
        let mut all = alice_ids.clone();
        all.extend(carol_ids.clone());
        assert_eq!(env.svc.mark_notifications_read(&actor(&bob), &all).unwrap(), 0);

        assert_eq!(env.svc.unread_count(&actor(&alice)).unwrap(), 1);
        assert_eq!(
            env.svc.mark_notifications_read(&actor(&alice), &all).unwrap(),
            1
        );
        assert_eq!(env.svc.unread_count(&actor(&alice)).unwrap(), 0);
        assert_eq!(env.svc.unread_count(&actor(&carol)).unwrap(), 1);

        // Already read: nothing left to update.
        assert_eq!(
            env.svc.mark_notifications_read(&actor(&alice), &alice_ids).unwrap(),
            0
        );

        let err = env
            .svc
            .mark_notifications_read(&Actor::Anonymous, &alice_ids)
            .unwrap_err();
        assert!(matches!(err, SocialError::Unauthenticated(_)));
    }
}
