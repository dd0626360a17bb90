//! Social graph: follow edges and follow suggestions.

use tracing::debug;

use murmur_core::now_rfc3339;
use murmur_sql::{Executor, Value};

use crate::model::{Actor, FollowToggle, NotificationKind, SuggestedUser, User, UserSummary};
use crate::service::notification::{FanOut, fan_out};
use crate::service::records::{decode_row, decode_rows, exists, get_record};
use crate::service::{SocialError, SocialService, require_stored_user, require_user};

impl SocialService {
    /// Follow `target_id` if the caller does not follow them yet, unfollow
    /// otherwise.
    ///
    /// Following creates a FOLLOW notification for the target in the same
    /// unit of work. Nobody can follow themselves.
    pub fn toggle_follow(&self, actor: &Actor, target_id: &str) -> Result<FollowToggle, SocialError> {
        let actor_id = require_user(actor)?;
        if actor_id == target_id {
            return Err(SocialError::SelfActionForbidden("you cannot follow yourself".into()));
        }

        let (outcome, target) = self.unit_of_work(|tx| {
            require_stored_user(tx, actor_id)?;
            let target: User = get_record(tx, "users", target_id)?;

            let edge = [
                Value::Text(actor_id.to_string()),
                Value::Text(target_id.to_string()),
            ];
            if exists(
                tx,
                "SELECT 1 FROM follows WHERE follower_id = ?1 AND following_id = ?2",
                &edge,
            )? {
                tx.exec(
                    "DELETE FROM follows WHERE follower_id = ?1 AND following_id = ?2",
                    &edge,
                )?;
                return Ok((FollowToggle { following: false }, target));
            }

            let inserted = tx.exec(
                "INSERT INTO follows (follower_id, following_id, created_at) VALUES (?1, ?2, ?3)",
                &[edge[0].clone(), edge[1].clone(), Value::Text(now_rfc3339())],
            );
            match inserted {
                Ok(_) => {}
                Err(e) if e.is_duplicate() => {
                    debug!(actor_id, target_id, "follow edge already present");
                    return Ok((FollowToggle { following: true }, target));
                }
                Err(e) => return Err(e.into()),
            }

            fan_out(
                tx,
                FanOut {
                    kind: NotificationKind::Follow,
                    recipient_id: target_id,
                    actor_id,
                    post_id: None,
                    comment_id: None,
                },
            )?;
            Ok((FollowToggle { following: true }, target))
        })?;

        self.invalidate("/");
        self.invalidate(&format!("/profile/{}", target.handle));
        Ok(outcome)
    }

    /// Whether `follower_id` follows `target_id`.
    pub fn is_following(&self, follower_id: &str, target_id: &str) -> Result<bool, SocialError> {
        exists(
            self.sql.as_ref(),
            "SELECT 1 FROM follows WHERE follower_id = ?1 AND following_id = ?2",
            &[
                Value::Text(follower_id.to_string()),
                Value::Text(target_id.to_string()),
            ],
        )
    }

    /// Users following `user_id`, most recent first.
    pub fn list_followers(&self, user_id: &str) -> Result<Vec<UserSummary>, SocialError> {
        self.edge_users(
            user_id,
            "SELECT u.data AS data FROM follows f
             JOIN users u ON u.id = f.follower_id
             WHERE f.following_id = ?1
             ORDER BY f.created_at DESC, f.rowid DESC",
        )
    }

    /// Users `user_id` follows, most recent first.
    pub fn list_following(&self, user_id: &str) -> Result<Vec<UserSummary>, SocialError> {
        self.edge_users(
            user_id,
            "SELECT u.data AS data FROM follows f
             JOIN users u ON u.id = f.following_id
             WHERE f.follower_id = ?1
             ORDER BY f.created_at DESC, f.rowid DESC",
        )
    }

    /// Up to `suggestion_limit` random users the caller does not follow yet,
    /// never including the caller. Empty for anonymous callers.
    pub fn get_random_users(&self, actor: &Actor) -> Result<Vec<SuggestedUser>, SocialError> {
        let Some(actor_id) = actor.id() else {
            return Ok(Vec::new());
        };

        let rows = self.sql.query(
            "SELECT u.data AS data,
                    (SELECT COUNT(*) FROM follows c WHERE c.following_id = u.id) AS followers
             FROM users u
             WHERE u.id <> ?1
               AND NOT EXISTS (
                   SELECT 1 FROM follows f
                   WHERE f.follower_id = ?1 AND f.following_id = u.id
               )
             ORDER BY RANDOM()
             LIMIT ?2",
            &[
                Value::Text(actor_id.to_string()),
                Value::Integer(self.config.suggestion_limit as i64),
            ],
        )?;

        rows.iter()
            .map(|row| {
                let user: User = decode_row(row)?;
                Ok(SuggestedUser {
                    user: user.summary(),
                    followers: row.get_i64("followers").unwrap_or(0) as u64,
                })
            })
            .collect()
    }

    fn edge_users(&self, user_id: &str, sql: &str) -> Result<Vec<UserSummary>, SocialError> {
        let db = self.sql.as_ref();
        let _: User = get_record(db, "users", user_id)?;
        let rows = db.query(sql, &[Value::Text(user_id.to_string())])?;
        let users: Vec<User> = decode_rows(&rows)?;
        Ok(users.iter().map(User::summary).collect())
    }
}
