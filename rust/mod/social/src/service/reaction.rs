//! Reaction engine: like toggling.

use tracing::debug;

use murmur_core::now_rfc3339;
use murmur_sql::{Executor, Value};

use crate::model::{Actor, LikeToggle, NotificationKind, Post, UserSummary};
use crate::service::notification::{FanOut, fan_out};
use crate::service::records::{decode_rows, exists, get_record};
use crate::service::{SocialError, SocialService, require_stored_user, require_user};

impl SocialService {
    /// Like the post if the caller has not liked it yet, unlike it otherwise.
    ///
    /// Liking creates a LIKE notification for the author in the same unit
    /// of work; unliking leaves notifications alone. Authors cannot like
    /// their own posts.
    pub fn toggle_like(&self, actor: &Actor, post_id: &str) -> Result<LikeToggle, SocialError> {
        let actor_id = require_user(actor)?;

        let outcome = self.unit_of_work(|tx| {
            require_stored_user(tx, actor_id)?;
            let post: Post = get_record(tx, "posts", post_id)?;
            if post.author_id == actor_id {
                return Err(SocialError::SelfActionForbidden(
                    "you cannot like your own post".into(),
                ));
            }

            let key = [
                Value::Text(actor_id.to_string()),
                Value::Text(post_id.to_string()),
            ];
            if exists(
                tx,
                "SELECT 1 FROM likes WHERE user_id = ?1 AND post_id = ?2",
                &key,
            )? {
                tx.exec("DELETE FROM likes WHERE user_id = ?1 AND post_id = ?2", &key)?;
                return Ok(LikeToggle { liked: false });
            }

            let inserted = tx.exec(
                "INSERT INTO likes (user_id, post_id, created_at) VALUES (?1, ?2, ?3)",
                &[key[0].clone(), key[1].clone(), Value::Text(now_rfc3339())],
            );
            match inserted {
                Ok(_) => {}
                // Another writer got there first; the like is already in place.
                Err(e) if e.is_duplicate() => {
                    debug!(post_id, actor_id, "like already present");
                    return Ok(LikeToggle { liked: true });
                }
                Err(e) => return Err(e.into()),
            }

            fan_out(
                tx,
                FanOut {
                    kind: NotificationKind::Like,
                    recipient_id: &post.author_id,
                    actor_id,
                    post_id: Some(post_id),
                    comment_id: None,
                },
            )?;
            Ok(LikeToggle { liked: true })
        })?;

        self.invalidate("/");
        Ok(outcome)
    }

    /// Users who liked a post, earliest like first.
    pub fn get_post_likers(&self, post_id: &str) -> Result<Vec<UserSummary>, SocialError> {
        let db = self.sql.as_ref();
        let _: Post = get_record(db, "posts", post_id)?;
        let rows = db.query(
            "SELECT u.data AS data FROM likes l
             JOIN users u ON u.id = l.user_id
             WHERE l.post_id = ?1
             ORDER BY l.created_at ASC, l.rowid ASC",
            &[Value::Text(post_id.to_string())],
        )?;
        let users: Vec<crate::model::User> = decode_rows(&rows)?;
        Ok(users.iter().map(|u| u.summary()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CreatePost;
    use crate::service::testutil::{actor, count, file_env, peer, test_env, user};

    fn post_by(svc: &SocialService, author: &crate::model::User, content: &str) -> Post {
        svc.create_post(
            &actor(author),
            CreatePost {
                content: content.into(),
                image: None,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_like_then_unlike() {
        let env = test_env();
        let alice = user(&env.svc, "alice");
        let bob = user(&env.svc, "bob");
        let post = post_by(&env.svc, &alice, "hello");

        let first = env.svc.toggle_like(&actor(&bob), &post.id).unwrap();
        assert!(first.liked);
        assert_eq!(count(&env.svc, "likes", "1 = 1"), 1);

        let notifications = env.svc.list_notifications(&alice.id).unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].kind, NotificationKind::Like);
        assert_eq!(notifications[0].actor_id, bob.id);
        assert_eq!(notifications[0].post_id.as_deref(), Some(post.id.as_str()));

        let second = env.svc.toggle_like(&actor(&bob), &post.id).unwrap();
        assert!(!second.liked);
        assert_eq!(count(&env.svc, "likes", "1 = 1"), 0);
        // Unlike never notifies and never retracts.
        assert_eq!(env.svc.list_notifications(&alice.id).unwrap().len(), 1);
    }

    #[test]
    fn test_self_like_forbidden() {
        let env = test_env();
        let alice = user(&env.svc, "alice");
        let post = post_by(&env.svc, &alice, "mine");

        for _ in 0..2 {
            let err = env.svc.toggle_like(&actor(&alice), &post.id).unwrap_err();
            assert!(matches!(err, SocialError::SelfActionForbidden(_)));
        }
        assert_eq!(count(&env.svc, "likes", "1 = 1"), 0);
        assert_eq!(count(&env.svc, "notifications", "1 = 1"), 0);
    }

    #[test]
    fn test_like_missing_post() {
        let env = test_env();
        let bob = user(&env.svc, "bob");
        let err = env.svc.toggle_like(&actor(&bob), "nope").unwrap_err();
        assert!(matches!(err, SocialError::NotFound(_)));
    }

    #[test]
    fn test_like_requires_actor() {
        let env = test_env();
        let alice = user(&env.svc, "alice");
        let post = post_by(&env.svc, &alice, "hello");
        let err = env.svc.toggle_like(&Actor::Anonymous, &post.id).unwrap_err();
        assert!(matches!(err, SocialError::Unauthenticated(_)));
    }

    #[test]
    fn test_unknown_actor_cannot_like() {
        let env = test_env();
        let alice = user(&env.svc, "alice");
        let post = post_by(&env.svc, &alice, "hello");

        let err = env
            .svc
            .toggle_like(&Actor::user("ghost"), &post.id)
            .unwrap_err();
        assert!(matches!(err, SocialError::NotFound(_)), "got {err:?}");
        assert_eq!(count(&env.svc, "likes", "1 = 1"), 0);
        assert_eq!(count(&env.svc, "notifications", "1 = 1"), 0);
    }

    #[test]
    fn test_likers_listing() {
        let env = test_env();
        let alice = user(&env.svc, "alice");
        let bob = user(&env.svc, "bob");
        let carol = user(&env.svc, "carol");
        let post = post_by(&env.svc, &alice, "hello");

        env.svc.toggle_like(&actor(&bob), &post.id).unwrap();
        env.svc.toggle_like(&actor(&carol), &post.id).unwrap();

        let handles: Vec<String> = env
            .svc
            .get_post_likers(&post.id)
            .unwrap()
            .into_iter()
            .map(|u| u.handle)
            .collect();
        assert_eq!(handles, vec!["bob", "carol"]);
    }

    #[test]
    fn test_double_click_race_keeps_one_like() {
        let env = file_env();
        let alice = user(&env.svc, "alice");
        let bob = user(&env.svc, "bob");
        let post = post_by(&env.svc, &alice, "race");
        let svc = &env.svc;
        let bob_actor = actor(&bob);

        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    svc.toggle_like(&bob_actor, &post.id).unwrap();
                    assert!(count(svc, "likes", "1 = 1") <= 1);
                });
            }
        });

        // Eight toggles from the same user cancel out.
        assert_eq!(count(svc, "likes", "1 = 1"), 0);
        // One notification per like-create, none per unlike.
        assert_eq!(count(svc, "notifications", "kind = 'LIKE'"), 4);
    }

    #[test]
    fn test_like_race_across_connections() {
        let env = file_env();
        let other = peer(&env);
        let alice = user(&env.svc, "alice");
        let post = post_by(&env.svc, &alice, "race");
        let fans: Vec<Actor> = (0..4)
            .map(|i| actor(&user(&env.svc, &format!("fan{i}"))))
            .collect();
        let services = [env.svc.clone(), other.clone()];
        let post_id = post.id.as_str();

        // Every fan clicks once on each connection at the same time.
        std::thread::scope(|s| {
            for fan in &fans {
                for svc in &services {
                    s.spawn(move || {
                        svc.toggle_like(fan, post_id).unwrap();
                    });
                }
            }
        });
        // The two clicks cancel out; each like was created exactly once.
        assert_eq!(count(&env.svc, "likes", "1 = 1"), 0);
        assert_eq!(count(&env.svc, "notifications", "kind = 'LIKE'"), 4);

        // One click per fan, fans split across the connections.
        std::thread::scope(|s| {
            for (i, fan) in fans.iter().enumerate() {
                let svc = &services[i % 2];
                s.spawn(move || {
                    svc.toggle_like(fan, post_id).unwrap();
                });
            }
        });
        assert_eq!(count(&other, "likes", "1 = 1"), 4);
        assert_eq!(count(&other, "notifications", "kind = 'LIKE'"), 8);
    }
}
