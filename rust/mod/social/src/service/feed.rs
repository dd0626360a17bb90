//! Feed read side: posts rendered with authors, comments and like state.

use std::collections::{BTreeSet, HashMap};

use murmur_sql::{Executor, Value};

use crate::model::{Actor, Comment, CommentView, Post, PostView, User, UserSummary};
use crate::service::records::{decode_rows, get_record, placeholders, text_params};
use crate::service::{SocialError, SocialService};

/// Summaries for the given user ids, keyed by id. Unknown ids are absent
/// from the map.
pub(crate) fn user_summaries<E: Executor + ?Sized>(
    db: &E,
    ids: &[String],
) -> Result<HashMap<String, UserSummary>, SocialError> {
    let unique: Vec<&String> = ids.iter().collect::<BTreeSet<_>>().into_iter().collect();
    if unique.is_empty() {
        return Ok(HashMap::new());
    }

    let sql = format!(
        "SELECT data FROM users WHERE id IN ({})",
        placeholders(1, unique.len())
    );
    let rows = db.query(&sql, &text_params(&unique))?;
    let users: Vec<User> = decode_rows(&rows)?;
    Ok(users.into_iter().map(|u| (u.id.clone(), u.summary())).collect())
}

impl SocialService {
    /// Every post, newest first, rendered for `viewer`.
    pub fn get_posts(&self, viewer: &Actor) -> Result<Vec<PostView>, SocialError> {
        let rows = self.sql.query(
            "SELECT data FROM posts ORDER BY created_at DESC, rowid DESC",
            &[],
        )?;
        self.render(decode_rows(&rows)?, viewer)
    }

    pub fn get_post(&self, post_id: &str, viewer: &Actor) -> Result<PostView, SocialError> {
        let post: Post = get_record(self.sql.as_ref(), "posts", post_id)?;
        self.render(vec![post], viewer)?
            .pop()
            .ok_or_else(|| SocialError::Internal(format!("post {post_id} vanished while rendering")))
    }

    /// Posts written by the user with `handle`, newest first.
    pub fn get_user_posts(&self, handle: &str, viewer: &Actor) -> Result<Vec<PostView>, SocialError> {
        let author = self.get_user_by_handle(handle)?;
        let rows = self.sql.query(
            "SELECT data FROM posts WHERE author_id = ?1
             ORDER BY created_at DESC, rowid DESC",
            &[Value::Text(author.id)],
        )?;
        self.render(decode_rows(&rows)?, viewer)
    }

    /// Posts liked by the user with `handle`, most recently liked first.
    pub fn get_user_liked_posts(
        &self,
        handle: &str,
        viewer: &Actor,
    ) -> Result<Vec<PostView>, SocialError> {
        let liker = self.get_user_by_handle(handle)?;
        let rows = self.sql.query(
            "SELECT p.data AS data FROM likes l
             JOIN posts p ON p.id = l.post_id
             WHERE l.user_id = ?1
             ORDER BY l.created_at DESC, l.rowid DESC",
            &[Value::Text(liker.id)],
        )?;
        self.render(decode_rows(&rows)?, viewer)
    }

    /// Attach authors, comments and like state to `posts`, keeping their order.
    fn render(&self, posts: Vec<Post>, viewer: &Actor) -> Result<Vec<PostView>, SocialError> {
        if posts.is_empty() {
            return Ok(Vec::new());
        }
        let db = self.sql.as_ref();

        let post_ids: Vec<String> = posts.iter().map(|p| p.id.clone()).collect();
        let in_list = placeholders(1, post_ids.len());
        let id_params = text_params(&post_ids);

        let comment_rows = db.query(
            &format!(
                "SELECT data FROM comments WHERE post_id IN ({in_list})
                 ORDER BY created_at ASC, rowid ASC"
            ),
            &id_params,
        )?;
        let comments: Vec<Comment> = decode_rows(&comment_rows)?;

        let like_rows = db.query(
            &format!("SELECT post_id, user_id FROM likes WHERE post_id IN ({in_list})"),
            &id_params,
        )?;
        let mut likers: HashMap<String, BTreeSet<String>> = HashMap::new();
        for row in &like_rows {
            if let (Some(post_id), Some(user_id)) = (row.get_str("post_id"), row.get_str("user_id")) {
                likers
                    .entry(post_id.to_string())
                    .or_default()
                    .insert(user_id.to_string());
            }
        }

        let mut people: Vec<String> = posts.iter().map(|p| p.author_id.clone()).collect();
        people.extend(comments.iter().map(|c| c.author_id.clone()));
        let summaries = user_summaries(db, &people)?;
        let summary_of = |id: &str| {
            summaries
                .get(id)
                .cloned()
                .ok_or_else(|| SocialError::Internal(format!("user {id} missing")))
        };

        let mut threads: HashMap<String, Vec<CommentView>> = HashMap::new();
        for comment in comments {
            let author = summary_of(&comment.author_id)?;
            threads
                .entry(comment.post_id.clone())
                .or_default()
                .push(CommentView { comment, author });
        }

        let viewer_id = viewer.id();
        posts
            .into_iter()
            .map(|post| {
                let author = summary_of(&post.author_id)?;
                let comments = threads.remove(&post.id).unwrap_or_default();
                let liker_ids = likers.remove(&post.id).unwrap_or_default();
                let liked_by_viewer = viewer_id.is_some_and(|id| liker_ids.contains(id));
                Ok(PostView {
                    like_count: liker_ids.len() as u64,
                    comment_count: comments.len() as u64,
                    author,
                    comments,
                    liker_ids,
                    liked_by_viewer,
                    post,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CreatePost, NotificationKind};
    use crate::service::testutil::{actor, count, test_env, user};

    fn post_by(svc: &SocialService, author: &User, content: &str) -> Post {
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
    fn test_feed_newest_first_with_threads() {
        let env = test_env();
        let alice = user(&env.svc, "alice");
        let bob = user(&env.svc, "bob");
        let carol = user(&env.svc, "carol");

        let first = post_by(&env.svc, &alice, "first");
        let second = post_by(&env.svc, &bob, "second");

        env.svc.create_comment(&actor(&bob), &first.id, "one").unwrap();
        env.svc.create_comment(&actor(&carol), &first.id, "two").unwrap();
        env.svc.create_comment(&actor(&alice), &first.id, "three").unwrap();
        env.svc.toggle_like(&actor(&bob), &first.id).unwrap();
        env.svc.toggle_like(&actor(&carol), &first.id).unwrap();

        let feed = env.svc.get_posts(&actor(&carol)).unwrap();
        let ids: Vec<&str> = feed.iter().map(|v| v.post.id.as_str()).collect();
        assert_eq!(ids, vec![second.id.as_str(), first.id.as_str()]);

        let view = &feed[1];
        assert_eq!(view.author.handle, "alice");
        let thread: Vec<(&str, &str)> = view
            .comments
            .iter()
            .map(|c| (c.comment.content.as_str(), c.author.handle.as_str()))
            .collect();
        assert_eq!(thread, vec![("one", "bob"), ("two", "carol"), ("three", "alice")]);
        assert_eq!(view.comment_count, 3);
        assert_eq!(view.like_count, 2);
        assert!(view.liker_ids.contains(&bob.id));
        assert!(view.liked_by_viewer);

        let empty = &feed[0];
        assert_eq!(empty.author.handle, "bob");
        assert!(empty.comments.is_empty());
        assert_eq!(empty.like_count, 0);
        assert!(!empty.liked_by_viewer);
    }

    #[test]
    fn test_anonymous_viewer_sees_feed() {
        let env = test_env();
        let alice = user(&env.svc, "alice");
        let bob = user(&env.svc, "bob");
        let post = post_by(&env.svc, &alice, "public");
        env.svc.toggle_like(&actor(&bob), &post.id).unwrap();

        let feed = env.svc.get_posts(&Actor::Anonymous).unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].like_count, 1);
        assert!(!feed[0].liked_by_viewer);
    }

    #[test]
    fn test_like_scenario() {
        let env = test_env();
        let alice = user(&env.svc, "alice");
        let bob = user(&env.svc, "bob");
        let post = post_by(&env.svc, &alice, "hello");

        assert!(env.svc.toggle_like(&actor(&bob), &post.id).unwrap().liked);
        let view = env.svc.get_post(&post.id, &actor(&bob)).unwrap();
        assert_eq!(view.like_count, 1);
        assert!(view.liked_by_viewer);
        assert_eq!(count(&env.svc, "notifications", "kind = 'LIKE'"), 1);

        assert!(!env.svc.toggle_like(&actor(&bob), &post.id).unwrap().liked);
        let view = env.svc.get_post(&post.id, &actor(&bob)).unwrap();
        assert_eq!(view.like_count, 0);
        assert!(!view.liked_by_viewer);

        let notifications = env.svc.list_notifications(&alice.id).unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].kind, NotificationKind::Like);
        assert_eq!(notifications[0].actor_id, bob.id);
    }

    #[test]
    fn test_get_post_missing() {
        let env = test_env();
        let err = env.svc.get_post("nope", &Actor::Anonymous).unwrap_err();
        assert!(matches!(err, SocialError::NotFound(_)));
    }

    #[test]
    fn test_profile_timelines() {
        let env = test_env();
        let alice = user(&env.svc, "alice");
        let bob = user(&env.svc, "bob");

        let a1 = post_by(&env.svc, &alice, "a1");
        post_by(&env.svc, &bob, "b1");
        let a2 = post_by(&env.svc, &alice, "a2");

        let mine: Vec<String> = env
            .svc
            .get_user_posts("alice", &Actor::Anonymous)
            .unwrap()
            .into_iter()
            .map(|v| v.post.id)
            .collect();
        assert_eq!(mine, vec![a2.id.clone(), a1.id.clone()]);

        env.svc.toggle_like(&actor(&bob), &a1.id).unwrap();
        env.svc.toggle_like(&actor(&bob), &a2.id).unwrap();
        let liked: Vec<String> = env
            .svc
            .get_user_liked_posts("bob", &actor(&bob))
            .unwrap()
            .into_iter()
            .map(|v| v.post.id)
            .collect();
        assert_eq!(liked, vec![a2.id, a1.id]);
        assert!(env.svc.get_user_liked_posts("alice", &Actor::Anonymous).unwrap().is_empty());

        let err = env.svc.get_user_posts("nobody", &Actor::Anonymous).unwrap_err();
        assert!(matches!(err, SocialError::NotFound(_)));
    }

    #[test]
    fn test_user_summaries_skips_unknown_ids() {
        let env = test_env();
        let alice = user(&env.svc, "alice");
        let found = user_summaries(
            env.svc.sql.as_ref(),
            &[alice.id.clone(), alice.id.clone(), "ghost".to_string()],
        )
        .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[&alice.id].handle, "alice");
        assert!(user_summaries(env.svc.sql.as_ref(), &[]).unwrap().is_empty());
    }
}
