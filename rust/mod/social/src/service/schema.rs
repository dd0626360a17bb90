use murmur_sql::{Executor, SQLStore};

use crate::service::SocialError;

/// Initialize the SQLite schema for all social resources.
pub fn init_schema(sql: &dyn SQLStore) -> Result<(), SocialError> {
    let statements = [
        // Users: one row per external identity
        "CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            external_id TEXT NOT NULL UNIQUE,
            handle TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            data TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",

        // Posts
        "CREATE TABLE IF NOT EXISTS posts (
            id TEXT PRIMARY KEY,
            author_id TEXT NOT NULL,
            data TEXT NOT NULL,
            created_at TEXT NOT NULL,
            FOREIGN KEY (author_id) REFERENCES users(id)
        )",
        "CREATE INDEX IF NOT EXISTS idx_posts_author ON posts(author_id)",
        "CREATE INDEX IF NOT EXISTS idx_posts_created ON posts(created_at)",

        // Comments: immutable, ordered by created_at within a post
        "CREATE TABLE IF NOT EXISTS comments (
            id TEXT PRIMARY KEY,
            post_id TEXT NOT NULL,
            author_id TEXT NOT NULL,
            data TEXT NOT NULL,
            created_at TEXT NOT NULL,
            FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE,
            FOREIGN KEY (author_id) REFERENCES users(id)
        )",
        "CREATE INDEX IF NOT EXISTS idx_comments_post ON comments(post_id, created_at)",

        // Likes: at most one per (user, post)
        "CREATE TABLE IF NOT EXISTS likes (
            user_id TEXT NOT NULL,
            post_id TEXT NOT NULL,
            created_at TEXT NOT NULL,
            PRIMARY KEY (user_id, post_id),
            FOREIGN KEY (user_id) REFERENCES users(id),
            FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE
        )",
        "CREATE INDEX IF NOT EXISTS idx_likes_post ON likes(post_id)",

        // Follows: directed edges, no self-follow
        "CREATE TABLE IF NOT EXISTS follows (
            follower_id TEXT NOT NULL,
            following_id TEXT NOT NULL,
            created_at TEXT NOT NULL,
            PRIMARY KEY (follower_id, following_id),
            CHECK (follower_id <> following_id),
            FOREIGN KEY (follower_id) REFERENCES users(id),
            FOREIGN KEY (following_id) REFERENCES users(id)
        )",
        "CREATE INDEX IF NOT EXISTS idx_follows_following ON follows(following_id)",

        // Notifications: fan-out of like/comment/follow, never self-addressed
        "CREATE TABLE IF NOT EXISTS notifications (
            id TEXT PRIMARY KEY,
            recipient_id TEXT NOT NULL,
            actor_id TEXT NOT NULL,
            kind TEXT NOT NULL CHECK (kind IN ('LIKE', 'COMMENT', 'FOLLOW')),
            post_id TEXT,
            comment_id TEXT,
            is_read INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            CHECK (recipient_id <> actor_id),
            FOREIGN KEY (recipient_id) REFERENCES users(id),
            FOREIGN KEY (actor_id) REFERENCES users(id),
            FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE,
            FOREIGN KEY (comment_id) REFERENCES comments(id) ON DELETE CASCADE
        )",
        "CREATE INDEX IF NOT EXISTS idx_notifications_recipient
            ON notifications(recipient_id, created_at)",
        "CREATE INDEX IF NOT EXISTS idx_notifications_post ON notifications(post_id)",
    ];

    for stmt in &statements {
        sql.exec(stmt, &[])?;
    }

    Ok(())
}
