//! Response representations of the persisted entities.
//!
//! Each response is a flat serde struct; its JSON form is the mapping handed
//! to callers. Related usernames and aggregate counts are read from the
//! store at the moment `to_response` runs, never cached on the entity.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Connection;
use serde::Serialize;

use crate::db::models::{self, Comment, Follow, Like, Post, User};
use crate::error::ModelResult;

/// Converts a persisted entity into its response form.
pub trait ToResponse {
    type Response: Serialize;

    fn to_response(&self, conn: &Connection) -> ModelResult<Self::Response>;
}

/// ISO-8601 with microseconds and a `Z` suffix.
pub fn iso8601(ts: Option<&DateTime<Utc>>) -> Option<String> {
    ts.map(|t| t.to_rfc3339_opts(SecondsFormat::Micros, true))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub bio: Option<String>,
    pub profile_pic: Option<String>,
    pub is_active: bool,
    pub created_at: Option<String>,
    pub posts_count: u64,
    pub followers_count: u64,
    pub following_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostResponse {
    pub id: i64,
    pub user_id: i64,
    pub username: Option<String>,
    pub image_url: String,
    pub caption: Option<String>,
    pub location: Option<String>,
    pub created_at: Option<String>,
    pub comments_count: u64,
    pub likes_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentResponse {
    pub id: i64,
    pub user_id: i64,
    pub username: Option<String>,
    pub post_id: i64,
    pub content: String,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LikeResponse {
    pub id: i64,
    pub user_id: i64,
    pub username: Option<String>,
    pub post_id: i64,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FollowResponse {
    pub id: i64,
    pub follower_id: i64,
    pub follower_username: Option<String>,
    pub followed_id: i64,
    pub followed_username: Option<String>,
    pub created_at: Option<String>,
}

impl ToResponse for User {
    type Response = UserResponse;

    fn to_response(&self, conn: &Connection) -> ModelResult<UserResponse> {
        Ok(UserResponse {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            bio: self.bio.clone(),
            profile_pic: self.profile_pic.clone(),
            is_active: self.is_active,
            created_at: iso8601(Some(&self.created_at)),
            posts_count: self.posts_count(conn)?,
            followers_count: self.followers_count(conn)?,
            following_count: self.following_count(conn)?,
        })
    }
}

impl ToResponse for Post {
    type Response = PostResponse;

    fn to_response(&self, conn: &Connection) -> ModelResult<PostResponse> {
        Ok(PostResponse {
            id: self.id,
            user_id: self.user_id,
            username: models::username_of(conn, self.user_id)?,
            image_url: self.image_url.clone(),
            caption: self.caption.clone(),
            location: self.location.clone(),
            created_at: iso8601(Some(&self.created_at)),
            comments_count: self.comments_count(conn)?,
            likes_count: self.likes_count(conn)?,
        })
    }
}

impl ToResponse for Comment {
    type Response = CommentResponse;

    fn to_response(&self, conn: &Connection) -> ModelResult<CommentResponse> {
        Ok(CommentResponse {
            id: self.id,
            user_id: self.user_id,
            username: models::username_of(conn, self.user_id)?,
            post_id: self.post_id,
            content: self.content.clone(),
            created_at: iso8601(Some(&self.created_at)),
        })
    }
}

impl ToResponse for Like {
    type Response = LikeResponse;

    fn to_response(&self, conn: &Connection) -> ModelResult<LikeResponse> {
        Ok(LikeResponse {
            id: self.id,
            user_id: self.user_id,
            username: models::username_of(conn, self.user_id)?,
            post_id: self.post_id,
            created_at: iso8601(Some(&self.created_at)),
        })
    }
}

impl ToResponse for Follow {
    type Response = FollowResponse;

    fn to_response(&self, conn: &Connection) -> ModelResult<FollowResponse> {
        Ok(FollowResponse {
            id: self.id,
            follower_id: self.follower_id,
            follower_username: models::username_of(conn, self.follower_id)?,
            followed_id: self.followed_id,
            followed_username: models::username_of(conn, self.followed_id)?,
            created_at: iso8601(Some(&self.created_at)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::db::models::{NewComment, NewFollow, NewLike, NewPost, NewUser};
    use chrono::TimeZone;

    fn test_conn() -> r2d2::PooledConnection<r2d2_sqlite::SqliteConnectionManager> {
        let pool = db::create_memory_pool().unwrap();
        db::run_migrations(&pool).unwrap();
        pool.get().unwrap()
    }

    fn user(conn: &Connection, name: &str) -> User {
        NewUser::new(name, format!("{name}@example.com"), "secret", "Someone")
            .insert(conn)
            .unwrap()
    }

    #[test]
    fn iso8601_renders_utc_with_micros() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap();
        assert_eq!(
            iso8601(Some(&ts)).as_deref(),
            Some("2024-03-09T14:05:00.000000Z")
        );
        assert_eq!(iso8601(None), None);
    }

    #[test]
    fn user_response_has_expected_keys_and_no_password() {
        let conn = test_conn();
        let alice = user(&conn, "alice");
        let json = serde_json::to_value(alice.to_response(&conn).unwrap()).unwrap();

        let mut keys: Vec<&str> = json
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec![
                "bio",
                "created_at",
                "email",
                "followers_count",
                "following_count",
                "full_name",
                "id",
                "is_active",
                "posts_count",
                "profile_pic",
                "username",
            ]
        );
        assert!(json["bio"].is_null());
    }

    #[test]
    fn user_counts_reflect_current_rows() {
        let conn = test_conn();
        let alice = user(&conn, "alice");
        let others: Vec<User> = (0..5).map(|i| user(&conn, &format!("u{i}"))).collect();

        for _ in 0..3 {
            NewPost::new(alice.id, "p.jpg").insert(&conn).unwrap();
        }
        for other in &others[..2] {
            NewFollow::new(other.id, alice.id).insert(&conn).unwrap();
        }
        for other in &others {
            NewFollow::new(alice.id, other.id).insert(&conn).unwrap();
        }

        let response = alice.to_response(&conn).unwrap();
        assert_eq!(response.posts_count, 3);
        assert_eq!(response.followers_count, 2);
        assert_eq!(response.following_count, 5);
    }

    #[test]
    fn post_response_includes_owner_and_counts() {
        let conn = test_conn();
        let alice = user(&conn, "alice");
        let bob = user(&conn, "bob");
        let post = NewPost::new(alice.id, "beach.jpg")
            .caption("sand")
            .insert(&conn)
            .unwrap();
        NewComment::new(bob.id, post.id, "nice").insert(&conn).unwrap();
        NewComment::new(alice.id, post.id, "thanks").insert(&conn).unwrap();
        NewLike::new(bob.id, post.id).insert(&conn).unwrap();

        let response = post.to_response(&conn).unwrap();
        assert_eq!(response.username.as_deref(), Some("alice"));
        assert_eq!(response.caption.as_deref(), Some("sand"));
        assert!(response.location.is_none());
        assert_eq!(response.comments_count, 2);
        assert_eq!(response.likes_count, 1);
    }

    #[test]
    fn comment_like_and_follow_resolve_usernames() {
        let conn = test_conn();
        let alice = user(&conn, "alice");
        let bob = user(&conn, "bob");
        let post = NewPost::new(alice.id, "a.jpg").insert(&conn).unwrap();

        let comment = NewComment::new(bob.id, post.id, "hello")
            .insert(&conn)
            .unwrap()
            .to_response(&conn)
            .unwrap();
        assert_eq!(comment.username.as_deref(), Some("bob"));
        assert_eq!(comment.content, "hello");

        let like = NewLike::new(alice.id, post.id)
            .insert(&conn)
            .unwrap()
            .to_response(&conn)
            .unwrap();
        assert_eq!(like.username.as_deref(), Some("alice"));

        let follow = NewFollow::new(bob.id, alice.id)
            .insert(&conn)
            .unwrap()
            .to_response(&conn)
            .unwrap();
        assert_eq!(follow.follower_username.as_deref(), Some("bob"));
        assert_eq!(follow.followed_username.as_deref(), Some("alice"));
    }

    #[test]
    fn missing_owner_serializes_as_null() {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("orphans.db");
        let pool = db::create_pool(&db_path, 1).unwrap();
        db::run_migrations(&pool).unwrap();
        let post = {
            let pooled = pool.get().unwrap();
            let alice = user(&pooled, "alice");
            NewPost::new(alice.id, "a.jpg").insert(&pooled).unwrap()
        };

        // Only reachable with enforcement off; cascades would otherwise remove the post.
        let conn = Connection::open(&db_path).unwrap();
        conn.execute_batch("PRAGMA foreign_keys = OFF;").unwrap();
        User::delete(&conn, post.user_id).unwrap();

        let json = serde_json::to_value(post.to_response(&conn).unwrap()).unwrap();
        assert!(json["username"].is_null());
        assert_eq!(json["user_id"], post.user_id);
    }
}
