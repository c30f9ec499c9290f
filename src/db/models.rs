use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

use crate::error::ModelResult;
use crate::password;

const USER_COLUMNS: &str =
    "id, username, email, password, full_name, bio, profile_pic, is_active, created_at";
const POST_COLUMNS: &str = "id, user_id, image_url, caption, location, created_at";
const COMMENT_COLUMNS: &str = "id, user_id, post_id, content, created_at";
const LIKE_COLUMNS: &str = "id, user_id, post_id, created_at";
const FOLLOW_COLUMNS: &str = "id, follower_id, followed_id, created_at";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    /// Stored bcrypt credential. Never leaves the process.
    #[serde(skip_serializing)]
    pub password: String,
    pub full_name: String,
    pub bio: Option<String>,
    pub profile_pic: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    pub id: i64,
    pub user_id: i64,
    pub image_url: String,
    pub caption: Option<String>,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comment {
    pub id: i64,
    pub user_id: i64,
    pub post_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Like {
    pub id: i64,
    pub user_id: i64,
    pub post_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Follow {
    pub id: i64,
    /// The user who follows
    pub follower_id: i64,
    /// The user being followed
    pub followed_id: i64,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    /// Credential as supplied by the caller. The repository hashes it
    /// before insert; `insert` stores it verbatim.
    pub password: String,
    pub full_name: String,
    pub bio: Option<String>,
    pub profile_pic: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl NewUser {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
        full_name: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
            full_name: full_name.into(),
            bio: None,
            profile_pic: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    pub fn bio(mut self, bio: impl Into<String>) -> Self {
        self.bio = Some(bio.into());
        self
    }

    pub fn profile_pic(mut self, profile_pic: impl Into<String>) -> Self {
        self.profile_pic = Some(profile_pic.into());
        self
    }

    pub fn active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn insert(&self, conn: &Connection) -> ModelResult<User> {
        conn.execute(
            "INSERT INTO user (username, email, password, full_name, bio, profile_pic, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                self.username,
                self.email,
                self.password,
                self.full_name,
                self.bio,
                self.profile_pic,
                self.is_active,
                self.created_at,
            ],
        )?;

        Ok(User {
            id: conn.last_insert_rowid(),
            username: self.username.clone(),
            email: self.email.clone(),
            password: self.password.clone(),
            full_name: self.full_name.clone(),
            bio: self.bio.clone(),
            profile_pic: self.profile_pic.clone(),
            is_active: self.is_active,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub user_id: i64,
    pub image_url: String,
    pub caption: Option<String>,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewPost {
    pub fn new(user_id: i64, image_url: impl Into<String>) -> Self {
        Self {
            user_id,
            image_url: image_url.into(),
            caption: None,
            location: None,
            created_at: Utc::now(),
        }
    }

    pub fn caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn insert(&self, conn: &Connection) -> ModelResult<Post> {
        conn.execute(
            "INSERT INTO post (user_id, image_url, caption, location, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                self.user_id,
                self.image_url,
                self.caption,
                self.location,
                self.created_at,
            ],
        )?;

        Ok(Post {
            id: conn.last_insert_rowid(),
            user_id: self.user_id,
            image_url: self.image_url.clone(),
            caption: self.caption.clone(),
            location: self.location.clone(),
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub user_id: i64,
    pub post_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl NewComment {
    pub fn new(user_id: i64, post_id: i64, content: impl Into<String>) -> Self {
        Self {
            user_id,
            post_id,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn insert(&self, conn: &Connection) -> ModelResult<Comment> {
        conn.execute(
            "INSERT INTO comment (user_id, post_id, content, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![self.user_id, self.post_id, self.content, self.created_at],
        )?;

        Ok(Comment {
            id: conn.last_insert_rowid(),
            user_id: self.user_id,
            post_id: self.post_id,
            content: self.content.clone(),
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewLike {
    pub user_id: i64,
    pub post_id: i64,
    pub created_at: DateTime<Utc>,
}

impl NewLike {
    pub fn new(user_id: i64, post_id: i64) -> Self {
        Self {
            user_id,
            post_id,
            created_at: Utc::now(),
        }
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn insert(&self, conn: &Connection) -> ModelResult<Like> {
        conn.execute(
            "INSERT INTO \"like\" (user_id, post_id, created_at) VALUES (?1, ?2, ?3)",
            params![self.user_id, self.post_id, self.created_at],
        )?;

        Ok(Like {
            id: conn.last_insert_rowid(),
            user_id: self.user_id,
            post_id: self.post_id,
            created_at: self.created_at,
        })
    }
}

/// A directed edge. `follower_id == followed_id` is accepted.
#[derive(Debug, Clone)]
pub struct NewFollow {
    pub follower_id: i64,
    pub followed_id: i64,
    pub created_at: DateTime<Utc>,
}

impl NewFollow {
    pub fn new(follower_id: i64, followed_id: i64) -> Self {
        Self {
            follower_id,
            followed_id,
            created_at: Utc::now(),
        }
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn insert(&self, conn: &Connection) -> ModelResult<Follow> {
        conn.execute(
            "INSERT INTO follow (follower_id, followed_id, created_at) VALUES (?1, ?2, ?3)",
            params![self.follower_id, self.followed_id, self.created_at],
        )?;

        Ok(Follow {
            id: conn.last_insert_rowid(),
            follower_id: self.follower_id,
            followed_id: self.followed_id,
            created_at: self.created_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

impl User {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            password: row.get(3)?,
            full_name: row.get(4)?,
            bio: row.get(5)?,
            profile_pic: row.get(6)?,
            is_active: row.get(7)?,
            created_at: row.get(8)?,
        })
    }
}

impl Post {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            image_url: row.get(2)?,
            caption: row.get(3)?,
            location: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}

impl Comment {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            post_id: row.get(2)?,
            content: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}

impl Like {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            post_id: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}

impl Follow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            follower_id: row.get(1)?,
            followed_id: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}

fn query_one<T>(
    conn: &Connection,
    sql: &str,
    key: impl rusqlite::ToSql,
    map: fn(&Row<'_>) -> rusqlite::Result<T>,
) -> ModelResult<Option<T>> {
    Ok(conn.query_row(sql, params![key], map).optional()?)
}

fn query_many<T>(
    conn: &Connection,
    sql: &str,
    key: i64,
    map: fn(&Row<'_>) -> rusqlite::Result<T>,
) -> ModelResult<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params![key], map)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn count(conn: &Connection, sql: &str, key: i64) -> ModelResult<u64> {
    let n: i64 = conn.query_row(sql, params![key], |row| row.get(0))?;
    Ok(n as u64)
}

fn delete(conn: &Connection, sql: &str, key: i64) -> ModelResult<bool> {
    Ok(conn.execute(sql, params![key])? > 0)
}

/// Username of `user_id`, or `None` when no such user row exists.
pub(crate) fn username_of(conn: &Connection, user_id: i64) -> ModelResult<Option<String>> {
    query_one(
        conn,
        "SELECT username FROM user WHERE id = ?1",
        user_id,
        |row| row.get(0),
    )
}

// ---------------------------------------------------------------------------
// Lookups, deletes and relationship navigation
// ---------------------------------------------------------------------------

impl User {
    pub fn find(conn: &Connection, id: i64) -> ModelResult<Option<Self>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM user WHERE id = ?1");
        query_one(conn, &sql, id, Self::from_row)
    }

    pub fn find_by_username(conn: &Connection, username: &str) -> ModelResult<Option<Self>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM user WHERE username = ?1");
        query_one(conn, &sql, username, Self::from_row)
    }

    /// Removes the user; posts, comments, likes and follow edges cascade.
    pub fn delete(conn: &Connection, id: i64) -> ModelResult<bool> {
        delete(conn, "DELETE FROM user WHERE id = ?1", id)
    }

    pub fn verify_password(&self, plaintext: &str) -> bool {
        password::verify_password(plaintext, &self.password)
    }

    pub fn posts(&self, conn: &Connection) -> ModelResult<Vec<Post>> {
        let sql = format!("SELECT {POST_COLUMNS} FROM post WHERE user_id = ?1 ORDER BY id");
        query_many(conn, &sql, self.id, Post::from_row)
    }

    pub fn comments(&self, conn: &Connection) -> ModelResult<Vec<Comment>> {
        let sql = format!("SELECT {COMMENT_COLUMNS} FROM comment WHERE user_id = ?1 ORDER BY id");
        query_many(conn, &sql, self.id, Comment::from_row)
    }

    pub fn likes(&self, conn: &Connection) -> ModelResult<Vec<Like>> {
        let sql = format!("SELECT {LIKE_COLUMNS} FROM \"like\" WHERE user_id = ?1 ORDER BY id");
        query_many(conn, &sql, self.id, Like::from_row)
    }

    /// Edges pointing at this user.
    pub fn followers(&self, conn: &Connection) -> ModelResult<Vec<Follow>> {
        let sql = format!("SELECT {FOLLOW_COLUMNS} FROM follow WHERE followed_id = ?1 ORDER BY id");
        query_many(conn, &sql, self.id, Follow::from_row)
    }

    /// Edges this user created.
    pub fn following(&self, conn: &Connection) -> ModelResult<Vec<Follow>> {
        let sql = format!("SELECT {FOLLOW_COLUMNS} FROM follow WHERE follower_id = ?1 ORDER BY id");
        query_many(conn, &sql, self.id, Follow::from_row)
    }

    pub fn posts_count(&self, conn: &Connection) -> ModelResult<u64> {
        count(conn, "SELECT COUNT(*) FROM post WHERE user_id = ?1", self.id)
    }

    pub fn followers_count(&self, conn: &Connection) -> ModelResult<u64> {
        count(
            conn,
            "SELECT COUNT(*) FROM follow WHERE followed_id = ?1",
            self.id,
        )
    }

    pub fn following_count(&self, conn: &Connection) -> ModelResult<u64> {
        count(
            conn,
            "SELECT COUNT(*) FROM follow WHERE follower_id = ?1",
            self.id,
        )
    }
}

impl Post {
    pub fn find(conn: &Connection, id: i64) -> ModelResult<Option<Self>> {
        let sql = format!("SELECT {POST_COLUMNS} FROM post WHERE id = ?1");
        query_one(conn, &sql, id, Self::from_row)
    }

    /// Removes the post together with its comments and likes.
    pub fn delete(conn: &Connection, id: i64) -> ModelResult<bool> {
        delete(conn, "DELETE FROM post WHERE id = ?1", id)
    }

    pub fn owner(&self, conn: &Connection) -> ModelResult<Option<User>> {
        User::find(conn, self.user_id)
    }

    pub fn comments(&self, conn: &Connection) -> ModelResult<Vec<Comment>> {
        let sql = format!("SELECT {COMMENT_COLUMNS} FROM comment WHERE post_id = ?1 ORDER BY id");
        query_many(conn, &sql, self.id, Comment::from_row)
    }

    pub fn likes(&self, conn: &Connection) -> ModelResult<Vec<Like>> {
        let sql = format!("SELECT {LIKE_COLUMNS} FROM \"like\" WHERE post_id = ?1 ORDER BY id");
        query_many(conn, &sql, self.id, Like::from_row)
    }

    pub fn comments_count(&self, conn: &Connection) -> ModelResult<u64> {
        count(conn, "SELECT COUNT(*) FROM comment WHERE post_id = ?1", self.id)
    }

    pub fn likes_count(&self, conn: &Connection) -> ModelResult<u64> {
        count(conn, "SELECT COUNT(*) FROM \"like\" WHERE post_id = ?1", self.id)
    }
}

impl Comment {
    pub fn find(conn: &Connection, id: i64) -> ModelResult<Option<Self>> {
        let sql = format!("SELECT {COMMENT_COLUMNS} FROM comment WHERE id = ?1");
        query_one(conn, &sql, id, Self::from_row)
    }

    pub fn delete(conn: &Connection, id: i64) -> ModelResult<bool> {
        delete(conn, "DELETE FROM comment WHERE id = ?1", id)
    }

    pub fn author(&self, conn: &Connection) -> ModelResult<Option<User>> {
        User::find(conn, self.user_id)
    }

    pub fn post(&self, conn: &Connection) -> ModelResult<Option<Post>> {
        Post::find(conn, self.post_id)
    }
}

impl Like {
    pub fn find(conn: &Connection, id: i64) -> ModelResult<Option<Self>> {
        let sql = format!("SELECT {LIKE_COLUMNS} FROM \"like\" WHERE id = ?1");
        query_one(conn, &sql, id, Self::from_row)
    }

    pub fn delete(conn: &Connection, id: i64) -> ModelResult<bool> {
        delete(conn, "DELETE FROM \"like\" WHERE id = ?1", id)
    }

    /// Removes the like `user_id` left on `post_id`, if any.
    pub fn delete_pair(conn: &Connection, user_id: i64, post_id: i64) -> ModelResult<bool> {
        let rows = conn.execute(
            "DELETE FROM \"like\" WHERE user_id = ?1 AND post_id = ?2",
            params![user_id, post_id],
        )?;
        Ok(rows > 0)
    }

    pub fn user(&self, conn: &Connection) -> ModelResult<Option<User>> {
        User::find(conn, self.user_id)
    }

    pub fn post(&self, conn: &Connection) -> ModelResult<Option<Post>> {
        Post::find(conn, self.post_id)
    }
}

impl Follow {
    pub fn find(conn: &Connection, id: i64) -> ModelResult<Option<Self>> {
        let sql = format!("SELECT {FOLLOW_COLUMNS} FROM follow WHERE id = ?1");
        query_one(conn, &sql, id, Self::from_row)
    }

    pub fn delete(conn: &Connection, id: i64) -> ModelResult<bool> {
        delete(conn, "DELETE FROM follow WHERE id = ?1", id)
    }

    pub fn delete_pair(conn: &Connection, follower_id: i64, followed_id: i64) -> ModelResult<bool> {
        let rows = conn.execute(
            "DELETE FROM follow WHERE follower_id = ?1 AND followed_id = ?2",
            params![follower_id, followed_id],
        )?;
        Ok(rows > 0)
    }

    pub fn follower(&self, conn: &Connection) -> ModelResult<Option<User>> {
        User::find(conn, self.follower_id)
    }

    pub fn followed(&self, conn: &Connection) -> ModelResult<Option<User>> {
        User::find(conn, self.followed_id)
    }
}
