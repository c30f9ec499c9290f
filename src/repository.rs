// Repository pattern - isolates all database side effects
use async_trait::async_trait;
use std::sync::Arc;

use crate::db::models::{
    Comment, Follow, Like, NewComment, NewFollow, NewLike, NewPost, NewUser, Post, User,
};
use crate::db::serialize::{
    CommentResponse, FollowResponse, LikeResponse, PostResponse, ToResponse, UserResponse,
};
use crate::db::DbPool;
use crate::error::{ModelError, ModelResult};
use crate::password;

/// Repository trait - all social-graph operations
#[async_trait]
pub trait SocialRepository: Send + Sync {
    /// Create a user; the plaintext password is hashed before storage
    async fn create_user(&self, new: NewUser) -> ModelResult<User>;
    async fn user(&self, id: i64) -> ModelResult<Option<User>>;
    async fn user_by_username(&self, username: &str) -> ModelResult<Option<User>>;
    /// Delete a user and everything that depends on them
    async fn delete_user(&self, id: i64) -> ModelResult<bool>;

    async fn create_post(&self, new: NewPost) -> ModelResult<Post>;
    async fn post(&self, id: i64) -> ModelResult<Option<Post>>;
    async fn delete_post(&self, id: i64) -> ModelResult<bool>;

    async fn add_comment(&self, new: NewComment) -> ModelResult<Comment>;
    async fn comment(&self, id: i64) -> ModelResult<Option<Comment>>;
    async fn delete_comment(&self, id: i64) -> ModelResult<bool>;

    async fn like_post(&self, new: NewLike) -> ModelResult<Like>;
    async fn like(&self, id: i64) -> ModelResult<Option<Like>>;
    async fn unlike_post(&self, user_id: i64, post_id: i64) -> ModelResult<bool>;

    async fn follow(&self, new: NewFollow) -> ModelResult<Follow>;
    async fn follow_edge(&self, id: i64) -> ModelResult<Option<Follow>>;
    async fn unfollow(&self, follower_id: i64, followed_id: i64) -> ModelResult<bool>;

    /// Posts owned by a user, oldest first
    async fn posts_by_user(&self, user_id: i64) -> ModelResult<Vec<Post>>;
    async fn comments_on_post(&self, post_id: i64) -> ModelResult<Vec<Comment>>;
    async fn likes_on_post(&self, post_id: i64) -> ModelResult<Vec<Like>>;
    /// Edges whose target is `user_id`
    async fn followers(&self, user_id: i64) -> ModelResult<Vec<Follow>>;
    /// Edges created by `user_id`
    async fn following(&self, user_id: i64) -> ModelResult<Vec<Follow>>;

    async fn user_response(&self, user: &User) -> ModelResult<UserResponse>;
    async fn post_response(&self, post: &Post) -> ModelResult<PostResponse>;
    async fn comment_response(&self, comment: &Comment) -> ModelResult<CommentResponse>;
    async fn like_response(&self, like: &Like) -> ModelResult<LikeResponse>;
    async fn follow_response(&self, follow: &Follow) -> ModelResult<FollowResponse>;
}

/// SQLite implementation
pub struct SqliteSocialRepository {
    pool: DbPool,
    password_cost: u32,
}

impl SqliteSocialRepository {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            password_cost: bcrypt::DEFAULT_COST,
        }
    }

    pub fn with_password_cost(mut self, cost: u32) -> Self {
        self.password_cost = cost;
        self
    }

    fn owned_collection<T>(
        &self,
        user_id: i64,
        f: impl FnOnce(&User, &rusqlite::Connection) -> ModelResult<Vec<T>>,
    ) -> ModelResult<Vec<T>> {
        let conn = self.pool.get()?;
        match User::find(&conn, user_id)? {
            Some(user) => f(&user, &conn),
            None => Err(ModelError::NotFound(format!("user {}", user_id))),
        }
    }

    fn post_collection<T>(
        &self,
        post_id: i64,
        f: impl FnOnce(&Post, &rusqlite::Connection) -> ModelResult<Vec<T>>,
    ) -> ModelResult<Vec<T>> {
        let conn = self.pool.get()?;
        match Post::find(&conn, post_id)? {
            Some(post) => f(&post, &conn),
            None => Err(ModelError::NotFound(format!("post {}", post_id))),
        }
    }

    fn respond<E: ToResponse>(&self, entity: &E) -> ModelResult<E::Response> {
        let conn = self.pool.get()?;
        entity.to_response(&conn)
    }
}

#[async_trait]
impl SocialRepository for SqliteSocialRepository {
    async fn create_user(&self, mut new: NewUser) -> ModelResult<User> {
        new.password = password::hash_password(&new.password, self.password_cost)?;
        let conn = self.pool.get()?;
        let user = new.insert(&conn)?;
        tracing::debug!("Created user {} ({})", user.id, user.username);
        Ok(user)
    }

    async fn user(&self, id: i64) -> ModelResult<Option<User>> {
        let conn = self.pool.get()?;
        User::find(&conn, id)
    }

    async fn user_by_username(&self, username: &str) -> ModelResult<Option<User>> {
        let conn = self.pool.get()?;
        User::find_by_username(&conn, username)
    }

    async fn delete_user(&self, id: i64) -> ModelResult<bool> {
        let conn = self.pool.get()?;
        let deleted = User::delete(&conn, id)?;
        if deleted {
            tracing::debug!("Deleted user {} with dependent rows", id);
        }
        Ok(deleted)
    }

    async fn create_post(&self, new: NewPost) -> ModelResult<Post> {
        let conn = self.pool.get()?;
        let post = new.insert(&conn)?;
        tracing::debug!("User {} created post {}", post.user_id, post.id);
        Ok(post)
    }

    async fn post(&self, id: i64) -> ModelResult<Option<Post>> {
        let conn = self.pool.get()?;
        Post::find(&conn, id)
    }

    async fn delete_post(&self, id: i64) -> ModelResult<bool> {
        let conn = self.pool.get()?;
        let deleted = Post::delete(&conn, id)?;
        if deleted {
            tracing::debug!("Deleted post {} with comments and likes", id);
        }
        Ok(deleted)
    }

    async fn add_comment(&self, new: NewComment) -> ModelResult<Comment> {
        let conn = self.pool.get()?;
        let comment = new.insert(&conn)?;
        tracing::debug!(
            "User {} commented on post {}",
            comment.user_id,
            comment.post_id
        );
        Ok(comment)
    }

    async fn comment(&self, id: i64) -> ModelResult<Option<Comment>> {
        let conn = self.pool.get()?;
        Comment::find(&conn, id)
    }

    async fn delete_comment(&self, id: i64) -> ModelResult<bool> {
        let conn = self.pool.get()?;
        Comment::delete(&conn, id)
    }

    async fn like_post(&self, new: NewLike) -> ModelResult<Like> {
        let conn = self.pool.get()?;
        let like = new.insert(&conn)?;
        tracing::debug!("User {} liked post {}", like.user_id, like.post_id);
        Ok(like)
    }

    async fn like(&self, id: i64) -> ModelResult<Option<Like>> {
        let conn = self.pool.get()?;
        Like::find(&conn, id)
    }

    async fn unlike_post(&self, user_id: i64, post_id: i64) -> ModelResult<bool> {
        let conn = self.pool.get()?;
        Like::delete_pair(&conn, user_id, post_id)
    }

    async fn follow(&self, new: NewFollow) -> ModelResult<Follow> {
        let conn = self.pool.get()?;
        let follow = new.insert(&conn)?;
        tracing::debug!(
            "User {} now follows user {}",
            follow.follower_id,
            follow.followed_id
        );
        Ok(follow)
    }

    async fn follow_edge(&self, id: i64) -> ModelResult<Option<Follow>> {
        let conn = self.pool.get()?;
        Follow::find(&conn, id)
    }

    async fn unfollow(&self, follower_id: i64, followed_id: i64) -> ModelResult<bool> {
        let conn = self.pool.get()?;
        Follow::delete_pair(&conn, follower_id, followed_id)
    }

    async fn posts_by_user(&self, user_id: i64) -> ModelResult<Vec<Post>> {
        self.owned_collection(user_id, |user, conn| user.posts(conn))
    }

    async fn comments_on_post(&self, post_id: i64) -> ModelResult<Vec<Comment>> {
        self.post_collection(post_id, |post, conn| post.comments(conn))
    }

    async fn likes_on_post(&self, post_id: i64) -> ModelResult<Vec<Like>> {
        self.post_collection(post_id, |post, conn| post.likes(conn))
    }

    async fn followers(&self, user_id: i64) -> ModelResult<Vec<Follow>> {
        self.owned_collection(user_id, |user, conn| user.followers(conn))
    }

    async fn following(&self, user_id: i64) -> ModelResult<Vec<Follow>> {
        self.owned_collection(user_id, |user, conn| user.following(conn))
    }

    async fn user_response(&self, user: &User) -> ModelResult<UserResponse> {
        self.respond(user)
    }

    async fn post_response(&self, post: &Post) -> ModelResult<PostResponse> {
        self.respond(post)
    }

    async fn comment_response(&self, comment: &Comment) -> ModelResult<CommentResponse> {
        self.respond(comment)
    }

    async fn like_response(&self, like: &Like) -> ModelResult<LikeResponse> {
        self.respond(like)
    }

    async fn follow_response(&self, follow: &Follow) -> ModelResult<FollowResponse> {
        self.respond(follow)
    }
}

/// Type alias for Arc-wrapped repository
pub type DynSocialRepository = Arc<dyn SocialRepository>;
