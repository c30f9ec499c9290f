use std::fmt;

use rusqlite::ffi;
use rusqlite::ErrorCode;

/// Unique constraints declared by the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UniqueConstraint {
    Username,
    Email,
    /// `unique_user_post_like`: a user likes a post at most once.
    LikePair,
    /// `unique_follower_followed`: one edge per (follower, followed).
    FollowPair,
    /// Column list reported by SQLite for anything else.
    Other(String),
}

impl UniqueConstraint {
    /// Map the column list from "UNIQUE constraint failed: ..." onto a known constraint.
    fn from_columns(columns: &str) -> Self {
        match columns.trim() {
            "user.username" => Self::Username,
            "user.email" => Self::Email,
            "like.user_id, like.post_id" => Self::LikePair,
            "follow.follower_id, follow.followed_id" => Self::FollowPair,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for UniqueConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Username => write!(f, "username already taken"),
            Self::Email => write!(f, "email already registered"),
            Self::LikePair => write!(f, "post already liked by this user"),
            Self::FollowPair => write!(f, "user already followed"),
            Self::Other(columns) => write!(f, "{}", columns),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(UniqueConstraint),

    #[error("Foreign key target does not exist")]
    ForeignKeyViolation,

    #[error("Constraint violated: {0}")]
    Constraint(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Password hashing error: {0}")]
    Password(#[from] bcrypt::BcryptError),
}

impl ModelError {
    /// True for every storage-level constraint failure.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            ModelError::UniqueViolation(_)
                | ModelError::ForeignKeyViolation
                | ModelError::Constraint(_)
        )
    }
}

impl From<rusqlite::Error> for ModelError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, message)
                if code.code == ErrorCode::ConstraintViolation =>
            {
                let message = message.clone().unwrap_or_default();
                match code.extended_code {
                    ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                        let columns = message
                            .strip_prefix("UNIQUE constraint failed:")
                            .unwrap_or(&message);
                        ModelError::UniqueViolation(UniqueConstraint::from_columns(columns))
                    }
                    ffi::SQLITE_CONSTRAINT_FOREIGNKEY => ModelError::ForeignKeyViolation,
                    _ => ModelError::Constraint(message),
                }
            }
            _ => ModelError::Database(err),
        }
    }
}

pub type ModelResult<T> = Result<T, ModelError>;
