//! Error taxonomy shared by every layer.
//!
//! Display strings are part of the HTTP contract: they are sent verbatim as
//! the `error` field of failure responses.

use thiserror::Error;

/// Top-level application error
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Notification(#[from] NotificationError),

    #[error("Rate limit exceeded")]
    RateLimited,
}

/// Store-level failures
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Account not found")]
    AccountNotFound(i32),

    /// Unique constraint on the id-card number was violated.
    #[error("Account exists!")]
    DuplicateAccount(String),

    /// Destination or internal source does not reference an account.
    #[error("Invalid Account ID")]
    InvalidAccountReference(String),

    #[error("Database connection error: {0}")]
    Connection(String),

    #[error("Database query error: {0}")]
    Query(String),

    #[error("Database migration error: {0}")]
    Migration(String),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                Self::DuplicateAccount(db_err.message().to_string())
            }
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                Self::InvalidAccountReference(db_err.message().to_string())
            }
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => Self::Connection(err.to_string()),
            _ => Self::Query(err.to_string()),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(DatabaseError::from(err))
    }
}

/// Request validation failures, reported before anything is persisted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid request payload")]
    InvalidPayload(String),

    #[error("Invalid account ID")]
    InvalidAccountId(String),

    #[error("Invalid ID Card")]
    InvalidIdCard,

    #[error("Invalid Name")]
    InvalidName,

    #[error("Invalid Email Address")]
    InvalidEmail,

    #[error("Invalid Amount")]
    InvalidAmount,

    #[error("Invalid Transaction Source")]
    InvalidSource,
}

/// Deposit notification delivery failures
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Invalid mail address: {0}")]
    Address(String),

    #[error("Failed to build notification message: {0}")]
    Message(String),

    #[error("Mail transport error: {0}")]
    Transport(String),
}
