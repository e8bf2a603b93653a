use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::model::{Account, AccountPatch, AccountProfile, RefreshToken};
use crate::services::mailer::DeliveryError;

// =============================================================================
// REPOSITORY TRAITS
// =============================================================================

pub type Result<T> = std::result::Result<T, AuthError>;

#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn create(&self, account: &Account) -> Result<()>;
    async fn find_by_id(&self, account_id: &str) -> Result<Option<Account>>;
    /// Any status, DELETED included. `email` is already lower-cased.
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>>;
    /// Only PENDING, unverified accounts match.
    async fn find_by_verify_token(&self, token: &str) -> Result<Option<Account>>;
    async fn find_by_reset_token(&self, token: &str) -> Result<Option<Account>>;
    async fn count_by_email(&self, email: &str) -> Result<i64>;
    /// Rows with `from <= created_at < to`.
    async fn count_created_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<i64>;
    async fn update(&self, account_id: &str, patch: &AccountPatch, now: DateTime<Utc>) -> Result<()>;
    async fn mark_verified(&self, account_id: &str, now: DateTime<Utc>) -> Result<()>;
    async fn soft_delete(&self, account_id: &str, now: DateTime<Utc>) -> Result<()>;
    /// Sets the new hash, clears the reset token and deletes every refresh
    /// token of the account as one unit of work.
    async fn complete_password_reset(&self, account_id: &str, password_hash: &str, now: DateTime<Utc>) -> Result<()>;
    /// Clears verification and reset tokens whose expiry has passed.
    async fn clear_expired_tokens(&self, now: DateTime<Utc>) -> Result<u64>;
}

#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    async fn insert(&self, token: &RefreshToken) -> Result<()>;
    async fn find(&self, token_hash: &str) -> Result<Option<RefreshToken>>;
    async fn delete_by_token(&self, token_hash: &str) -> Result<u64>;
    async fn delete_by_account(&self, account_id: &str) -> Result<u64>;
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64>;
}

// =============================================================================
// SERVICE RESULT TYPES
// =============================================================================

/// Result of redeeming an email verification token. Unknown and expired
/// tokens are both `Rejected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationOutcome {
    Verified,
    Rejected,
}

impl VerificationOutcome {
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccessToken {
    pub access_token: String,
    pub expires_in: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub user: AccountProfile,
    pub tokens: TokenPair,
}

// =============================================================================
// ERROR TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Email already exists")]
    DuplicateEmail,

    #[error("Account not found")]
    NotFound,

    #[error("Email already verified")]
    AlreadyVerified,

    #[error("Account is banned")]
    Banned,

    #[error("Account has been deleted")]
    Deleted,

    #[error("Email not verified")]
    NotVerified,

    #[error("Invalid email or password")]
    BadPassword,

    #[error("Verification email limit reached, try again tomorrow")]
    ResendLimitExceeded,

    #[error("Please wait {wait_seconds} seconds before requesting another email")]
    ResendTooSoon { wait_seconds: i64 },

    #[error("Invalid or expired token")]
    InvalidOrExpiredToken,

    #[error("Invalid or expired refresh token")]
    InvalidRefreshToken,

    #[error("Invalid identity assertion")]
    InvalidAssertion,

    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for AuthError {
    fn from(e: sqlx::Error) -> Self {
        Self::Store(e.to_string())
    }
}

impl From<crate::services::hashing::HashingError> for AuthError {
    fn from(e: crate::services::hashing::HashingError) -> Self {
        Self::Internal(e.to_string())
    }
}

impl AuthError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::InvalidEmail => StatusCode::BAD_REQUEST,
            Self::DuplicateEmail => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::AlreadyVerified => StatusCode::BAD_REQUEST,
            Self::Banned => StatusCode::BAD_REQUEST,
            Self::Deleted => StatusCode::BAD_REQUEST,
            Self::NotVerified => StatusCode::BAD_REQUEST,
            Self::BadPassword => StatusCode::BAD_REQUEST,
            Self::ResendLimitExceeded => StatusCode::BAD_REQUEST,
            Self::ResendTooSoon { .. } => StatusCode::BAD_REQUEST,
            Self::InvalidOrExpiredToken => StatusCode::BAD_REQUEST,
            Self::InvalidRefreshToken => StatusCode::FORBIDDEN,
            Self::InvalidAssertion => StatusCode::BAD_REQUEST,
            Self::Delivery(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable name, used in error bodies and metrics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::InvalidEmail => "invalid_email",
            Self::DuplicateEmail => "duplicate_email",
            Self::NotFound => "not_found",
            Self::AlreadyVerified => "already_verified",
            Self::Banned => "banned",
            Self::Deleted => "deleted",
            Self::NotVerified => "not_verified",
            Self::BadPassword => "bad_password",
            Self::ResendLimitExceeded => "resend_limit_exceeded",
            Self::ResendTooSoon { .. } => "resend_too_soon",
            Self::InvalidOrExpiredToken => "invalid_or_expired_token",
            Self::InvalidRefreshToken => "invalid_refresh_token",
            Self::InvalidAssertion => "invalid_assertion",
            Self::Delivery(_) => "delivery_error",
            Self::Store(_) => "store_error",
            Self::Internal(_) => "internal_error",
        }
    }
}
