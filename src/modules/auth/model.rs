use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

#[derive(Debug, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

macro_rules! string_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "UPPERCASE")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl TryFrom<String> for $name {
            type Error = ParseEnumError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                match value.as_str() {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(ParseEnumError { kind: $kind, value }),
                }
            }
        }
    };
}

string_enum!(AccountStatus, "account status", {
    Pending => "PENDING",
    Active => "ACTIVE",
    Banned => "BANNED",
    Deleted => "DELETED",
});

string_enum!(Role, "role", {
    User => "USER",
    Staff => "STAFF",
    Admin => "ADMIN",
});

string_enum!(Provider, "provider", {
    Local => "LOCAL",
    Google => "GOOGLE",
    Facebook => "FACEBOOK",
});

impl Role {
    /// Roles that get the short refresh-token lifetime.
    pub fn is_elevated(&self) -> bool {
        matches!(self, Self::Admin | Self::Staff)
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct Account {
    pub account_id: String,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub password_hash: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: AccountStatus,
    pub is_verified: bool,
    #[sqlx(try_from = "String")]
    pub role: Role,
    #[sqlx(try_from = "String")]
    pub provider: Provider,
    pub provider_id: Option<String>,
    pub verify_token: Option<String>,
    pub verify_expires_at: Option<DateTime<Utc>>,
    pub resend_count: i32,
    pub last_verification_email_at: Option<DateTime<Utc>>,
    pub last_resend_reset_at: Option<DateTime<Utc>>,
    pub reset_token: Option<String>,
    pub reset_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Copy safe to hand to callers: no password hash and no outstanding tokens.
    pub fn profile(&self) -> AccountProfile {
        AccountProfile {
            account_id: self.account_id.clone(),
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            phone: self.phone.clone(),
            avatar_url: self.avatar_url.clone(),
            status: self.status,
            is_verified: self.is_verified,
            role: self.role,
            provider: self.provider,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountProfile {
    pub account_id: String,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub status: AccountStatus,
    pub is_verified: bool,
    pub role: Role,
    pub provider: Provider,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update of an account row. `None` leaves a column untouched;
/// for nullable columns `Some(None)` writes NULL.
#[derive(Debug, Clone, Default)]
pub struct AccountPatch {
    pub full_name: Option<String>,
    pub avatar_url: Option<Option<String>>,
    pub password_hash: Option<Option<String>>,
    pub status: Option<AccountStatus>,
    pub is_verified: Option<bool>,
    pub provider: Option<Provider>,
    pub provider_id: Option<Option<String>>,
    pub verify_token: Option<Option<String>>,
    pub verify_expires_at: Option<Option<DateTime<Utc>>>,
    pub resend_count: Option<i32>,
    pub last_verification_email_at: Option<Option<DateTime<Utc>>>,
    pub last_resend_reset_at: Option<Option<DateTime<Utc>>>,
    pub reset_token: Option<Option<String>>,
    pub reset_expires_at: Option<Option<DateTime<Utc>>>,
}

impl AccountPatch {
    /// Apply to an in-memory row, as the store would.
    pub fn apply_to(&self, account: &mut Account, now: DateTime<Utc>) {
        if let Some(v) = &self.full_name {
            account.full_name = v.clone();
        }
        if let Some(v) = &self.avatar_url {
            account.avatar_url = v.clone();
        }
        if let Some(v) = &self.password_hash {
            account.password_hash = v.clone();
        }
        if let Some(v) = self.status {
            account.status = v;
        }
        if let Some(v) = self.is_verified {
            account.is_verified = v;
        }
        if let Some(v) = self.provider {
            account.provider = v;
        }
        if let Some(v) = &self.provider_id {
            account.provider_id = v.clone();
        }
        if let Some(v) = &self.verify_token {
            account.verify_token = v.clone();
        }
        if let Some(v) = self.verify_expires_at {
            account.verify_expires_at = v;
        }
        if let Some(v) = self.resend_count {
            account.resend_count = v;
        }
        if let Some(v) = self.last_verification_email_at {
            account.last_verification_email_at = v;
        }
        if let Some(v) = self.last_resend_reset_at {
            account.last_resend_reset_at = v;
        }
        if let Some(v) = &self.reset_token {
            account.reset_token = v.clone();
        }
        if let Some(v) = self.reset_expires_at {
            account.reset_expires_at = v;
        }
        account.updated_at = now;
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct RefreshToken {
    pub token_hash: String,
    pub account_id: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
