use chrono::Duration;

/// Signing secrets and token lifetimes used by the session manager.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_token_ttl: Duration,
    /// Used when a refresh token is minted without a known role.
    pub default_refresh_ttl: Duration,
    pub user_refresh_ttl: Duration,
    /// ADMIN and STAFF sessions.
    pub elevated_refresh_ttl: Duration,
}

impl SessionSettings {
    pub fn new(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            access_token_ttl: Duration::minutes(15),
            default_refresh_ttl: Duration::days(7),
            user_refresh_ttl: Duration::days(3),
            elevated_refresh_ttl: Duration::hours(6),
        }
    }
}

/// Verification email resend limits.
#[derive(Debug, Clone, Copy)]
pub struct ResendLimits {
    pub max_per_window: i32,
    pub window: Duration,
    pub cooldown: Duration,
}

impl Default for ResendLimits {
    fn default() -> Self {
        Self {
            max_per_window: 5,
            window: Duration::hours(24),
            cooldown: Duration::minutes(2),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub password_min_length: usize,
    pub verify_token_ttl: Duration,
    pub reset_token_ttl: Duration,
    pub account_id_prefix: String,
    pub resend: ResendLimits,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            password_min_length: 8,
            verify_token_ttl: Duration::minutes(3),
            reset_token_ttl: Duration::minutes(15),
            account_id_prefix: "ACC".to_string(),
            resend: ResendLimits::default(),
        }
    }
}
