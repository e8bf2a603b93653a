use chrono::Duration;
use std::env;

use super::settings::{AuthSettings, SessionSettings};
use crate::services::mailer::SmtpSettings;

/// Longest lifetime accepted for any configured duration.
pub const MAX_CONFIGURED_DAYS: i64 = 5 * 365;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Environment configuration
/// Loads and validates environment variables once at startup
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub google_client_id: String,
    /// Unset means notifications are only logged.
    pub smtp: Option<SmtpSettings>,
    pub token_sweep_interval: Duration,
    pub session: SessionSettings,
    pub auth: AuthSettings,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let database_url = required("DATABASE_URL")?;
        let access_secret = required("JWT_ACCESS_SECRET")?;
        let refresh_secret = required("JWT_REFRESH_SECRET")?;
        let google_client_id = required("GOOGLE_CLIENT_ID")?;

        let mut session = SessionSettings::new(access_secret, refresh_secret);
        session.access_token_ttl = duration_var("ACCESS_TOKEN_TTL", session.access_token_ttl)?;
        session.default_refresh_ttl = duration_var("REFRESH_TOKEN_TTL", session.default_refresh_ttl)?;

        let mut auth = AuthSettings::default();
        auth.reset_token_ttl = duration_var("RESET_TOKEN_TTL", auth.reset_token_ttl)?;
        if let Ok(raw) = env::var("PASSWORD_MIN_LENGTH") {
            auth.password_min_length = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid { name: "PASSWORD_MIN_LENGTH", value: raw.clone() })?;
        }

        Ok(Self {
            database_url,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            google_client_id,
            smtp: smtp_settings()?,
            token_sweep_interval: duration_var("TOKEN_SWEEP_INTERVAL", Duration::hours(1))?,
            session,
            auth,
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn smtp_settings() -> Result<Option<SmtpSettings>, ConfigError> {
    let Ok(host) = env::var("SMTP_HOST") else {
        return Ok(None);
    };

    let port = match env::var("SMTP_PORT") {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name: "SMTP_PORT", value: raw.clone() })?,
        Err(_) => 587,
    };

    Ok(Some(SmtpSettings {
        host,
        port,
        username: env::var("SMTP_USERNAME").ok(),
        password: env::var("SMTP_PASSWORD").ok(),
        from: env::var("MAIL_FROM").unwrap_or_else(|_| "no-reply@localhost".to_string()),
        app_base_url: env::var("APP_BASE_URL").unwrap_or_else(|_| "http://localhost:5173".to_string()),
    }))
}

fn duration_var(name: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    match env::var(name) {
        Ok(raw) => parse_duration(&raw).ok_or(ConfigError::Invalid { name, value: raw }),
        Err(_) => Ok(default),
    }
}

/// Parses lifetimes such as `15m`, `6h`, `7d` or `1h 30m`. Zero and anything
/// longer than [`MAX_CONFIGURED_DAYS`] are rejected, so `now + ttl` can never
/// leave the representable date range at request time.
pub fn parse_duration(raw: &str) -> Option<Duration> {
    let parsed = humantime::parse_duration(raw.trim()).ok()?;
    let duration = Duration::from_std(parsed).ok()?;

    if duration <= Duration::zero() || duration > Duration::days(MAX_CONFIGURED_DAYS) {
        return None;
    }
    Some(duration)
}
