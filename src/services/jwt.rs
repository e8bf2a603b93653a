use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode,
    errors::{Error, ErrorKind},
    DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::SessionSettings;
use crate::modules::auth::model::Role;
use crate::services::clock::Clock;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,        // account id
    pub email: String,
    pub role: Role,
    pub exp: i64,           // expiration time
    pub iat: i64,           // issued at
    pub jti: String,        // unique token id
}

/// Who a token is minted for.
#[derive(Debug, Clone)]
pub struct TokenSubject {
    pub account_id: String,
    pub email: String,
    pub role: Role,
}

pub struct JwtService {
    settings: SessionSettings,
    clock: Arc<dyn Clock>,
}

impl JwtService {
    pub fn new(settings: SessionSettings, clock: Arc<dyn Clock>) -> Self {
        Self { settings, clock }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Refresh lifetime: 6h for ADMIN/STAFF, 3d for USER, the configured
    /// default when the role is unknown.
    pub fn refresh_ttl(&self, role: Option<Role>) -> Duration {
        match role {
            Some(role) if role.is_elevated() => self.settings.elevated_refresh_ttl,
            Some(_) => self.settings.user_refresh_ttl,
            None => self.settings.default_refresh_ttl,
        }
    }

    pub fn create_access_token(&self, subject: &TokenSubject) -> Result<String, Error> {
        self.sign(subject, self.settings.access_token_ttl, &self.settings.access_secret)
    }

    pub fn create_refresh_token(&self, subject: &TokenSubject, role: Option<Role>) -> Result<String, Error> {
        self.sign(subject, self.refresh_ttl(role), &self.settings.refresh_secret)
    }

    pub fn verify_access_token(&self, token: &str) -> Result<Claims, Error> {
        self.verify(token, &self.settings.access_secret)
    }

    pub fn verify_refresh_token(&self, token: &str) -> Result<Claims, Error> {
        self.verify(token, &self.settings.refresh_secret)
    }

    pub fn get_access_token_duration_secs(&self) -> i64 {
        self.settings.access_token_ttl.num_seconds()
    }

    fn sign(&self, subject: &TokenSubject, ttl: Duration, secret: &str) -> Result<String, Error> {
        let now = self.clock.now();
        let exp = now + ttl;

        let claims = Claims {
            sub: subject.account_id.clone(),
            email: subject.email.clone(),
            role: subject.role,
            exp: exp.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
    }

    // Expiry is checked against the injected clock, not the library's wall clock.
    fn verify(&self, token: &str, secret: &str) -> Result<Claims, Error> {
        let mut validation = Validation::default();
        validation.validate_exp = false;

        let data = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)?;
        if data.claims.exp <= self.clock.now().timestamp() {
            return Err(Error::from(ErrorKind::ExpiredSignature));
        }
        Ok(data.claims)
    }
}
