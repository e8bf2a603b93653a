use std::sync::Arc;

use super::interface::{AccessToken, AuthError, RefreshTokenRepository, Result, TokenPair};
use super::model::{AccountProfile, RefreshToken, Role};
use crate::services::jwt::{Claims, JwtService, TokenSubject};
use crate::services::tokens::digest_token;

/// Issues, validates and revokes access/refresh tokens.
///
/// A refresh token is honoured only while both hold: its signature and
/// claims verify, and its row is present and unexpired in the store. The two
/// expiries are computed from the same role rule but checked independently.
pub struct SessionManager {
    jwt: JwtService,
    refresh_tokens: Arc<dyn RefreshTokenRepository>,
}

impl SessionManager {
    pub fn new(jwt: JwtService, refresh_tokens: Arc<dyn RefreshTokenRepository>) -> Self {
        Self { jwt, refresh_tokens }
    }

    pub fn jwt(&self) -> &JwtService {
        &self.jwt
    }

    pub fn generate_access_token(&self, subject: &TokenSubject) -> Result<String> {
        self.jwt
            .create_access_token(subject)
            .map_err(|e| AuthError::Internal(format!("signing access token: {}", e)))
    }

    pub fn generate_refresh_token(&self, subject: &TokenSubject, role: Option<Role>) -> Result<String> {
        self.jwt
            .create_refresh_token(subject, role)
            .map_err(|e| AuthError::Internal(format!("signing refresh token: {}", e)))
    }

    pub async fn save_refresh_token(&self, account_id: &str, token: &str, role: Option<Role>) -> Result<()> {
        let now = self.jwt.now();
        let row = RefreshToken {
            token_hash: digest_token(token),
            account_id: account_id.to_string(),
            expires_at: now + self.jwt.refresh_ttl(role),
            created_at: now,
        };
        self.refresh_tokens.insert(&row).await
    }

    /// Mint and persist a fresh pair. Other sessions of the account stay valid.
    pub async fn issue_session(&self, account: &AccountProfile) -> Result<TokenPair> {
        let subject = TokenSubject {
            account_id: account.account_id.clone(),
            email: account.email.clone(),
            role: account.role,
        };

        let access_token = self.generate_access_token(&subject)?;
        let refresh_token = self.generate_refresh_token(&subject, Some(account.role))?;
        self.save_refresh_token(&account.account_id, &refresh_token, Some(account.role))
            .await?;

        tracing::debug!(account_id = %account.account_id, role = %account.role, "Session issued");

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in: self.jwt.get_access_token_duration_secs(),
        })
    }

    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<AccessToken> {
        let now = self.jwt.now();

        let row = self
            .refresh_tokens
            .find(&digest_token(refresh_token))
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;

        if row.expires_at <= now {
            tracing::debug!(account_id = %row.account_id, "Refresh token expired in store");
            return Err(AuthError::InvalidRefreshToken);
        }

        let claims = self.jwt.verify_refresh_token(refresh_token).map_err(|e| {
            tracing::debug!(account_id = %row.account_id, error = %e, "Refresh token failed verification");
            AuthError::InvalidRefreshToken
        })?;

        if claims.sub != row.account_id {
            tracing::warn!(account_id = %row.account_id, "Refresh token subject does not match its owner");
            return Err(AuthError::InvalidRefreshToken);
        }

        let subject = TokenSubject {
            account_id: claims.sub,
            email: claims.email,
            role: claims.role,
        };

        Ok(AccessToken {
            access_token: self.generate_access_token(&subject)?,
            expires_in: self.jwt.get_access_token_duration_secs(),
        })
    }

    pub fn verify_access_token(&self, token: &str) -> Result<Claims> {
        self.jwt
            .verify_access_token(token)
            .map_err(|_| AuthError::InvalidOrExpiredToken)
    }

    pub async fn revoke_refresh_token(&self, refresh_token: &str) -> Result<()> {
        let removed = self
            .refresh_tokens
            .delete_by_token(&digest_token(refresh_token))
            .await?;
        tracing::debug!(removed, "Refresh token revoked");
        Ok(())
    }

    pub async fn revoke_all_refresh_tokens(&self, account_id: &str) -> Result<u64> {
        let removed = self.refresh_tokens.delete_by_account(account_id).await?;
        tracing::info!(account_id, removed, "All refresh tokens revoked");
        Ok(removed)
    }
}
