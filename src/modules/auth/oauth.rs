use async_trait::async_trait;
use jsonwebtoken::{decode, decode_header, jwk::JwkSet, Algorithm, DecodingKey, Validation};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use super::interface::{AccountRepository, AuthError, LoginResult, Result};
use super::lifecycle::AccountLifecycle;
use super::model::{Account, AccountPatch, AccountStatus, Provider, Role};
use super::session::SessionManager;
use super::validation::normalize_email;
use crate::services::clock::Clock;

pub const GOOGLE_JWKS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";
const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

/// Identity asserted by an external provider after its token was verified.
#[derive(Debug, Clone)]
pub struct ExternalIdentity {
    pub subject: String,
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Fails with `InvalidAssertion` when the token does not verify or carries no email.
    async fn verify(&self, id_token: &str) -> Result<ExternalIdentity>;
}

#[derive(Debug, Deserialize)]
struct GoogleClaims {
    sub: String,
    email: Option<String>,
    email_verified: Option<bool>,
    name: Option<String>,
    picture: Option<String>,
}

/// An address Google reports as unverified is never trusted for linking.
fn identity_from_claims(claims: GoogleClaims) -> Result<ExternalIdentity> {
    if claims.email_verified == Some(false) {
        tracing::debug!(subject = %claims.sub, "Google identity has an unverified email");
        return Err(AuthError::InvalidAssertion);
    }

    let email = claims
        .email
        .filter(|e| !e.trim().is_empty())
        .ok_or(AuthError::InvalidAssertion)?;

    Ok(ExternalIdentity {
        subject: claims.sub,
        email,
        name: claims.name,
        picture: claims.picture,
    })
}

/// Verifies Google ID tokens against Google's published signing keys.
pub struct GoogleIdTokenVerifier {
    client: Client,
    client_id: String,
    jwks_url: String,
}

impl GoogleIdTokenVerifier {
    pub fn new(client_id: String) -> Self {
        Self::with_jwks_url(client_id, GOOGLE_JWKS_URL.to_string())
    }

    pub fn with_jwks_url(client_id: String, jwks_url: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        Self {
            client,
            client_id,
            jwks_url,
        }
    }

    async fn fetch_keys(&self) -> Result<JwkSet> {
        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AuthError::Internal(format!("fetching Google signing keys: {}", e)))?;

        response
            .json::<JwkSet>()
            .await
            .map_err(|e| AuthError::Internal(format!("decoding Google signing keys: {}", e)))
    }
}

#[async_trait]
impl IdentityVerifier for GoogleIdTokenVerifier {
    async fn verify(&self, id_token: &str) -> Result<ExternalIdentity> {
        let header = decode_header(id_token).map_err(|_| AuthError::InvalidAssertion)?;
        let kid = header.kid.ok_or(AuthError::InvalidAssertion)?;

        let keys = self.fetch_keys().await?;
        let jwk = keys.find(&kid).ok_or(AuthError::InvalidAssertion)?;
        let key = DecodingKey::from_jwk(jwk).map_err(|_| AuthError::InvalidAssertion)?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[self.client_id.as_str()]);
        validation.set_issuer(&GOOGLE_ISSUERS);

        let claims = decode::<GoogleClaims>(id_token, &key, &validation)
            .map_err(|e| {
                tracing::debug!(error = %e, "Google ID token rejected");
                AuthError::InvalidAssertion
            })?
            .claims;

        identity_from_claims(claims)
    }
}

/// Reconciles a verified external identity with local accounts: create,
/// restore a soft-deleted row, link a local row, or re-affirm an existing link.
pub struct OAuthLinker {
    accounts: Arc<dyn AccountRepository>,
    lifecycle: Arc<AccountLifecycle>,
    sessions: Arc<SessionManager>,
    verifier: Arc<dyn IdentityVerifier>,
    clock: Arc<dyn Clock>,
}

impl OAuthLinker {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        lifecycle: Arc<AccountLifecycle>,
        sessions: Arc<SessionManager>,
        verifier: Arc<dyn IdentityVerifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            accounts,
            lifecycle,
            sessions,
            verifier,
            clock,
        }
    }

    pub async fn login_with_google(&self, id_token: &str) -> Result<LoginResult> {
        let identity = self.verifier.verify(id_token).await?;
        let email = normalize_email(&identity.email);
        let now = self.clock.now();

        let account_id = match self.accounts.find_by_email(&email).await? {
            None => {
                let account = self.new_google_account(&identity, email, now).await?;
                self.accounts.create(&account).await?;
                tracing::info!(account_id = %account.account_id, "Account created from Google identity");
                account.account_id
            }
            Some(existing) if existing.status == AccountStatus::Deleted => {
                let mut patch = linked_patch(&identity);
                if let Some(name) = identity.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
                    patch.full_name = Some(name.to_string());
                }
                if let Some(picture) = &identity.picture {
                    patch.avatar_url = Some(Some(picture.clone()));
                }
                self.accounts.update(&existing.account_id, &patch, now).await?;
                tracing::info!(account_id = %existing.account_id, "Deleted account restored through Google");
                existing.account_id
            }
            Some(existing) if existing.provider != Provider::Google => {
                self.accounts
                    .update(&existing.account_id, &linked_patch(&identity), now)
                    .await?;
                tracing::info!(
                    account_id = %existing.account_id,
                    previous_provider = %existing.provider,
                    "Account linked to Google"
                );
                existing.account_id
            }
            Some(existing) => {
                let patch = AccountPatch {
                    status: Some(AccountStatus::Active),
                    is_verified: Some(true),
                    verify_token: Some(None),
                    verify_expires_at: Some(None),
                    ..Default::default()
                };
                self.accounts.update(&existing.account_id, &patch, now).await?;
                tracing::debug!(account_id = %existing.account_id, "Google link re-affirmed");
                existing.account_id
            }
        };

        // Hand back what the store holds, not what was patched in memory
        let account = self
            .accounts
            .find_by_id(&account_id)
            .await?
            .ok_or(AuthError::NotFound)?;
        let user = account.profile();
        let tokens = self.sessions.issue_session(&user).await?;

        Ok(LoginResult { user, tokens })
    }

    async fn new_google_account(
        &self,
        identity: &ExternalIdentity,
        email: String,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<Account> {
        let full_name = identity
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());

        Ok(Account {
            account_id: self.lifecycle.next_account_id(now).await?,
            email,
            full_name,
            phone: None,
            avatar_url: identity.picture.clone(),
            password_hash: None,
            status: AccountStatus::Active,
            is_verified: true,
            role: Role::User,
            provider: Provider::Google,
            provider_id: Some(identity.subject.clone()),
            verify_token: None,
            verify_expires_at: None,
            resend_count: 0,
            last_verification_email_at: None,
            last_resend_reset_at: None,
            reset_token: None,
            reset_expires_at: None,
            created_at: now,
            updated_at: now,
        })
    }
}

// Provider fields plus ACTIVE/verified; a pending verification is dropped
// since the provider has vouched for the address.
fn linked_patch(identity: &ExternalIdentity) -> AccountPatch {
    AccountPatch {
        status: Some(AccountStatus::Active),
        is_verified: Some(true),
        provider: Some(Provider::Google),
        provider_id: Some(Some(identity.subject.clone())),
        verify_token: Some(None),
        verify_expires_at: Some(None),
        ..Default::default()
    }
}
