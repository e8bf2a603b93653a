use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use super::interface::{AccountRepository, AuthError, LoginResult, Result, VerificationOutcome};
use super::model::{Account, AccountPatch, AccountProfile, AccountStatus, Provider, Role};
use super::session::SessionManager;
use super::validation::{check_email, check_full_name, check_password, normalize_email};
use crate::config::AuthSettings;
use crate::services::clock::Clock;
use crate::services::hashing;
use crate::services::mailer::{NotificationSink, TemplateKind};
use crate::services::resend_policy::{self, ResendDenial, ResendState};
use crate::services::tokens::generate_opaque_token;

#[derive(Debug, Clone)]
pub struct Registration {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
}

/// Registration, email verification, resend throttling, credential checks
/// and (in `password_reset.rs`) the reset-token flow.
pub struct AccountLifecycle {
    pub(super) accounts: Arc<dyn AccountRepository>,
    pub(super) sessions: Arc<SessionManager>,
    pub(super) notifier: Arc<dyn NotificationSink>,
    pub(super) clock: Arc<dyn Clock>,
    pub(super) settings: AuthSettings,
}

impl AccountLifecycle {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        sessions: Arc<SessionManager>,
        notifier: Arc<dyn NotificationSink>,
        clock: Arc<dyn Clock>,
        settings: AuthSettings,
    ) -> Self {
        Self {
            accounts,
            sessions,
            notifier,
            clock,
            settings,
        }
    }

    pub fn settings(&self) -> &AuthSettings {
        &self.settings
    }

    /// `prefix + YYYYMMDD + 4-digit sequence`, the sequence being one past the
    /// number of accounts created so far today (UTC).
    ///
    /// Two concurrent calls on the same day can read the same count and
    /// produce the same id; the insert of the second one then fails.
    pub async fn next_account_id(&self, now: DateTime<Utc>) -> Result<String> {
        let day_start = now
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|d| d.and_utc())
            .ok_or_else(|| AuthError::Internal("invalid day boundary".to_string()))?;
        let day_end = day_start + Duration::days(1);

        let created_today = self.accounts.count_created_between(day_start, day_end).await?;

        Ok(format!(
            "{}{}{:04}",
            self.settings.account_id_prefix,
            now.format("%Y%m%d"),
            created_today + 1
        ))
    }

    pub async fn register(&self, registration: Registration) -> Result<AccountProfile> {
        let full_name = check_full_name(&registration.full_name)?;
        check_password(&registration.password, self.settings.password_min_length)?;
        let email = check_email(&registration.email)?;

        if self.accounts.count_by_email(&email).await? > 0 {
            return Err(AuthError::DuplicateEmail);
        }

        let password_hash = hashing::hash_password(&registration.password)?;
        let now = self.clock.now();
        let verify_token = generate_opaque_token();

        let account = Account {
            account_id: self.next_account_id(now).await?,
            email,
            full_name,
            phone: registration
                .phone
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
            avatar_url: None,
            password_hash: Some(password_hash),
            status: AccountStatus::Pending,
            is_verified: false,
            role: Role::User,
            provider: Provider::Local,
            provider_id: None,
            verify_token: Some(verify_token.clone()),
            verify_expires_at: Some(now + self.settings.verify_token_ttl),
            resend_count: 0,
            last_verification_email_at: Some(now),
            last_resend_reset_at: None,
            reset_token: None,
            reset_expires_at: None,
            created_at: now,
            updated_at: now,
        };

        self.accounts.create(&account).await?;
        tracing::info!(account_id = %account.account_id, "Account registered, verification pending");

        // The PENDING row stays behind on failure so the user can ask for a resend
        self.notifier
            .send(&account.email, TemplateKind::Verify, Some(&verify_token))
            .await
            .map_err(|e| {
                tracing::error!(account_id = %account.account_id, error = %e, "Verification email failed");
                AuthError::from(e)
            })?;

        Ok(account.profile())
    }

    pub async fn verify_email(&self, token: &str) -> Result<VerificationOutcome> {
        let Some(account) = self.accounts.find_by_verify_token(token).await? else {
            return Ok(VerificationOutcome::Rejected);
        };

        let now = self.clock.now();
        match account.verify_expires_at {
            Some(expires_at) if now <= expires_at => {}
            _ => {
                tracing::debug!(account_id = %account.account_id, "Verification token expired");
                return Ok(VerificationOutcome::Rejected);
            }
        }

        self.accounts.mark_verified(&account.account_id, now).await?;
        tracing::info!(account_id = %account.account_id, "Email verified");

        Ok(VerificationOutcome::Verified)
    }

    pub async fn resend_verification_email(&self, email: &str) -> Result<()> {
        let email = normalize_email(email);
        let account = self
            .accounts
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::NotFound)?;

        if account.is_verified {
            return Err(AuthError::AlreadyVerified);
        }

        let now = self.clock.now();
        let state = ResendState {
            resend_count: account.resend_count,
            last_sent_at: account.last_verification_email_at,
            window_started_at: account.last_resend_reset_at,
        };

        let grant = resend_policy::evaluate(&self.settings.resend, state, now).map_err(|denial| {
            tracing::debug!(account_id = %account.account_id, ?denial, "Verification resend refused");
            match denial {
                ResendDenial::LimitExceeded => AuthError::ResendLimitExceeded,
                ResendDenial::TooSoon { wait_seconds } => AuthError::ResendTooSoon { wait_seconds },
            }
        })?;

        let verify_token = generate_opaque_token();
        let patch = AccountPatch {
            verify_token: Some(Some(verify_token.clone())),
            verify_expires_at: Some(Some(now + self.settings.verify_token_ttl)),
            resend_count: Some(grant.resend_count),
            last_verification_email_at: Some(Some(now)),
            last_resend_reset_at: Some(Some(grant.window_started_at)),
            status: Some(AccountStatus::Pending),
            ..Default::default()
        };
        self.accounts.update(&account.account_id, &patch, now).await?;

        tracing::info!(
            account_id = %account.account_id,
            resend_count = grant.resend_count,
            "Verification email re-issued"
        );

        self.notifier
            .send(&account.email, TemplateKind::Verify, Some(&verify_token))
            .await?;

        Ok(())
    }

    pub async fn verify_login_credentials(&self, email: &str, password: &str) -> Result<AccountProfile> {
        let email = check_email(email)?;
        let account = self
            .accounts
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::NotFound)?;

        match account.status {
            AccountStatus::Banned => return Err(AuthError::Banned),
            AccountStatus::Deleted => return Err(AuthError::Deleted),
            _ => {}
        }

        if !account.is_verified || account.status == AccountStatus::Pending {
            return Err(AuthError::NotVerified);
        }

        let Some(hash) = account.password_hash.as_deref() else {
            return Err(AuthError::BadPassword);
        };
        if !hashing::verify_password(password, hash)? {
            tracing::debug!(account_id = %account.account_id, "Password mismatch");
            return Err(AuthError::BadPassword);
        }

        Ok(account.profile())
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResult> {
        let profile = self.verify_login_credentials(email, password).await?;
        let tokens = self.sessions.issue_session(&profile).await?;

        tracing::info!(account_id = %profile.account_id, "Login succeeded");

        Ok(LoginResult { user: profile, tokens })
    }

    pub async fn soft_delete(&self, account_id: &str) -> Result<()> {
        if self.accounts.find_by_id(account_id).await?.is_none() {
            return Err(AuthError::NotFound);
        }
        self.accounts.soft_delete(account_id, self.clock.now()).await?;
        tracing::info!(account_id, "Account soft-deleted");
        Ok(())
    }
}
