use super::interface::{AuthError, Result};
use super::lifecycle::AccountLifecycle;
use super::model::AccountPatch;
use super::validation::{check_password, normalize_email};
use crate::services::hashing;
use crate::services::mailer::TemplateKind;
use crate::services::tokens::generate_opaque_token;

impl AccountLifecycle {
    /// Always succeeds from the caller's point of view, whether or not the
    /// email belongs to an account.
    pub async fn request_password_reset(&self, email: &str) -> Result<()> {
        let email = normalize_email(email);
        let Some(account) = self.accounts.find_by_email(&email).await? else {
            tracing::debug!("Password reset requested for unknown email");
            return Ok(());
        };

        let now = self.clock.now();
        let reset_token = generate_opaque_token();
        let patch = AccountPatch {
            reset_token: Some(Some(reset_token.clone())),
            reset_expires_at: Some(Some(now + self.settings.reset_token_ttl)),
            ..Default::default()
        };
        self.accounts.update(&account.account_id, &patch, now).await?;
        tracing::info!(account_id = %account.account_id, "Password reset token issued");

        if let Err(e) = self
            .notifier
            .send(&account.email, TemplateKind::Reset, Some(&reset_token))
            .await
        {
            tracing::error!(account_id = %account.account_id, error = %e, "Password reset email failed");
        }

        Ok(())
    }

    pub async fn verify_reset_token(&self, token: &str) -> Result<bool> {
        let Some(account) = self.accounts.find_by_reset_token(token).await? else {
            return Ok(false);
        };
        Ok(account
            .reset_expires_at
            .is_some_and(|expires_at| self.clock.now() <= expires_at))
    }

    /// Changes the password and signs the account out everywhere in one unit
    /// of work. The confirmation email is sent after commit and its failure
    /// does not undo anything.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<()> {
        let account = self
            .accounts
            .find_by_reset_token(token)
            .await?
            .ok_or(AuthError::InvalidOrExpiredToken)?;

        let now = self.clock.now();
        if !account.reset_expires_at.is_some_and(|expires_at| now <= expires_at) {
            return Err(AuthError::InvalidOrExpiredToken);
        }

        check_password(new_password, self.settings.password_min_length)?;
        let password_hash = hashing::hash_password(new_password)?;

        self.accounts
            .complete_password_reset(&account.account_id, &password_hash, now)
            .await?;
        tracing::info!(account_id = %account.account_id, "Password reset, all sessions revoked");

        if let Err(e) = self
            .notifier
            .send(&account.email, TemplateKind::PasswordChanged, None)
            .await
        {
            tracing::warn!(account_id = %account.account_id, error = %e, "Password change notice not delivered");
        }

        Ok(())
    }
}
