use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::interface::{AccountRepository, AuthError, RefreshTokenRepository, Result};
use super::model::{Account, AccountPatch, AccountStatus, RefreshToken};

#[derive(Default)]
struct Tables {
    accounts: HashMap<String, Account>,
    refresh_tokens: HashMap<String, RefreshToken>,
}

/// In-process credential store holding both tables behind one lock, so
/// multi-row operations are applied atomically. Used for tests and local runs.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn account_count(&self) -> usize {
        self.lock().accounts.len()
    }

    pub fn refresh_token_count(&self, account_id: &str) -> usize {
        self.lock()
            .refresh_tokens
            .values()
            .filter(|t| t.account_id == account_id)
            .count()
    }
}

#[async_trait]
impl AccountRepository for MemoryStore {
    async fn create(&self, account: &Account) -> Result<()> {
        let mut tables = self.lock();
        if tables.accounts.contains_key(&account.account_id) {
            return Err(AuthError::Store(format!("duplicate account id {}", account.account_id)));
        }
        tables.accounts.insert(account.account_id.clone(), account.clone());
        Ok(())
    }

    async fn find_by_id(&self, account_id: &str) -> Result<Option<Account>> {
        Ok(self.lock().accounts.get(account_id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        Ok(self
            .lock()
            .accounts
            .values()
            .filter(|a| a.email == email)
            .min_by_key(|a| a.created_at)
            .cloned())
    }

    async fn find_by_verify_token(&self, token: &str) -> Result<Option<Account>> {
        Ok(self
            .lock()
            .accounts
            .values()
            .find(|a| {
                a.verify_token.as_deref() == Some(token)
                    && a.status == AccountStatus::Pending
                    && !a.is_verified
            })
            .cloned())
    }

    async fn find_by_reset_token(&self, token: &str) -> Result<Option<Account>> {
        Ok(self
            .lock()
            .accounts
            .values()
            .find(|a| a.reset_token.as_deref() == Some(token))
            .cloned())
    }

    async fn count_by_email(&self, email: &str) -> Result<i64> {
        Ok(self.lock().accounts.values().filter(|a| a.email == email).count() as i64)
    }

    async fn count_created_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<i64> {
        Ok(self
            .lock()
            .accounts
            .values()
            .filter(|a| a.created_at >= from && a.created_at < to)
            .count() as i64)
    }

    async fn update(&self, account_id: &str, patch: &AccountPatch, now: DateTime<Utc>) -> Result<()> {
        let mut tables = self.lock();
        if let Some(account) = tables.accounts.get_mut(account_id) {
            patch.apply_to(account, now);
        }
        Ok(())
    }

    async fn mark_verified(&self, account_id: &str, now: DateTime<Utc>) -> Result<()> {
        let patch = AccountPatch {
            is_verified: Some(true),
            status: Some(AccountStatus::Active),
            verify_token: Some(None),
            verify_expires_at: Some(None),
            ..Default::default()
        };
        self.update(account_id, &patch, now).await
    }

    async fn soft_delete(&self, account_id: &str, now: DateTime<Utc>) -> Result<()> {
        let patch = AccountPatch {
            status: Some(AccountStatus::Deleted),
            ..Default::default()
        };
        self.update(account_id, &patch, now).await
    }

    async fn complete_password_reset(&self, account_id: &str, password_hash: &str, now: DateTime<Utc>) -> Result<()> {
        let mut tables = self.lock();
        let Some(account) = tables.accounts.get_mut(account_id) else {
            return Err(AuthError::NotFound);
        };

        AccountPatch {
            password_hash: Some(Some(password_hash.to_string())),
            reset_token: Some(None),
            reset_expires_at: Some(None),
            ..Default::default()
        }
        .apply_to(account, now);

        tables.refresh_tokens.retain(|_, t| t.account_id != account_id);
        Ok(())
    }

    async fn clear_expired_tokens(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut tables = self.lock();
        let mut cleared = 0;

        for account in tables.accounts.values_mut() {
            if account.verify_expires_at.is_some_and(|at| at < now) {
                account.verify_token = None;
                account.verify_expires_at = None;
                cleared += 1;
            }
            if account.reset_expires_at.is_some_and(|at| at < now) {
                account.reset_token = None;
                account.reset_expires_at = None;
                cleared += 1;
            }
        }

        Ok(cleared)
    }
}

#[async_trait]
impl RefreshTokenRepository for MemoryStore {
    async fn insert(&self, token: &RefreshToken) -> Result<()> {
        self.lock()
            .refresh_tokens
            .insert(token.token_hash.clone(), token.clone());
        Ok(())
    }

    async fn find(&self, token_hash: &str) -> Result<Option<RefreshToken>> {
        Ok(self.lock().refresh_tokens.get(token_hash).cloned())
    }

    async fn delete_by_token(&self, token_hash: &str) -> Result<u64> {
        Ok(self.lock().refresh_tokens.remove(token_hash).map_or(0, |_| 1))
    }

    async fn delete_by_account(&self, account_id: &str) -> Result<u64> {
        let mut tables = self.lock();
        let before = tables.refresh_tokens.len();
        tables.refresh_tokens.retain(|_, t| t.account_id != account_id);
        Ok((before - tables.refresh_tokens.len()) as u64)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut tables = self.lock();
        let before = tables.refresh_tokens.len();
        tables.refresh_tokens.retain(|_, t| t.expires_at > now);
        Ok((before - tables.refresh_tokens.len()) as u64)
    }
}
