use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySql, Pool, QueryBuilder};

use super::interface::{AccountRepository, RefreshTokenRepository, Result};
use super::model::{Account, AccountPatch, AccountStatus, RefreshToken};

pub struct AccountCrud {
    pool: Pool<MySql>,
}

impl AccountCrud {
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountRepository for AccountCrud {
    async fn create(&self, account: &Account) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO accounts (
                account_id, email, full_name, phone, avatar_url, password_hash, status, is_verified,
                role, provider, provider_id, verify_token, verify_expires_at, resend_count,
                last_verification_email_at, last_resend_reset_at, reset_token, reset_expires_at,
                created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&account.account_id)
        .bind(&account.email)
        .bind(&account.full_name)
        .bind(&account.phone)
        .bind(&account.avatar_url)
        .bind(&account.password_hash)
        .bind(account.status.as_str())
        .bind(account.is_verified)
        .bind(account.role.as_str())
        .bind(account.provider.as_str())
        .bind(&account.provider_id)
        .bind(&account.verify_token)
        .bind(account.verify_expires_at)
        .bind(account.resend_count)
        .bind(account.last_verification_email_at)
        .bind(account.last_resend_reset_at)
        .bind(&account.reset_token)
        .bind(account.reset_expires_at)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, account_id: &str) -> Result<Option<Account>> {
        Ok(sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE account_id = ?")
            .bind(account_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        Ok(sqlx::query_as::<_, Account>(
            "SELECT * FROM accounts WHERE email = ? ORDER BY created_at ASC LIMIT 1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn find_by_verify_token(&self, token: &str) -> Result<Option<Account>> {
        Ok(sqlx::query_as::<_, Account>(
            "SELECT * FROM accounts WHERE verify_token = ? AND status = ? AND is_verified = FALSE",
        )
        .bind(token)
        .bind(AccountStatus::Pending.as_str())
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn find_by_reset_token(&self, token: &str) -> Result<Option<Account>> {
        Ok(sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE reset_token = ?")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn count_by_email(&self, email: &str) -> Result<i64> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM accounts WHERE email = ?")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;

        Ok(result.0)
    }

    async fn count_created_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<i64> {
        let result: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM accounts WHERE created_at >= ? AND created_at < ?")
                .bind(from)
                .bind(to)
                .fetch_one(&self.pool)
                .await?;

        Ok(result.0)
    }

    async fn update(&self, account_id: &str, patch: &AccountPatch, now: DateTime<Utc>) -> Result<()> {
        let mut qb = QueryBuilder::<MySql>::new("UPDATE accounts SET updated_at = ");
        qb.push_bind(now);

        if let Some(v) = &patch.full_name {
            qb.push(", full_name = ").push_bind(v.clone());
        }
        if let Some(v) = &patch.avatar_url {
            qb.push(", avatar_url = ").push_bind(v.clone());
        }
        if let Some(v) = &patch.password_hash {
            qb.push(", password_hash = ").push_bind(v.clone());
        }
        if let Some(v) = patch.status {
            qb.push(", status = ").push_bind(v.as_str());
        }
        if let Some(v) = patch.is_verified {
            qb.push(", is_verified = ").push_bind(v);
        }
        if let Some(v) = patch.provider {
            qb.push(", provider = ").push_bind(v.as_str());
        }
        if let Some(v) = &patch.provider_id {
            qb.push(", provider_id = ").push_bind(v.clone());
        }
        if let Some(v) = &patch.verify_token {
            qb.push(", verify_token = ").push_bind(v.clone());
        }
        if let Some(v) = patch.verify_expires_at {
            qb.push(", verify_expires_at = ").push_bind(v);
        }
        if let Some(v) = patch.resend_count {
            qb.push(", resend_count = ").push_bind(v);
        }
        if let Some(v) = patch.last_verification_email_at {
            qb.push(", last_verification_email_at = ").push_bind(v);
        }
        if let Some(v) = patch.last_resend_reset_at {
            qb.push(", last_resend_reset_at = ").push_bind(v);
        }
        if let Some(v) = &patch.reset_token {
            qb.push(", reset_token = ").push_bind(v.clone());
        }
        if let Some(v) = patch.reset_expires_at {
            qb.push(", reset_expires_at = ").push_bind(v);
        }

        qb.push(" WHERE account_id = ").push_bind(account_id.to_string());
        qb.build().execute(&self.pool).await?;

        Ok(())
    }

    async fn mark_verified(&self, account_id: &str, now: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE accounts
            SET is_verified = TRUE, status = ?, verify_token = NULL, verify_expires_at = NULL, updated_at = ?
            WHERE account_id = ?
            "#,
        )
        .bind(AccountStatus::Active.as_str())
        .bind(now)
        .bind(account_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn soft_delete(&self, account_id: &str, now: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE accounts SET status = ?, updated_at = ? WHERE account_id = ?")
            .bind(AccountStatus::Deleted.as_str())
            .bind(now)
            .bind(account_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn complete_password_reset(&self, account_id: &str, password_hash: &str, now: DateTime<Utc>) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE accounts
            SET password_hash = ?, reset_token = NULL, reset_expires_at = NULL, updated_at = ?
            WHERE account_id = ?
            "#,
        )
        .bind(password_hash)
        .bind(now)
        .bind(account_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM refresh_tokens WHERE account_id = ?")
            .bind(account_id)
            .execute(&mut *tx)
            .await?;

        // Dropping the transaction without commit rolls it back
        tx.commit().await?;

        Ok(())
    }

    async fn clear_expired_tokens(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        let verify = sqlx::query(
            "UPDATE accounts SET verify_token = NULL, verify_expires_at = NULL WHERE verify_expires_at < ?",
        )
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let reset = sqlx::query(
            "UPDATE accounts SET reset_token = NULL, reset_expires_at = NULL WHERE reset_expires_at < ?",
        )
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(verify.rows_affected() + reset.rows_affected())
    }
}

pub struct RefreshTokenCrud {
    pool: Pool<MySql>,
}

impl RefreshTokenCrud {
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshTokenRepository for RefreshTokenCrud {
    async fn insert(&self, token: &RefreshToken) -> Result<()> {
        sqlx::query(
            "INSERT INTO refresh_tokens (token_hash, account_id, expires_at, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&token.token_hash)
        .bind(&token.account_id)
        .bind(token.expires_at)
        .bind(token.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find(&self, token_hash: &str) -> Result<Option<RefreshToken>> {
        Ok(sqlx::query_as::<_, RefreshToken>("SELECT * FROM refresh_tokens WHERE token_hash = ?")
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_by_token(&self, token_hash: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE token_hash = ?")
            .bind(token_hash)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn delete_by_account(&self, account_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE account_id = ?")
            .bind(account_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
