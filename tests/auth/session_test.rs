use chrono::Duration;
use std::sync::Arc;

use hotel_auth::config::SessionSettings;
use hotel_auth::modules::auth::interface::RefreshTokenRepository;
use hotel_auth::modules::auth::model::{AccountStatus, RefreshToken, Role};
use hotel_auth::modules::auth::AuthError;
use hotel_auth::services::clock::Clock;
use hotel_auth::services::jwt::{JwtService, TokenSubject};
use hotel_auth::services::tokens::digest_token;

use crate::common::{test_password, TestContext};

async fn session_for(ctx: &TestContext, role: Role) -> (String, String) {
    let email = format!("{}@example.com", role.as_str().to_lowercase());
    ctx.seed_account("ACC202603140001", &email, role, AccountStatus::Active).await;
    let result = ctx.state.lifecycle.login(&email, test_password()).await.unwrap();
    (result.user.account_id, result.tokens.refresh_token)
}

/// Mints a USER refresh token outside the session manager and stores a row
/// for it owned by `owner`, expiring at `row_ttl` from now.
async fn plant_refresh_token(
    ctx: &TestContext,
    refresh_secret: &str,
    subject_id: &str,
    owner: &str,
    row_ttl: Duration,
) -> String {
    let jwt = JwtService::new(
        SessionSettings::new("test-access-secret", refresh_secret),
        Arc::new(ctx.clock.clone()),
    );
    let token = jwt
        .create_refresh_token(
            &TokenSubject {
                account_id: subject_id.to_string(),
                email: "user@example.com".to_string(),
                role: Role::User,
            },
            Some(Role::User),
        )
        .unwrap();

    let now = ctx.clock.now();
    ctx.store
        .insert(&RefreshToken {
            token_hash: digest_token(&token),
            account_id: owner.to_string(),
            expires_at: now + row_ttl,
            created_at: now,
        })
        .await
        .unwrap();
    token
}

#[tokio::test]
async fn refresh_returns_new_access_token_for_same_account() {
    let ctx = TestContext::new();
    let (account_id, refresh_token) = session_for(&ctx, Role::User).await;

    let token = ctx.state.sessions.refresh_access_token(&refresh_token).await.unwrap();

    let claims = ctx.state.sessions.verify_access_token(&token.access_token).unwrap();
    assert_eq!(claims.sub, account_id);
    assert_eq!(token.expires_in, 15 * 60);
}

#[tokio::test]
async fn admin_refresh_token_expires_after_six_hours() {
    let ctx = TestContext::new();
    let (_, refresh_token) = session_for(&ctx, Role::Admin).await;

    ctx.clock.advance(Duration::hours(5) + Duration::minutes(59));
    assert!(ctx.state.sessions.refresh_access_token(&refresh_token).await.is_ok());

    ctx.clock.advance(Duration::minutes(2));
    let result = ctx.state.sessions.refresh_access_token(&refresh_token).await;
    assert!(matches!(result, Err(AuthError::InvalidRefreshToken)));
}

#[tokio::test]
async fn staff_refresh_token_uses_elevated_lifetime() {
    let ctx = TestContext::new();
    let (_, refresh_token) = session_for(&ctx, Role::Staff).await;

    ctx.clock.advance(Duration::hours(6) + Duration::seconds(1));

    assert!(ctx.state.sessions.refresh_access_token(&refresh_token).await.is_err());
}

#[tokio::test]
async fn user_refresh_token_outlives_six_hours_but_not_three_days() {
    let ctx = TestContext::new();
    let (_, refresh_token) = session_for(&ctx, Role::User).await;

    ctx.clock.advance(Duration::hours(6) + Duration::seconds(1));
    assert!(ctx.state.sessions.refresh_access_token(&refresh_token).await.is_ok());

    ctx.clock.advance(Duration::days(3));
    let result = ctx.state.sessions.refresh_access_token(&refresh_token).await;
    assert!(matches!(result, Err(AuthError::InvalidRefreshToken)));
}

#[tokio::test]
async fn access_token_expires_after_fifteen_minutes() {
    let ctx = TestContext::new();
    let email = ctx.verified_account("guest").await;
    let login = ctx.state.lifecycle.login(&email, test_password()).await.unwrap();

    ctx.clock.advance(Duration::minutes(14));
    assert!(ctx.state.sessions.verify_access_token(&login.tokens.access_token).is_ok());

    ctx.clock.advance(Duration::minutes(2));
    assert!(ctx.state.sessions.verify_access_token(&login.tokens.access_token).is_err());
}

#[tokio::test]
async fn revoked_refresh_token_is_rejected() {
    let ctx = TestContext::new();
    let (_, refresh_token) = session_for(&ctx, Role::User).await;

    ctx.state.sessions.revoke_refresh_token(&refresh_token).await.unwrap();

    assert!(matches!(
        ctx.state.sessions.refresh_access_token(&refresh_token).await,
        Err(AuthError::InvalidRefreshToken)
    ));
}

#[tokio::test]
async fn revoke_all_removes_every_session_of_the_account() {
    let ctx = TestContext::new();
    let email = ctx.verified_account("guest").await;
    let first = ctx.state.lifecycle.login(&email, test_password()).await.unwrap();
    let second = ctx.state.lifecycle.login(&email, test_password()).await.unwrap();

    let revoked = ctx
        .state
        .sessions
        .revoke_all_refresh_tokens(&first.user.account_id)
        .await
        .unwrap();

    assert_eq!(revoked, 2);
    assert!(ctx.state.sessions.refresh_access_token(&first.tokens.refresh_token).await.is_err());
    assert!(ctx.state.sessions.refresh_access_token(&second.tokens.refresh_token).await.is_err());
}

#[tokio::test]
async fn access_token_cannot_be_used_as_refresh_token() {
    let ctx = TestContext::new();
    let email = ctx.verified_account("guest").await;
    let login = ctx.state.lifecycle.login(&email, test_password()).await.unwrap();

    let result = ctx.state.sessions.refresh_access_token(&login.tokens.access_token).await;

    assert!(matches!(result, Err(AuthError::InvalidRefreshToken)));
}

#[tokio::test]
async fn unknown_refresh_token_is_rejected() {
    let ctx = TestContext::new();

    let result = ctx.state.sessions.refresh_access_token("not-a-token").await;

    assert!(matches!(result, Err(AuthError::InvalidRefreshToken)));
}

#[tokio::test]
async fn stored_token_signed_with_another_secret_is_rejected() {
    let ctx = TestContext::new();
    let (account_id, refresh_token) = session_for(&ctx, Role::User).await;
    let forged =
        plant_refresh_token(&ctx, "some-other-secret", &account_id, &account_id, Duration::days(3)).await;

    let result = ctx.state.sessions.refresh_access_token(&forged).await;

    assert!(matches!(result, Err(AuthError::InvalidRefreshToken)));
    assert!(ctx.state.sessions.refresh_access_token(&refresh_token).await.is_ok());
}

#[tokio::test]
async fn token_past_its_own_expiry_is_rejected_even_if_row_lives_on() {
    let ctx = TestContext::new();
    let (account_id, _) = session_for(&ctx, Role::User).await;
    let token =
        plant_refresh_token(&ctx, "test-refresh-secret", &account_id, &account_id, Duration::days(30)).await;
    assert!(ctx.state.sessions.refresh_access_token(&token).await.is_ok());

    ctx.clock.advance(Duration::days(3) + Duration::seconds(1));

    let result = ctx.state.sessions.refresh_access_token(&token).await;
    assert!(matches!(result, Err(AuthError::InvalidRefreshToken)));
}

#[tokio::test]
async fn token_stored_under_another_account_is_rejected() {
    let ctx = TestContext::new();
    let (account_id, _) = session_for(&ctx, Role::User).await;
    ctx.seed_account("ACC202603140002", "other@example.com", Role::User, AccountStatus::Active)
        .await;
    let token = plant_refresh_token(
        &ctx,
        "test-refresh-secret",
        &account_id,
        "ACC202603140002",
        Duration::days(3),
    )
    .await;

    let result = ctx.state.sessions.refresh_access_token(&token).await;

    assert!(matches!(result, Err(AuthError::InvalidRefreshToken)));
}
