use hotel_auth::modules::auth::interface::AccountRepository;
use hotel_auth::modules::auth::model::{AccountPatch, AccountStatus, Role};
use hotel_auth::modules::auth::AuthError;
use hotel_auth::services::clock::Clock;

use crate::common::{registration, test_email, test_password, TestContext};

#[tokio::test]
async fn login_with_valid_credentials_returns_tokens() {
    let ctx = TestContext::new();
    let email = ctx.verified_account("guest").await;

    let result = ctx.state.lifecycle.login(&email, test_password()).await.unwrap();

    assert_eq!(result.user.email, email);
    assert_eq!(result.user.status, AccountStatus::Active);
    assert_eq!(result.tokens.expires_in, 15 * 60);

    let claims = ctx.state.sessions.verify_access_token(&result.tokens.access_token).unwrap();
    assert_eq!(claims.sub, result.user.account_id);
    assert_eq!(claims.role, Role::User);
    assert_eq!(ctx.store.refresh_token_count(&result.user.account_id), 1);
}

#[tokio::test]
async fn login_is_case_insensitive_on_email() {
    let ctx = TestContext::new();
    let email = ctx.verified_account("guest").await;

    let result = ctx.state.lifecycle.login(&email.to_uppercase(), test_password()).await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn each_login_adds_a_session() {
    let ctx = TestContext::new();
    let email = ctx.verified_account("guest").await;

    let first = ctx.state.lifecycle.login(&email, test_password()).await.unwrap();
    let second = ctx.state.lifecycle.login(&email, test_password()).await.unwrap();

    assert_ne!(first.tokens.refresh_token, second.tokens.refresh_token);
    assert_eq!(ctx.store.refresh_token_count(&first.user.account_id), 2);
}

#[tokio::test]
async fn login_on_pending_account_fails_without_tokens() {
    let ctx = TestContext::new();
    let email = test_email("pending");
    let profile = ctx.state.lifecycle.register(registration(&email)).await.unwrap();

    let result = ctx.state.lifecycle.login(&email, test_password()).await;

    assert!(matches!(result, Err(AuthError::NotVerified)));
    assert_eq!(ctx.store.refresh_token_count(&profile.account_id), 0);
}

#[tokio::test]
async fn login_on_banned_account_fails_without_tokens() {
    let ctx = TestContext::new();
    ctx.seed_account("ACC202603140001", "banned@example.com", Role::User, AccountStatus::Banned)
        .await;

    let result = ctx.state.lifecycle.login("banned@example.com", test_password()).await;

    assert!(matches!(result, Err(AuthError::Banned)));
    assert_eq!(ctx.store.refresh_token_count("ACC202603140001"), 0);
}

#[tokio::test]
async fn login_on_deleted_account_fails() {
    let ctx = TestContext::new();
    let email = ctx.verified_account("guest").await;
    let account = ctx.account(&email).await;

    ctx.state.lifecycle.soft_delete(&account.account_id).await.unwrap();
    let result = ctx.state.lifecycle.login(&email, test_password()).await;

    assert!(matches!(result, Err(AuthError::Deleted)));
}

#[tokio::test]
async fn login_with_wrong_password_fails() {
    let ctx = TestContext::new();
    let email = ctx.verified_account("guest").await;

    let result = ctx.state.lifecycle.login(&email, "WrongPassword123!").await;

    assert!(matches!(result, Err(AuthError::BadPassword)));
}

#[tokio::test]
async fn login_with_unknown_or_malformed_email_fails() {
    let ctx = TestContext::new();

    assert!(matches!(
        ctx.state.lifecycle.login("nobody@example.com", test_password()).await,
        Err(AuthError::NotFound)
    ));
    assert!(matches!(
        ctx.state.lifecycle.login("nobody", test_password()).await,
        Err(AuthError::InvalidEmail)
    ));
}

#[tokio::test]
async fn login_without_password_hash_is_bad_password() {
    let ctx = TestContext::new();
    ctx.seed_account("ACC202603140001", "social@example.com", Role::User, AccountStatus::Active)
        .await;
    let patch = AccountPatch {
        password_hash: Some(None),
        ..Default::default()
    };
    ctx.store
        .update("ACC202603140001", &patch, ctx.clock.now())
        .await
        .unwrap();

    let result = ctx.state.lifecycle.login("social@example.com", test_password()).await;

    assert!(matches!(result, Err(AuthError::BadPassword)));
}

#[tokio::test]
async fn soft_delete_of_unknown_account_fails() {
    let ctx = TestContext::new();

    let result = ctx.state.lifecycle.soft_delete("ACC209901010001").await;

    assert!(matches!(result, Err(AuthError::NotFound)));
}
