use hotel_auth::modules::auth::interface::AccountRepository;
use hotel_auth::modules::auth::model::{AccountPatch, AccountStatus, Provider, Role};
use hotel_auth::services::clock::Clock;
use hotel_auth::modules::auth::{AuthError, ExternalIdentity};
use hotel_auth::services::mailer::TemplateKind;

use crate::common::{registration, test_password, TestContext};

const ID_TOKEN: &str = "google-id-token";

fn prime(ctx: &TestContext, email: &str) {
    ctx.verifier.prime(
        ID_TOKEN,
        ExternalIdentity {
            subject: "google-sub-1234".to_string(),
            email: email.to_string(),
            name: Some("Grace Hopper".to_string()),
            picture: Some("https://lh3.googleusercontent.com/a/photo".to_string()),
        },
    );
}

async fn count_with_email(ctx: &TestContext, email: &str) -> i64 {
    ctx.store.count_by_email(email).await.unwrap()
}

#[tokio::test]
async fn google_login_creates_active_account_for_new_email() {
    let ctx = TestContext::new();
    prime(&ctx, "Grace@Example.com");

    let result = ctx.state.oauth.login_with_google(ID_TOKEN).await.unwrap();

    assert_eq!(result.user.email, "grace@example.com");
    assert_eq!(result.user.full_name, "Grace Hopper");
    assert_eq!(result.user.status, AccountStatus::Active);
    assert!(result.user.is_verified);
    assert_eq!(result.user.role, Role::User);
    assert_eq!(result.user.provider, Provider::Google);
    assert_eq!(result.user.account_id, "ACC202603140001");

    let account = ctx.account("grace@example.com").await;
    assert!(account.password_hash.is_none());
    assert_eq!(account.provider_id.as_deref(), Some("google-sub-1234"));
    assert_eq!(ctx.store.refresh_token_count(&account.account_id), 1);
    assert!(ctx.state.sessions.refresh_access_token(&result.tokens.refresh_token).await.is_ok());
}

#[tokio::test]
async fn google_login_restores_deleted_account_without_new_row() {
    let ctx = TestContext::new();
    let email = ctx.verified_account("grace").await;
    let original = ctx.account(&email).await;
    ctx.state.lifecycle.soft_delete(&original.account_id).await.unwrap();
    prime(&ctx, &email);

    let result = ctx.state.oauth.login_with_google(ID_TOKEN).await.unwrap();

    assert_eq!(result.user.account_id, original.account_id);
    assert_eq!(result.user.status, AccountStatus::Active);
    assert!(result.user.is_verified);
    assert_eq!(result.user.provider, Provider::Google);
    assert_eq!(result.user.full_name, "Grace Hopper");
    assert_eq!(
        result.user.avatar_url.as_deref(),
        Some("https://lh3.googleusercontent.com/a/photo")
    );
    assert_eq!(count_with_email(&ctx, &email).await, 1);
    assert_eq!(ctx.store.account_count(), 1);
}

#[tokio::test]
async fn google_login_links_pending_local_account() {
    let ctx = TestContext::new();
    let email = "grace@example.com";
    ctx.state.lifecycle.register(registration(email)).await.unwrap();
    let verify_token = ctx.mailer.last_token(email, TemplateKind::Verify).unwrap();
    prime(&ctx, email);

    let result = ctx.state.oauth.login_with_google(ID_TOKEN).await.unwrap();

    assert_eq!(result.user.status, AccountStatus::Active);
    assert!(result.user.is_verified);
    assert_eq!(result.user.provider, Provider::Google);

    let account = ctx.account(email).await;
    assert_eq!(account.provider_id.as_deref(), Some("google-sub-1234"));
    assert!(account.verify_token.is_none());
    // Local password keeps working after linking
    assert!(account.password_hash.is_some());
    assert!(ctx.state.lifecycle.login(email, test_password()).await.is_ok());
    assert!(!ctx.state.lifecycle.verify_email(&verify_token).await.unwrap().is_verified());
    assert_eq!(count_with_email(&ctx, email).await, 1);
}

#[tokio::test]
async fn repeated_google_login_reuses_linked_account() {
    let ctx = TestContext::new();
    prime(&ctx, "grace@example.com");

    let first = ctx.state.oauth.login_with_google(ID_TOKEN).await.unwrap();
    let second = ctx.state.oauth.login_with_google(ID_TOKEN).await.unwrap();

    assert_eq!(first.user.account_id, second.user.account_id);
    assert_eq!(ctx.store.account_count(), 1);
    assert_eq!(ctx.store.refresh_token_count(&first.user.account_id), 2);
}

#[tokio::test]
async fn google_login_reaffirms_drifted_linked_account() {
    for drifted in [AccountStatus::Pending, AccountStatus::Banned] {
        let ctx = TestContext::new();
        prime(&ctx, "grace@example.com");
        let first = ctx.state.oauth.login_with_google(ID_TOKEN).await.unwrap();
        let patch = AccountPatch {
            status: Some(drifted),
            is_verified: Some(false),
            ..Default::default()
        };
        ctx.store
            .update(&first.user.account_id, &patch, ctx.clock.now())
            .await
            .unwrap();

        let second = ctx.state.oauth.login_with_google(ID_TOKEN).await.unwrap();

        assert_eq!(second.user.account_id, first.user.account_id);
        assert_eq!(second.user.status, AccountStatus::Active);
        assert!(second.user.is_verified);
        assert_eq!(second.user.provider, Provider::Google);
        let account = ctx.account("grace@example.com").await;
        assert_eq!(account.status, AccountStatus::Active);
        assert!(account.is_verified);
        assert_eq!(ctx.store.account_count(), 1);
    }
}

#[tokio::test]
async fn google_login_name_falls_back_to_email_local_part() {
    let ctx = TestContext::new();
    ctx.verifier.prime(
        ID_TOKEN,
        ExternalIdentity {
            subject: "google-sub-5678".to_string(),
            email: "nameless.guest@example.com".to_string(),
            name: None,
            picture: None,
        },
    );

    let result = ctx.state.oauth.login_with_google(ID_TOKEN).await.unwrap();

    assert_eq!(result.user.full_name, "nameless.guest");
}

#[tokio::test]
async fn google_login_with_unverifiable_token_fails() {
    let ctx = TestContext::new();

    let result = ctx.state.oauth.login_with_google("forged-token").await;

    assert!(matches!(result, Err(AuthError::InvalidAssertion)));
    assert_eq!(ctx.store.account_count(), 0);
}
