use chrono::Duration;

use hotel_auth::modules::auth::model::AccountStatus;
use hotel_auth::modules::auth::VerificationOutcome;
use hotel_auth::services::mailer::TemplateKind;

use crate::common::{registration, test_email, TestContext};

#[tokio::test]
async fn alice_verifies_once_then_logs_in() {
    let ctx = TestContext::new();
    let email = "alice@example.com";
    ctx.state.lifecycle.register(registration(email)).await.unwrap();
    let token = ctx.mailer.last_token(email, TemplateKind::Verify).unwrap();

    ctx.clock.advance(Duration::minutes(2));
    let outcome = ctx.state.lifecycle.verify_email(&token).await.unwrap();
    assert_eq!(outcome, VerificationOutcome::Verified);

    let account = ctx.account(email).await;
    assert_eq!(account.status, AccountStatus::Active);
    assert!(account.is_verified);
    assert!(account.verify_token.is_none());
    assert!(account.verify_expires_at.is_none());

    ctx.clock.advance(Duration::minutes(8));
    let again = ctx.state.lifecycle.verify_email(&token).await.unwrap();
    assert_eq!(again, VerificationOutcome::Rejected);

    let login = ctx
        .state
        .lifecycle
        .login(email, crate::common::test_password())
        .await
        .unwrap();
    assert!(!login.tokens.access_token.is_empty());
    assert!(!login.tokens.refresh_token.is_empty());
    assert_eq!(login.user.email, email);
}

#[tokio::test]
async fn verify_email_succeeds_exactly_once() {
    let ctx = TestContext::new();
    let email = test_email("guest");
    ctx.state.lifecycle.register(registration(&email)).await.unwrap();
    let token = ctx.mailer.last_token(&email, TemplateKind::Verify).unwrap();

    assert!(ctx.state.lifecycle.verify_email(&token).await.unwrap().is_verified());
    assert!(!ctx.state.lifecycle.verify_email(&token).await.unwrap().is_verified());
    assert!(!ctx.state.lifecycle.verify_email(&token).await.unwrap().is_verified());
}

#[tokio::test]
async fn expired_verification_token_leaves_account_pending() {
    let ctx = TestContext::new();
    let email = test_email("guest");
    ctx.state.lifecycle.register(registration(&email)).await.unwrap();
    let token = ctx.mailer.last_token(&email, TemplateKind::Verify).unwrap();

    ctx.clock.advance(Duration::minutes(3) + Duration::seconds(1));
    let outcome = ctx.state.lifecycle.verify_email(&token).await.unwrap();

    assert_eq!(outcome, VerificationOutcome::Rejected);
    let account = ctx.account(&email).await;
    assert_eq!(account.status, AccountStatus::Pending);
    assert!(!account.is_verified);
}

#[tokio::test]
async fn verification_token_is_accepted_at_its_expiry_instant() {
    let ctx = TestContext::new();
    let email = test_email("guest");
    ctx.state.lifecycle.register(registration(&email)).await.unwrap();
    let token = ctx.mailer.last_token(&email, TemplateKind::Verify).unwrap();

    ctx.clock.advance(Duration::minutes(3));

    assert!(ctx.state.lifecycle.verify_email(&token).await.unwrap().is_verified());
}

#[tokio::test]
async fn unknown_token_is_rejected_like_expired_one() {
    let ctx = TestContext::new();

    let outcome = ctx.state.lifecycle.verify_email("0".repeat(64).as_str()).await.unwrap();

    assert_eq!(outcome, VerificationOutcome::Rejected);
}
