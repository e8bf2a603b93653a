use chrono::Duration;

use hotel_auth::modules::auth::{AuthError, VerificationOutcome};
use hotel_auth::services::clock::Clock;
use hotel_auth::services::mailer::TemplateKind;

use crate::common::{registration, test_email, TestContext};

async fn pending_account(ctx: &TestContext) -> String {
    let email = test_email("pending");
    ctx.state.lifecycle.register(registration(&email)).await.unwrap();
    email
}

#[tokio::test]
async fn sixth_resend_within_a_day_hits_the_limit() {
    let ctx = TestContext::new();
    let email = pending_account(&ctx).await;

    for _ in 0..5 {
        ctx.clock.advance(Duration::minutes(3));
        ctx.state.lifecycle.resend_verification_email(&email).await.unwrap();
    }

    ctx.clock.advance(Duration::minutes(3));
    let result = ctx.state.lifecycle.resend_verification_email(&email).await;

    assert!(matches!(result, Err(AuthError::ResendLimitExceeded)));
    assert_eq!(ctx.account(&email).await.resend_count, 5);
    // Registration email plus five resends
    assert_eq!(ctx.mailer.count(TemplateKind::Verify), 6);
}

#[tokio::test]
async fn second_resend_within_cooldown_is_too_soon() {
    let ctx = TestContext::new();
    let email = pending_account(&ctx).await;

    ctx.clock.advance(Duration::minutes(3));
    ctx.state.lifecycle.resend_verification_email(&email).await.unwrap();

    ctx.clock.advance(Duration::minutes(1));
    let result = ctx.state.lifecycle.resend_verification_email(&email).await;

    assert!(matches!(result, Err(AuthError::ResendTooSoon { wait_seconds: 60 })));
}

#[tokio::test]
async fn resend_right_after_registration_waits_for_cooldown() {
    let ctx = TestContext::new();
    let email = pending_account(&ctx).await;

    ctx.clock.advance(Duration::seconds(30));
    let result = ctx.state.lifecycle.resend_verification_email(&email).await;

    assert!(matches!(result, Err(AuthError::ResendTooSoon { wait_seconds: 90 })));
}

#[tokio::test]
async fn resend_window_resets_after_a_day() {
    let ctx = TestContext::new();
    let email = pending_account(&ctx).await;

    for _ in 0..5 {
        ctx.clock.advance(Duration::minutes(3));
        ctx.state.lifecycle.resend_verification_email(&email).await.unwrap();
    }

    ctx.clock.advance(Duration::hours(24));
    ctx.state.lifecycle.resend_verification_email(&email).await.unwrap();

    let account = ctx.account(&email).await;
    assert_eq!(account.resend_count, 1);
    assert_eq!(account.last_resend_reset_at, Some(ctx.clock.now()));
}

#[tokio::test]
async fn resend_replaces_the_previous_token() {
    let ctx = TestContext::new();
    let email = pending_account(&ctx).await;
    let first = ctx.mailer.last_token(&email, TemplateKind::Verify).unwrap();

    ctx.clock.advance(Duration::minutes(2));
    ctx.state.lifecycle.resend_verification_email(&email).await.unwrap();
    let second = ctx.mailer.last_token(&email, TemplateKind::Verify).unwrap();
    assert_ne!(first, second);

    let account = ctx.account(&email).await;
    assert_eq!(account.verify_expires_at, Some(ctx.clock.now() + Duration::minutes(3)));

    assert_eq!(
        ctx.state.lifecycle.verify_email(&first).await.unwrap(),
        VerificationOutcome::Rejected
    );
    assert_eq!(
        ctx.state.lifecycle.verify_email(&second).await.unwrap(),
        VerificationOutcome::Verified
    );
}

#[tokio::test]
async fn resend_for_verified_or_unknown_email_fails() {
    let ctx = TestContext::new();
    let email = ctx.verified_account("verified").await;

    assert!(matches!(
        ctx.state.lifecycle.resend_verification_email(&email).await,
        Err(AuthError::AlreadyVerified)
    ));
    assert!(matches!(
        ctx.state.lifecycle.resend_verification_email("nobody@example.com").await,
        Err(AuthError::NotFound)
    ));
}
