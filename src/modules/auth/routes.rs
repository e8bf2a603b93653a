use axum::{routing::post, Router};
use std::sync::Arc;

use crate::AppState;
use super::controller;

pub fn auth_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(controller::register))
        .route("/verify-email", post(controller::verify_email))
        .route("/resend-verification", post(controller::resend_verification))
        .route("/login", post(controller::login))
        .route("/google", post(controller::login_with_google))
        .route("/refresh", post(controller::refresh))
        .route("/logout", post(controller::logout))
        .route("/logout-all", post(controller::logout_all))
        .route("/forgot-password", post(controller::forgot_password))
        .route("/verify-reset-token", post(controller::verify_reset_token))
        .route("/reset-password", post(controller::reset_password))
}
