use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;
use validator::Validate;

use crate::modules::auth::{
    interface::{AuthError, LoginResult, Result, VerificationOutcome},
    lifecycle::Registration,
    schema::{
        ErrorResponse, ForgotPasswordRequest, GoogleLoginRequest, LoginRequest, LoginResponse,
        LogoutAllResponse, LogoutRequest, MessageResponse, RefreshTokenRequest, RefreshTokenResponse,
        RegisterRequest, RegisterResponse, ResendVerificationRequest, ResetPasswordRequest,
        VerifyEmailRequest, VerifyEmailResponse, VerifyResetTokenRequest, VerifyResetTokenResponse,
    },
};
use crate::AppState;

type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = std::result::Result<(StatusCode, Json<T>), ApiError>;

fn bad_request(message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::with_message("validation_error", message)),
    )
}

/// Records the outcome and converts domain errors to the HTTP mapping.
fn track<T>(state: &AppState, operation: &str, result: Result<T>) -> std::result::Result<T, ApiError> {
    match result {
        Ok(value) => {
            state.auth_metrics.record_success(operation);
            Ok(value)
        }
        Err(e) => {
            state.auth_metrics.record_failure(operation, &e);
            if e.status_code().is_server_error() {
                tracing::error!(operation, error = %e, "Auth operation failed");
            } else {
                tracing::debug!(operation, error = %e, "Auth operation refused");
            }
            Err((e.status_code(), Json(ErrorResponse::from(&e))))
        }
    }
}

fn login_response(result: LoginResult) -> LoginResponse {
    LoginResponse {
        user: result.user,
        access_token: result.tokens.access_token,
        refresh_token: result.tokens.refresh_token,
        token_type: "Bearer",
        expires_in: result.tokens.expires_in,
    }
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<RegisterResponse> {
    if let Err(e) = req.validate() {
        return Err(bad_request(e.to_string()));
    }

    let registration = Registration {
        full_name: req.full_name,
        email: req.email,
        password: req.password,
        phone: req.phone,
    };
    let user = track(&state, "register", state.lifecycle.register(registration).await)?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user,
            message: "Check your inbox to verify your email address",
        }),
    ))
}

pub async fn verify_email(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VerifyEmailRequest>,
) -> ApiResult<VerifyEmailResponse> {
    // Unknown and expired tokens get the same answer
    let result = state
        .lifecycle
        .verify_email(&req.token)
        .await
        .and_then(|outcome| match outcome {
            VerificationOutcome::Verified => Ok(()),
            VerificationOutcome::Rejected => Err(AuthError::InvalidOrExpiredToken),
        });

    track(&state, "verify_email", result).map_err(|(status, body)| {
        if body.0.error == AuthError::InvalidOrExpiredToken.kind() {
            let body = ErrorResponse::with_message(body.0.error, "Invalid or expired verification link");
            (status, Json(body))
        } else {
            (status, body)
        }
    })?;

    Ok((
        StatusCode::OK,
        Json(VerifyEmailResponse {
            verified: true,
            message: "Email verified",
        }),
    ))
}

pub async fn resend_verification(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResendVerificationRequest>,
) -> ApiResult<MessageResponse> {
    track(
        &state,
        "resend_verification",
        state.lifecycle.resend_verification_email(&req.email).await,
    )?;

    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: "Verification email sent",
        }),
    ))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let result = track(&state, "login", state.lifecycle.login(&req.email, &req.password).await)?;
    Ok((StatusCode::OK, Json(login_response(result))))
}

pub async fn login_with_google(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GoogleLoginRequest>,
) -> ApiResult<LoginResponse> {
    let result = track(&state, "login_google", state.oauth.login_with_google(&req.id_token).await)?;
    Ok((StatusCode::OK, Json(login_response(result))))
}

pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RefreshTokenRequest>,
) -> ApiResult<RefreshTokenResponse> {
    let token = track(
        &state,
        "refresh",
        state.sessions.refresh_access_token(&req.refresh_token).await,
    )?;

    Ok((
        StatusCode::OK,
        Json(RefreshTokenResponse {
            access_token: token.access_token,
            token_type: "Bearer",
            expires_in: token.expires_in,
        }),
    ))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LogoutRequest>,
) -> ApiResult<MessageResponse> {
    track(
        &state,
        "logout",
        state.sessions.revoke_refresh_token(&req.refresh_token).await,
    )?;

    Ok((StatusCode::OK, Json(MessageResponse { message: "Logged out" })))
}

pub async fn logout_all(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<LogoutAllResponse> {
    let unauthorized = || {
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new("unauthorized")),
        )
    };

    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(unauthorized)?;
    let claims = state
        .sessions
        .verify_access_token(token)
        .map_err(|_| unauthorized())?;

    let revoked = track(
        &state,
        "logout_all",
        state.sessions.revoke_all_refresh_tokens(&claims.sub).await,
    )?;

    Ok((StatusCode::OK, Json(LogoutAllResponse { revoked })))
}

pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ForgotPasswordRequest>,
) -> ApiResult<MessageResponse> {
    track(
        &state,
        "forgot_password",
        state.lifecycle.request_password_reset(&req.email).await,
    )?;

    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: "If an account exists for this email, a reset link has been sent",
        }),
    ))
}

pub async fn verify_reset_token(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VerifyResetTokenRequest>,
) -> ApiResult<VerifyResetTokenResponse> {
    let valid = track(
        &state,
        "verify_reset_token",
        state.lifecycle.verify_reset_token(&req.token).await,
    )?;

    Ok((StatusCode::OK, Json(VerifyResetTokenResponse { valid })))
}

pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResetPasswordRequest>,
) -> ApiResult<MessageResponse> {
    if req.password != req.password_confirm {
        return Err(bad_request("Passwords do not match"));
    }

    track(
        &state,
        "reset_password",
        state.lifecycle.reset_password(&req.token, &req.password).await,
    )?;

    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: "Password updated, please sign in again",
        }),
    ))
}
