pub mod config;
pub mod modules;
pub mod services;

use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use config::{AuthSettings, SessionSettings};
use modules::auth::interface::{AccountRepository, RefreshTokenRepository};
use modules::auth::{auth_routes, AccountLifecycle, IdentityVerifier, OAuthLinker, SessionManager};
use modules::metrics::metrics_routes;
use services::clock::Clock;
use services::jwt::JwtService;
use services::mailer::NotificationSink;
use services::metrics::{metrics_middleware, AuthMetricsCollector, MetricsRegistry};

/// Collaborators the auth core is assembled from.
pub struct AuthDependencies {
    pub accounts: Arc<dyn AccountRepository>,
    pub refresh_tokens: Arc<dyn RefreshTokenRepository>,
    pub notifier: Arc<dyn NotificationSink>,
    pub identity_verifier: Arc<dyn IdentityVerifier>,
    pub clock: Arc<dyn Clock>,
    pub session_settings: SessionSettings,
    pub auth_settings: AuthSettings,
}

pub struct AppState {
    pub lifecycle: Arc<AccountLifecycle>,
    pub sessions: Arc<SessionManager>,
    pub oauth: Arc<OAuthLinker>,
    pub metrics: Arc<MetricsRegistry>,
    pub auth_metrics: AuthMetricsCollector,
}

impl AppState {
    pub fn new(deps: AuthDependencies, metrics: Arc<MetricsRegistry>) -> Self {
        let jwt = JwtService::new(deps.session_settings, deps.clock.clone());
        let sessions = Arc::new(SessionManager::new(jwt, deps.refresh_tokens));

        let lifecycle = Arc::new(AccountLifecycle::new(
            deps.accounts.clone(),
            sessions.clone(),
            deps.notifier,
            deps.clock.clone(),
            deps.auth_settings,
        ));

        let oauth = Arc::new(OAuthLinker::new(
            deps.accounts,
            lifecycle.clone(),
            sessions.clone(),
            deps.identity_verifier,
            deps.clock,
        ));

        Self {
            lifecycle,
            sessions,
            oauth,
            auth_metrics: AuthMetricsCollector::new(metrics.clone()),
            metrics,
        }
    }
}

pub fn create_app(state: Arc<AppState>) -> Router {
    let metrics = state.metrics.clone();

    Router::new()
        .route("/", get(root))
        .nest("/auth", auth_routes())
        .with_state(state)
        .merge(metrics_routes(metrics.clone()))
        .layer(middleware::from_fn_with_state(metrics, metrics_middleware))
        .layer(RequestBodyLimitLayer::new(1024 * 16)) // 16KB max body
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn root() -> &'static str {
    "Hotel Booking Auth API"
}
