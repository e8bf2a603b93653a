use hotel_auth::config::{init_db, run_migrations, Config};
use hotel_auth::modules::auth::crud::{AccountCrud, RefreshTokenCrud};
use hotel_auth::modules::auth::{GoogleIdTokenVerifier, TokenSweeper};
use hotel_auth::services::clock::{Clock, SystemClock};
use hotel_auth::services::mailer::{LogMailer, NotificationSink, SmtpMailer};
use hotel_auth::services::metrics::{AuthMetricsCollector, MetricsRegistry};
use hotel_auth::{AppState, AuthDependencies};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hotel_auth=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    let db = init_db(&config.database_url).await?;
    run_migrations(&db).await?;
    tracing::info!("Connected to MySQL, migrations applied");

    let notifier: Arc<dyn NotificationSink> = match &config.smtp {
        Some(smtp) => {
            tracing::info!(host = %smtp.host, port = smtp.port, "Relaying mail over SMTP");
            Arc::new(SmtpMailer::new(smtp)?)
        }
        None => {
            tracing::warn!("SMTP_HOST not set, notifications will only be logged");
            Arc::new(LogMailer)
        }
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let accounts = Arc::new(AccountCrud::new(db.clone()));
    let refresh_tokens = Arc::new(RefreshTokenCrud::new(db));
    let metrics = MetricsRegistry::new()?;

    let sweep_every = config.token_sweep_interval.to_std()?;
    TokenSweeper::new(accounts.clone(), refresh_tokens.clone(), clock.clone())
        .with_metrics(AuthMetricsCollector::new(metrics.clone()))
        .spawn(sweep_every);

    let state = AppState::new(
        AuthDependencies {
            accounts,
            refresh_tokens,
            notifier,
            identity_verifier: Arc::new(GoogleIdTokenVerifier::new(config.google_client_id.clone())),
            clock,
            session_settings: config.session.clone(),
            auth_settings: config.auth.clone(),
        },
        metrics,
    );

    let app = hotel_auth::create_app(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server running on http://{}", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
