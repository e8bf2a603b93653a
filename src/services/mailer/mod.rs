pub mod templates;

use async_trait::async_trait;
use lettre::{
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use serde::Serialize;

pub use templates::{action_url, render, RenderedMail};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TemplateKind {
    Verify,
    Reset,
    PasswordChanged,
}

impl TemplateKind {
    pub fn subject(&self) -> &'static str {
        match self {
            Self::Verify => "Verify your email address",
            Self::Reset => "Reset your password",
            Self::PasswordChanged => "Your password was changed",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("Invalid mail address {0}")]
    Address(String),

    #[error("Could not build mail message: {0}")]
    Message(String),

    #[error("SMTP delivery failed: {0}")]
    Transport(String),
}

/// Out-of-band email delivery.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, to: &str, kind: TemplateKind, token: Option<&str>) -> Result<(), DeliveryError>;
}

#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
    pub app_base_url: String,
}

/// Renders each notification and relays it over SMTP.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    app_base_url: String,
}

impl SmtpMailer {
    pub fn new(settings: &SmtpSettings) -> Result<Self, DeliveryError> {
        let from: Mailbox = settings
            .from
            .parse()
            .map_err(|_| DeliveryError::Address(settings.from.clone()))?;

        // 465 is implicit TLS, everything else negotiates STARTTLS
        let builder = if settings.port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
        }
        .map_err(|e| DeliveryError::Transport(format!("SMTP relay error: {}", e)))?
        .port(settings.port);

        let builder = match (&settings.username, &settings.password) {
            (Some(username), Some(password)) => {
                builder.credentials(Credentials::new(username.clone(), password.clone()))
            }
            _ => builder,
        };

        Ok(Self {
            transport: builder.build(),
            from,
            app_base_url: settings.app_base_url.clone(),
        })
    }

    pub fn build_message(&self, to: &str, kind: TemplateKind, token: Option<&str>) -> Result<Message, DeliveryError> {
        let recipient: Mailbox = to.parse().map_err(|_| DeliveryError::Address(to.to_string()))?;
        let link = action_url(&self.app_base_url, kind, token);
        let mail = render(kind, to, link.as_deref());

        Message::builder()
            .from(self.from.clone())
            .to(recipient)
            .subject(mail.subject)
            .multipart(MultiPart::alternative_plain_html(mail.text, mail.html))
            .map_err(|e| DeliveryError::Message(e.to_string()))
    }
}

#[async_trait]
impl NotificationSink for SmtpMailer {
    async fn send(&self, to: &str, kind: TemplateKind, token: Option<&str>) -> Result<(), DeliveryError> {
        let message = self.build_message(to, kind, token)?;

        self.transport.send(message).await.map_err(|e| {
            tracing::warn!(to, ?kind, error = %e, "SMTP relay refused message");
            DeliveryError::Transport(e.to_string())
        })?;

        tracing::debug!(to, ?kind, "Mail accepted by SMTP relay");
        Ok(())
    }
}

/// Writes notifications to the log instead of sending them. For local runs
/// without a mail relay.
#[derive(Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl NotificationSink for LogMailer {
    async fn send(&self, to: &str, kind: TemplateKind, token: Option<&str>) -> Result<(), DeliveryError> {
        tracing::info!(to, ?kind, token = token.unwrap_or("-"), "Mail delivery disabled, logging notification");
        Ok(())
    }
}
