//! Email dispatcher. Notification fan-out only sees the `EmailDispatcher`
//! trait; delivery goes over SMTP via lettre.

use crate::config::AppConfig;
use async_trait::async_trait;
use lettre::{
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use thiserror::Error;
use tracing::instrument;

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(String),

    /// Failed to build the email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(String),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
}

/// Contract the notification fan-out depends on. The from-address belongs to
/// the dispatcher's own configuration.
#[async_trait]
pub trait EmailDispatcher: Send + Sync {
    async fn send(&self, subject: &str, body: &str, to: &[String]) -> Result<(), EmailError>;
}

/// SMTP-backed mailer for transactional plain-text mail.
#[derive(Clone)]
pub struct SmtpMailer {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpMailer {
    /// Create a new mailer from configuration.
    pub fn new(config: &AppConfig) -> Result<Self, EmailError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.clone(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| EmailError::Smtp(e.to_string()))?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_email().to_string(),
        })
    }
}

#[async_trait]
impl EmailDispatcher for SmtpMailer {
    #[instrument(skip(self, body), fields(subject = %subject))]
    async fn send(&self, subject: &str, body: &str, to: &[String]) -> Result<(), EmailError> {
        let from = self
            .from_address
            .parse()
            .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?;

        let mut builder = Message::builder()
            .from(from)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN);

        for recipient in to {
            let mailbox = recipient
                .parse()
                .map_err(|_| EmailError::InvalidAddress(recipient.clone()))?;
            builder = builder.to(mailbox);
        }

        let message = builder
            .body(body.to_string())
            .map_err(|e| EmailError::MessageBuild(e.to_string()))?;

        self.mailer
            .send(message)
            .await
            .map_err(|e| EmailError::Smtp(e.to_string()))?;

        Ok(())
    }
}
