/// Outbound email over SMTP
use crate::config::EmailSettings;
use crate::error::{AppError, Result};
use crate::models::MailPayload;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;
use tracing::{info, warn};

/// Async SMTP transport wrapper. With no SMTP host configured it runs in
/// no-op mode and only logs, which keeps development and tests mail-free.
#[derive(Clone)]
pub struct Mailer {
    transport: Option<Arc<AsyncSmtpTransport<Tokio1Executor>>>,
    from: Mailbox,
    password_reset_base_url: Option<String>,
}

impl Mailer {
    pub fn new(config: &EmailSettings) -> Result<Self> {
        let from = config
            .smtp_from
            .parse::<Mailbox>()
            .map_err(|e| AppError::Internal(format!("Invalid SMTP_FROM address: {}", e)))?;

        let transport = if config.smtp_host.trim().is_empty() {
            warn!("SMTP host not configured; mailer will operate in no-op mode");
            None
        } else {
            let builder = if config.use_starttls {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            } else {
                AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            }
            .map_err(|e| AppError::Internal(format!("Failed to configure SMTP transport: {}", e)))?
            .port(config.smtp_port);

            let builder = if let (Some(username), Some(password)) =
                (&config.smtp_username, &config.smtp_password)
            {
                builder.credentials(Credentials::new(username.clone(), password.clone()))
            } else {
                builder
            };

            Some(Arc::new(builder.build()))
        };

        Ok(Self {
            transport,
            from,
            password_reset_base_url: config.password_reset_base_url.clone(),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    /// Send a recorded notification payload
    pub async fn send_payload(&self, recipient: &str, payload: &MailPayload) -> Result<()> {
        self.send_mail(recipient, payload.subject(), &payload.body())
            .await
    }

    /// Send the password reset link
    pub async fn send_password_reset(&self, recipient: &str, token: &str) -> Result<()> {
        let link = match &self.password_reset_base_url {
            Some(base) => format!("{}?token={}", base.trim_end_matches('/'), token),
            None => format!("https://compte.herime.com/reset-password?token={}", token),
        };
        let body = format!(
            "A password reset was requested for your account.\n\n\
             Follow this link to choose a new password:\n{}\n\n\
             The link expires in one hour. If you did not request this, you can ignore this email.",
            link
        );
        self.send_mail(recipient, "Reset your Herime password", &body)
            .await
    }

    async fn send_mail(&self, recipient: &str, subject: &str, body: &str) -> Result<()> {
        let Some(transport) = &self.transport else {
            info!(recipient, subject, "Mailer disabled, skipping send");
            return Ok(());
        };

        let to = recipient
            .parse::<Mailbox>()
            .map_err(|e| AppError::Mail(format!("Invalid recipient address: {}", e)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .body(body.to_string())
            .map_err(|e| AppError::Mail(format!("Failed to build message: {}", e)))?;

        transport.send(message).await?;

        info!(recipient, subject, "Email sent");
        Ok(())
    }
}
