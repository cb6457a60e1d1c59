//! Email service for password-reset codes.
//!
//! Uses SMTP via lettre for delivery. When SMTP is not configured (local
//! development), messages are logged instead of sent so the reset flow stays
//! exercisable.

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType,
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::EmailConfig;

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
}

/// Email service for transactional mail.
#[derive(Clone)]
pub enum EmailService {
    /// SMTP-backed delivery.
    Smtp {
        mailer: AsyncSmtpTransport<Tokio1Executor>,
        from_address: String,
    },
    /// No SMTP configured: log the message instead of sending.
    LogOnly,
}

impl EmailService {
    /// Create an email service from optional SMTP configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay configuration is invalid.
    pub fn new(config: Option<&EmailConfig>) -> Result<Self, SmtpError> {
        let Some(config) = config else {
            tracing::warn!("SMTP not configured; reset codes will be logged, not emailed");
            return Ok(Self::LogOnly);
        };

        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self::Smtp {
            mailer,
            from_address: config.from_address.clone(),
        })
    }

    /// Send a password-reset code.
    ///
    /// # Errors
    ///
    /// Returns `EmailError::InvalidAddress` for unparsable addresses and
    /// `EmailError::Smtp` on delivery failure.
    pub async fn send_reset_code(
        &self,
        to: &str,
        name: &str,
        code: &str,
    ) -> Result<(), EmailError> {
        let body = format!(
            "Hi {name},\n\n\
             Your password reset code is: {code}\n\n\
             The code expires in 10 minutes. If you didn't request a reset,\n\
             you can safely ignore this email.\n"
        );

        match self {
            Self::Smtp {
                mailer,
                from_address,
            } => {
                let message = Message::builder()
                    .from(
                        from_address
                            .parse()
                            .map_err(|_| EmailError::InvalidAddress(from_address.clone()))?,
                    )
                    .to(to
                        .parse()
                        .map_err(|_| EmailError::InvalidAddress(to.to_owned()))?)
                    .subject("Your password reset code")
                    .header(ContentType::TEXT_PLAIN)
                    .body(body)?;

                mailer.send(message).await?;
                tracing::info!(recipient = %to, "Sent password reset code");
            }
            Self::LogOnly => {
                tracing::info!(recipient = %to, code = %code, "Password reset code (log-only)");
            }
        }
        Ok(())
    }
}
