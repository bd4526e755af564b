//! Outgoing mail for the account flows
//!
//! Messages go out over SMTP when `SMTP_HOST` is set. Without it the
//! service only logs what it would have sent.

use anyhow::Result;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType,
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{debug, info};

/// SMTP settings
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    /// Relays that accept unauthenticated mail leave this unset
    pub smtp_username: Option<String>,
    pub smtp_password: SecretString,
    /// Address used in the From header
    pub from_address: String,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .finish()
    }
}

impl EmailConfig {
    /// Read SMTP settings from the environment; `None` when mail is not set up
    ///
    /// # Environment Variables
    /// - `SMTP_HOST`: SMTP relay host, mail is only logged when unset
    /// - `SMTP_PORT`: SMTP port (default: 587)
    /// - `SMTP_USERNAME`: SMTP user, optional
    /// - `SMTP_PASSWORD`: SMTP password, required with `SMTP_USERNAME`
    /// - `SMTP_FROM`: sender address
    pub fn from_env() -> Result<Option<Self>> {
        let Ok(smtp_host) = std::env::var("SMTP_HOST") else {
            return Ok(None);
        };

        let smtp_port = match std::env::var("SMTP_PORT") {
            Ok(port) => port
                .parse::<u16>()
                .map_err(|e| anyhow::anyhow!("Invalid SMTP_PORT: {}", e))?,
            Err(_) => 587,
        };

        let smtp_username = std::env::var("SMTP_USERNAME").ok();
        let smtp_password = match smtp_username {
            Some(_) => std::env::var("SMTP_PASSWORD")
                .map_err(|_| anyhow::anyhow!("SMTP_PASSWORD environment variable not set"))?,
            None => String::new(),
        };

        let from_address = std::env::var("SMTP_FROM")
            .map_err(|_| anyhow::anyhow!("SMTP_FROM environment variable not set"))?;

        Ok(Some(EmailConfig {
            smtp_host,
            smtp_port,
            smtp_username,
            smtp_password: SecretString::from(smtp_password),
            from_address,
        }))
    }
}

/// Errors raised while sending mail
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
}

#[derive(Clone)]
enum Transport {
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
    Log,
}

/// Transactional email sender
#[derive(Clone)]
pub struct EmailService {
    transport: Transport,
    from_address: String,
}

impl EmailService {
    /// Build an SMTP backed service; no connection is opened until a send
    pub fn new(config: &EmailConfig) -> Result<Self, EmailError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port);

        if let Some(username) = &config.smtp_username {
            builder = builder.credentials(Credentials::new(
                username.clone(),
                config.smtp_password.expose_secret().to_string(),
            ));
        }

        Ok(Self {
            transport: Transport::Smtp(builder.build()),
            from_address: config.from_address.clone(),
        })
    }

    /// A service that logs messages instead of delivering them
    pub fn logging() -> Self {
        Self {
            transport: Transport::Log,
            from_address: "noreply@localhost".to_string(),
        }
    }

    /// SMTP when configured, logging otherwise
    pub fn from_config(config: Option<&EmailConfig>) -> Result<Self, EmailError> {
        match config {
            Some(config) => Self::new(config),
            None => Ok(Self::logging()),
        }
    }

    pub fn is_configured(&self) -> bool {
        matches!(self.transport, Transport::Smtp(_))
    }

    /// Message carrying a password reset link
    pub fn password_reset_message(
        &self,
        to: &str,
        username: &str,
        link: &str,
    ) -> Result<Message, EmailError> {
        let body = format!(
            "Hello {username},\n\n\
             We received a request to reset your password.\n\
             Open the link below to choose a new one:\n\n\
             {link}\n\n\
             If you did not ask for this, you can ignore this email.\n"
        );

        let message = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject("Reset your password")
            .header(ContentType::TEXT_PLAIN)
            .body(body)?;

        Ok(message)
    }

    /// Send the password reset link to `to`
    pub async fn send_password_reset(
        &self,
        to: &str,
        username: &str,
        link: &str,
    ) -> Result<(), EmailError> {
        let message = self.password_reset_message(to, username, link)?;

        match &self.transport {
            Transport::Smtp(mailer) => {
                mailer.send(message).await?;
                info!(to = %to, "Password reset email sent");
            }
            Transport::Log => {
                info!(to = %to, "SMTP is not configured, password reset email not sent");
                debug!("{}", String::from_utf8_lossy(&message.formatted()));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const SMTP_VARS: [&str; 5] = [
        "SMTP_HOST",
        "SMTP_PORT",
        "SMTP_USERNAME",
        "SMTP_PASSWORD",
        "SMTP_FROM",
    ];

    fn clear_env() {
        for var in SMTP_VARS {
            unsafe {
                std::env::remove_var(var);
            }
        }
    }

    fn test_config() -> EmailConfig {
        EmailConfig {
            smtp_host: "smtp.example.com".to_string(),
            smtp_port: 587,
            smtp_username: Some("mailer".to_string()),
            smtp_password: SecretString::from("hunter2".to_string()),
            from_address: "Atelier <noreply@example.com>".to_string(),
        }
    }

    #[test]
    #[serial]
    fn test_from_env_without_host() {
        clear_env();
        assert!(EmailConfig::from_env().unwrap().is_none());
    }

    #[test]
    #[serial]
    fn test_from_env_reads_smtp_settings() {
        clear_env();
        unsafe {
            std::env::set_var("SMTP_HOST", "smtp.example.com");
            std::env::set_var("SMTP_USERNAME", "mailer");
            std::env::set_var("SMTP_PASSWORD", "hunter2");
            std::env::set_var("SMTP_FROM", "noreply@example.com");
        }

        let config = EmailConfig::from_env().unwrap().unwrap();
        assert_eq!(config.smtp_host, "smtp.example.com");
        assert_eq!(config.smtp_port, 587);
        assert_eq!(config.smtp_username.as_deref(), Some("mailer"));
        assert_eq!(config.smtp_password.expose_secret(), "hunter2");
        assert!(!format!("{:?}", config).contains("hunter2"));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_bad_port_and_missing_sender() {
        clear_env();
        unsafe {
            std::env::set_var("SMTP_HOST", "smtp.example.com");
            std::env::set_var("SMTP_PORT", "not-a-port");
            std::env::set_var("SMTP_FROM", "noreply@example.com");
        }
        assert!(EmailConfig::from_env().is_err());

        unsafe {
            std::env::set_var("SMTP_PORT", "2525");
            std::env::remove_var("SMTP_FROM");
        }
        assert!(EmailConfig::from_env().is_err());

        clear_env();
    }

    #[tokio::test]
    async fn test_from_config_picks_transport() {
        let smtp = EmailService::from_config(Some(&test_config())).unwrap();
        assert!(smtp.is_configured());

        let logging = EmailService::from_config(None).unwrap();
        assert!(!logging.is_configured());
    }

    #[tokio::test]
    async fn test_password_reset_message_carries_link() {
        let service = EmailService::new(&test_config()).unwrap();
        let link = "https://atelier.example.com/client/reset-password/abc123";

        let message = service
            .password_reset_message("jane@example.com", "jane", link)
            .unwrap();
        let formatted = String::from_utf8_lossy(&message.formatted()).to_string();

        assert!(formatted.contains("To: jane@example.com"));
        assert!(formatted.contains("Subject: Reset your password"));
        assert!(formatted.contains("Hello jane,"));
        assert!(formatted.contains(link));
    }

    #[tokio::test]
    async fn test_logging_transport_accepts_mail() {
        let service = EmailService::logging();
        service
            .send_password_reset("jane@example.com", "jane", "http://localhost/reset/abc")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_invalid_recipient_is_rejected() {
        let service = EmailService::logging();
        let result = service
            .send_password_reset("not an address", "jane", "http://localhost/reset/abc")
            .await;
        assert!(matches!(result, Err(EmailError::InvalidAddress(_))));
    }
}
