use anyhow::Context;
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{info, instrument};

use crate::config::{AppConfig, SmtpConfig};

/// A rendered email, ready to hand to a [`Mailer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailData {
    pub subject: String,
    pub html_content: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, email: &EmailData) -> anyhow::Result<()>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(cfg: &SmtpConfig) -> anyhow::Result<Self> {
        let host = cfg.host.as_deref().context("SMTP_HOST is not set")?;
        let from_email = cfg
            .from_email
            .as_deref()
            .context("EMAILS_FROM_EMAIL is not set")?;
        let from = Mailbox::new(
            Some(cfg.from_name.clone()),
            from_email.parse::<Address>().context("invalid EMAILS_FROM_EMAIL")?,
        );

        let mut builder = if cfg.ssl {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)?
        } else if cfg.tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
        };
        builder = builder.port(cfg.port);
        if let (Some(user), Some(password)) = (&cfg.user, &cfg.password) {
            builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    #[instrument(skip(self, email), fields(subject = %email.subject))]
    async fn send(&self, to: &str, email: &EmailData) -> anyhow::Result<()> {
        let to: Mailbox = to.parse().context("invalid recipient address")?;
        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_HTML)
            .body(email.html_content.clone())
            .context("build email")?;
        self.transport.send(message).await.context("smtp send")?;
        info!("email sent");
        Ok(())
    }
}

/// Used when SMTP is not configured.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, email: &EmailData) -> anyhow::Result<()> {
        info!(%to, subject = %email.subject, "emails disabled; not sending");
        Ok(())
    }
}

pub fn reset_password_email(config: &AppConfig, email: &str, token: &str) -> EmailData {
    let project = &config.project_name;
    let link = format!("{}/reset-password?token={}", config.frontend_host, token);
    let hours = config.jwt.reset_ttl_hours;
    EmailData {
        subject: format!("{project} - Password recovery for user {email}"),
        html_content: format!(
            r#"<!DOCTYPE html>
<html>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
  <p>Hello {email},</p>
  <p>We've received a request to reset your password for {project}.</p>
  <p><a href="{link}">Reset password</a></p>
  <p>Or open this link in your browser: {link}</p>
  <p>The link expires in {hours} hours. If you didn't request a password recovery you can ignore this email.</p>
</body>
</html>"#
        ),
    }
}

pub fn new_account_email(config: &AppConfig, username: &str, password: &str) -> EmailData {
    let project = &config.project_name;
    let link = &config.frontend_host;
    EmailData {
        subject: format!("{project} - New account for user {username}"),
        html_content: format!(
            r#"<!DOCTYPE html>
<html>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
  <p>Welcome to {project}!</p>
  <p>Your username: {username}</p>
  <p>Your password: {password}</p>
  <p><a href="{link}">Go to dashboard</a></p>
</body>
</html>"#
        ),
    }
}

pub fn test_email(config: &AppConfig, email_to: &str) -> EmailData {
    let project = &config.project_name;
    EmailData {
        subject: format!("{project} - Test email"),
        html_content: format!(
            "<!DOCTYPE html><html><body><p>Test email for: {email_to}</p></body></html>"
        ),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Records every message instead of sending it.
    #[derive(Default)]
    pub struct CapturingMailer {
        pub sent: Mutex<Vec<(String, EmailData)>>,
    }

    #[async_trait]
    impl Mailer for CapturingMailer {
        async fn send(&self, to: &str, email: &EmailData) -> anyhow::Result<()> {
            self.sent
                .lock()
                .expect("mailer lock")
                .push((to.to_string(), email.clone()));
            Ok(())
        }
    }
}
