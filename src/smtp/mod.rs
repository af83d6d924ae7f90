use anyhow::Result;
use async_trait::async_trait;
use lettre::message::header::{ContentType, MessageId};
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::{Credentials, Mechanism};
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::transport::smtp::PoolConfig;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;

use crate::models::brand::Brand;

/// Per-brand SMTP settings resolved once per send run.
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub from_address: String,
    pub delay_ms: u64,
}

impl SmtpSettings {
    /// Resolve and decode a brand's SMTP settings. Missing fields are
    /// fatal for the whole run, not per contact.
    pub fn resolve(brand: &Brand) -> Result<Self> {
        if brand.smtp_host.trim().is_empty()
            || brand.smtp_user.trim().is_empty()
            || brand.smtp_password_enc.trim().is_empty()
            || brand.from_email.trim().is_empty()
        {
            anyhow::bail!("brand {} has incomplete SMTP settings", brand.id);
        }
        let password = brand.smtp_password()?;
        Ok(SmtpSettings {
            host: brand.smtp_host.clone(),
            port: brand.smtp_port as u16,
            user: brand.smtp_user.clone(),
            password,
            from_address: brand.from_email.clone(),
            delay_ms: brand.email_delay_ms.max(0) as u64,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Envelope {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub html: String,
}

/// The only thing the send loop needs from a mail provider.
#[async_trait]
pub trait EmailTransport: Send + Sync {
    /// Deliver one message; returns the message id on success.
    async fn send(&self, envelope: &Envelope) -> Result<String>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn connect(settings: &SmtpSettings) -> Result<Self> {
        // Trim whitespace that may sneak in from copied app passwords
        let clean_password: String = settings
            .password
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        let creds = Credentials::new(settings.user.clone(), clean_password);

        let tls_params = TlsParameters::new(settings.host.clone())?;
        let tls = if settings.port == 465 {
            Tls::Wrapper(tls_params)
        } else {
            Tls::Required(tls_params)
        };

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)?
            .port(settings.port)
            .credentials(creds)
            .authentication(vec![Mechanism::Plain, Mechanism::Login])
            .tls(tls)
            .timeout(Some(Duration::from_secs(20)))
            .pool_config(PoolConfig::new().max_size(1))
            .build();

        Ok(SmtpMailer { transport })
    }
}

/// Build an HTML message with explicit Message-Id. Returns (message, message_id)
pub fn build_campaign_email(envelope: &Envelope) -> Result<(Message, String)> {
    let from_mb: Mailbox = envelope.from.parse()?;
    let to_mb: Mailbox = envelope.to.parse()?;
    let domain = envelope.from.split('@').nth(1).unwrap_or("sendora.local");
    let message_id = format!("{}@{}", uuid::Uuid::new_v4(), domain);

    let message = Message::builder()
        .from(from_mb)
        .to(to_mb)
        .subject(envelope.subject.as_str())
        .header(MessageId::from(message_id.clone()))
        .header(ContentType::TEXT_HTML)
        .body(envelope.html.clone())?;

    Ok((message, message_id))
}

#[async_trait]
impl EmailTransport for SmtpMailer {
    async fn send(&self, envelope: &Envelope) -> Result<String> {
        let (message, message_id) = build_campaign_email(envelope)?;
        self.transport.send(message).await?;
        Ok(message_id)
    }
}
