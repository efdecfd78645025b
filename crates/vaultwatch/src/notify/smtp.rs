//! SMTP delivery over implicit TLS.

use super::{DeliveryError, Notifier};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use std::fmt;
use tracing::info;

/// Mail server and envelope settings.
#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub sender: String,
    pub recipient: String,
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("sender", &self.sender)
            .field("recipient", &self.recipient)
            .finish()
    }
}

/// Sends plain-text mail through an SMTPS relay.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl SmtpNotifier {
    /// Validate addresses and prepare the transport. Does not connect.
    pub fn new(config: &SmtpConfig) -> Result<Self, DeliveryError> {
        let from = parse_mailbox(&config.sender)?;
        let to = parse_mailbox(&config.recipient)?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(|e| DeliveryError::Transport(format!("{}: {e}", config.host)))?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self { transport, from, to })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, subject: &str, body: &str) -> Result<(), DeliveryError> {
        info!("sending email: {subject}");
        let email = compose(&self.from, &self.to, subject, body)?;
        self.transport
            .send(email)
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;
        info!("email delivered to {}", self.to);
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, DeliveryError> {
    address
        .parse()
        .map_err(|e| DeliveryError::Message(format!("bad address {address:?}: {e}")))
}

fn compose(
    from: &Mailbox,
    to: &Mailbox,
    subject: &str,
    body: &str,
) -> Result<lettre::Message, DeliveryError> {
    lettre::Message::builder()
        .from(from.clone())
        .to(to.clone())
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(body.to_string())
        .map_err(|e| DeliveryError::Message(e.to_string()))
}
