//! Out-of-band delivery of issued passcodes.
//!
//! `LogNotifier` is the local dev default: it writes the message to the log instead of
//! sending it. `SmtpNotifier` delivers real mail through an SMTP relay with STARTTLS.

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use crate::identity::Identity;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("invalid address: {0}")]
    Address(String),
    #[error("failed to build message: {0}")]
    Message(String),
    #[error("transport error: {0}")]
    Transport(String),
}

/// The passcode notification handed to a [`Notifier`].
#[derive(Clone, PartialEq, Eq)]
pub struct OtpMessage {
    code: String,
    ttl_minutes: i64,
}

impl OtpMessage {
    #[must_use]
    pub fn new(code: String, ttl_minutes: i64) -> Self {
        Self { code, ttl_minutes }
    }

    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    #[must_use]
    pub fn subject(&self) -> &'static str {
        "Your OTP Code"
    }

    #[must_use]
    pub fn body(&self) -> String {
        format!(
            "Your OTP code is: {}. It expires in {} minutes.",
            self.code, self.ttl_minutes
        )
    }
}

impl std::fmt::Debug for OtpMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OtpMessage")
            .field("code", &"***")
            .field("ttl_minutes", &self.ttl_minutes)
            .finish()
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `message` to the identity's notification channel.
    async fn send(&self, to: &Identity, message: &OtpMessage) -> Result<(), DeliveryError>;
}

/// Local dev notifier that logs the message instead of sending real email.
#[derive(Clone, Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, to: &Identity, message: &OtpMessage) -> Result<(), DeliveryError> {
        info!(
            to_email = %to.email,
            subject = message.subject(),
            body = %message.body(),
            "otp notification send stub"
        );
        Ok(())
    }
}

/// Keeps every delivered message in memory.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    sent: Mutex<Vec<(Identity, OtpMessage)>>,
}

impl MemoryNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages delivered so far, oldest first.
    pub async fn sent(&self) -> Vec<(Identity, OtpMessage)> {
        self.sent.lock().await.clone()
    }

    /// Code of the most recent message sent to `email`.
    pub async fn last_code_for(&self, email: &str) -> Option<String> {
        self.sent
            .lock()
            .await
            .iter()
            .rev()
            .find(|(to, _)| to.email == email)
            .map(|(_, message)| message.code().to_string())
    }
}

#[async_trait]
impl Notifier for MemoryNotifier {
    async fn send(&self, to: &Identity, message: &OtpMessage) -> Result<(), DeliveryError> {
        self.sent.lock().await.push((to.clone(), message.clone()));
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub from: String,
    pub timeout: Duration,
}

/// Delivers passcodes by email through an SMTP relay.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpNotifier {
    /// Build the relay transport.
    ///
    /// # Errors
    /// Returns an error if the relay host or the sender address is invalid.
    pub fn new(config: &SmtpConfig) -> Result<Self, DeliveryError> {
        let from: Mailbox = config
            .from
            .parse()
            .map_err(|err| DeliveryError::Address(format!("{}: {err}", config.from)))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|err| DeliveryError::Transport(err.to_string()))?
            .port(config.port)
            .timeout(Some(config.timeout));

        if let Some(username) = &config.username {
            let password = config
                .password
                .as_ref()
                .map(|password| password.expose_secret().to_string())
                .unwrap_or_default();
            builder = builder.credentials(Credentials::new(username.clone(), password));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    #[instrument(skip(self, message), fields(to_email = %to.email))]
    async fn send(&self, to: &Identity, message: &OtpMessage) -> Result<(), DeliveryError> {
        let recipient: Mailbox = to
            .email
            .parse()
            .map_err(|err| DeliveryError::Address(format!("{}: {err}", to.email)))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(recipient)
            .subject(message.subject())
            .header(ContentType::TEXT_PLAIN)
            .body(message.body())
            .map_err(|err| DeliveryError::Message(err.to_string()))?;

        let response = self
            .transport
            .send(email)
            .await
            .map_err(|err| DeliveryError::Transport(err.to_string()))?;

        debug!(code = ?response.code(), "smtp relay accepted otp email");
        Ok(())
    }
}
