// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! SMTP relay provider (Gmail app password by default).

use super::{Provider, Receipt};
use crate::composer::OutgoingMessage;
use crate::config::SmtpConfig;
use crate::error::ProviderError;
use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;

const NAME: &str = "smtp";

/// Sends through an authenticated SMTP relay over implicit TLS.
pub struct SmtpProvider {
    config: Option<SmtpConfig>,
}

impl SmtpProvider {
    pub fn new(config: Option<SmtpConfig>) -> Self {
        Self { config }
    }

    fn configured(&self) -> Result<&SmtpConfig, ProviderError> {
        self.config
            .as_ref()
            .filter(|c| !c.username.is_empty() && !c.password.is_empty())
            .ok_or_else(|| ProviderError::Unavailable {
                provider: NAME,
                reason: "SMTP credentials not configured".to_string(),
            })
    }

    fn transport(config: &SmtpConfig) -> Result<AsyncSmtpTransport<Tokio1Executor>, ProviderError> {
        let creds = Credentials::new(config.username.clone(), config.password.clone());

        Ok(AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(|e| ProviderError::Unavailable {
                provider: NAME,
                reason: format!("SMTP relay error: {e}"),
            })?
            .port(config.port)
            .credentials(creds)
            .build())
    }
}

/// Build the MIME message for `message` sent from `from`.
fn build_message(from: &str, message: &OutgoingMessage) -> Result<Message, ProviderError> {
    let from: Mailbox = from.parse().map_err(|e| ProviderError::Unavailable {
        provider: NAME,
        reason: format!("Invalid from address: {e}"),
    })?;
    let to: Mailbox = message.to.parse().map_err(|e| ProviderError::SendFailed {
        provider: NAME,
        reason: format!("Invalid to address: {e}"),
    })?;

    let mut builder = Message::builder()
        .from(from)
        .to(to)
        .subject(message.subject.clone())
        .header(ContentType::TEXT_PLAIN);

    if let Some(reply_to) = &message.reply_to {
        let reply_to: Mailbox = reply_to.parse().map_err(|e| ProviderError::SendFailed {
            provider: NAME,
            reason: format!("Invalid reply-to address: {e}"),
        })?;
        builder = builder.reply_to(reply_to);
    }

    builder
        .body(message.body.clone())
        .map_err(|e| ProviderError::SendFailed {
            provider: NAME,
            reason: format!("Failed to build email: {e}"),
        })
}

#[async_trait]
impl Provider for SmtpProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn send(&self, message: &OutgoingMessage) -> Result<Receipt, ProviderError> {
        let config = self.configured()?;
        let email = build_message(config.sender(), message)?;
        let transport = Self::transport(config)?;

        let response = transport
            .send(email)
            .await
            .map_err(|e| ProviderError::SendFailed {
                provider: NAME,
                reason: format!("SMTP send failed: {e}"),
            })?;

        let id = response.message().next().map(str::to_string);
        debug!(provider = NAME, code = %response.code(), "Message accepted");

        Ok(Receipt { provider: NAME, id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> OutgoingMessage {
        OutgoingMessage {
            to: "owner@site.dev".to_string(),
            reply_to: Some("jane@x.com".to_string()),
            subject: "New contact message from Jane".to_string(),
            body: "Name: Jane".to_string(),
        }
    }

    #[tokio::test]
    async fn test_missing_credentials_is_unavailable() {
        let provider = SmtpProvider::new(Some(SmtpConfig::new("me@gmail.com", "")));
        let err = provider.send(&message()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Unavailable { provider: "smtp", .. }));

        let provider = SmtpProvider::new(None);
        assert_eq!(provider.send(&message()).await.unwrap_err().kind(), "unavailable");
    }

    #[test]
    fn test_build_message_sets_reply_to() {
        let email = build_message("me@gmail.com", &message()).unwrap();
        let raw = String::from_utf8(email.formatted()).unwrap();

        assert!(raw.contains("Reply-To: jane@x.com"));
        assert!(raw.contains("To: owner@site.dev"));
        assert!(raw.contains("Subject: New contact message from Jane"));
    }

    #[test]
    fn test_build_message_rejects_bad_recipient() {
        let mut msg = message();
        msg.to = "not an address".to_string();

        let err = build_message("me@gmail.com", &msg).unwrap_err();
        assert_eq!(err.kind(), "send_failed");
    }
}
