// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Resend HTTP API provider.

use super::{Provider, Receipt};
use crate::composer::OutgoingMessage;
use crate::config::ResendConfig;
use crate::error::ProviderError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

const NAME: &str = "resend";

/// Request body for `POST /emails`.
#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct SendEmailResponse {
    #[serde(default)]
    id: Option<String>,
}

/// Sends through the Resend API. Unavailable when no API key is configured.
pub struct ResendProvider {
    config: Option<ResendConfig>,
    client: Client,
}

impl ResendProvider {
    pub fn new(config: Option<ResendConfig>) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    fn configured(&self) -> Result<(&ResendConfig, Url), ProviderError> {
        let config = self
            .config
            .as_ref()
            .filter(|c| !c.api_key.trim().is_empty())
            .ok_or_else(|| ProviderError::Unavailable {
                provider: NAME,
                reason: "API key not configured".to_string(),
            })?;

        let url = Url::parse(&config.api_url).map_err(|e| ProviderError::Unavailable {
            provider: NAME,
            reason: format!("invalid API URL: {e}"),
        })?;

        Ok((config, url))
    }
}

#[async_trait]
impl Provider for ResendProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn send(&self, message: &OutgoingMessage) -> Result<Receipt, ProviderError> {
        let (config, url) = self.configured()?;

        let request = SendEmailRequest {
            from: &config.from,
            to: [message.to.as_str()],
            subject: &message.subject,
            text: &message.body,
            reply_to: message.reply_to.as_deref(),
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::SendFailed {
                provider: NAME,
                reason: format!("request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ProviderError::SendFailed {
                provider: NAME,
                reason: format!("API error ({status}): {body}"),
            });
        }

        // A 2xx without a parseable body still means the message was accepted
        let id = response
            .json::<SendEmailResponse>()
            .await
            .ok()
            .and_then(|r| r.id);
        debug!(provider = NAME, id = ?id, "Message accepted");

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
    async fn test_missing_api_key_is_unavailable() {
        let provider = ResendProvider::new(None);
        let err = provider.send(&message()).await.unwrap_err();
        assert_eq!(err.kind(), "unavailable");
    }

    #[tokio::test]
    async fn test_blank_api_key_is_unavailable() {
        let provider = ResendProvider::new(Some(ResendConfig::new("   ")));
        let err = provider.send(&message()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Unavailable { provider: "resend", .. }));
    }

    #[tokio::test]
    async fn test_invalid_api_url_is_unavailable() {
        let mut config = ResendConfig::new("re_test");
        config.api_url = "not a url".to_string();
        let provider = ResendProvider::new(Some(config));

        let err = provider.send(&message()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Unavailable { .. }));
    }

    #[test]
    fn test_request_body_shape() {
        let msg = message();
        let request = SendEmailRequest {
            from: "onboarding@resend.dev",
            to: [msg.to.as_str()],
            subject: &msg.subject,
            text: &msg.body,
            reply_to: msg.reply_to.as_deref(),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["to"][0], "owner@site.dev");
        assert_eq!(json["reply_to"], "jane@x.com");
        assert_eq!(json["from"], "onboarding@resend.dev");
    }
}
