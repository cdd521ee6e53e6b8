// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Delivery with provider failover.
//!
//! Providers are tried strictly in order until one accepts the owner
//! notification. The provider that delivered also sends the auto-reply, on a
//! best-effort basis. When every provider fails the submitter gets a
//! pre-filled `mailto:` link instead, so the owner stays reachable.

use crate::composer::{submission_summary, MessageComposer, OutgoingMessage};
use crate::config::DeliveryConfig;
use crate::error::ProviderError;
use crate::provider::{Provider, Receipt};
use crate::validator::Submission;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Terminal result of the failover sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeliveryOutcome {
    /// First provider in the chain delivered
    PrimarySuccess,
    /// A later provider delivered after earlier ones failed
    FallbackSuccess,
    /// No provider delivered
    BothFailed,
}

impl DeliveryOutcome {
    /// Externally visible delivery method, if delivered.
    pub fn method(&self) -> Option<&'static str> {
        match self {
            Self::PrimarySuccess => Some("primary"),
            Self::FallbackSuccess => Some("fallback"),
            Self::BothFailed => None,
        }
    }

    pub fn is_delivered(&self) -> bool {
        !matches!(self, Self::BothFailed)
    }
}

/// Result of the best-effort confirmation to the submitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AutoReplyOutcome {
    Sent,
    Skipped,
    Failed,
}

impl AutoReplyOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }
}

/// One owner-notification attempt against one provider.
#[derive(Debug, Clone)]
pub struct ProviderAttempt {
    pub provider: &'static str,
    pub result: Result<Receipt, ProviderError>,
}

/// Everything the dispatcher learned while delivering one submission.
#[derive(Debug, Clone)]
pub struct DeliveryReport {
    pub outcome: DeliveryOutcome,
    pub auto_reply: AutoReplyOutcome,
    /// Provider that delivered the owner notification
    pub provider: Option<&'static str>,
    /// Pre-filled compose link, only when every provider failed
    pub fallback_uri: Option<String>,
    pub attempts: Vec<ProviderAttempt>,
}

/// Orchestrates the provider chain for a submission.
pub struct DeliveryDispatcher {
    providers: Vec<Arc<dyn Provider>>,
    composer: Arc<dyn MessageComposer>,
    config: DeliveryConfig,
}

impl DeliveryDispatcher {
    /// Providers are tried in the given order; the first is the primary.
    pub fn new(
        providers: Vec<Arc<dyn Provider>>,
        composer: Arc<dyn MessageComposer>,
        config: DeliveryConfig,
    ) -> Self {
        Self {
            providers,
            composer,
            config,
        }
    }

    /// Deliver a validated submission. Never fails; provider errors end up in
    /// the report.
    pub async fn deliver(&self, submission: &Submission) -> DeliveryReport {
        let messages = self.composer.compose(submission, &self.config.owner_address);
        let timeout = self.config.provider_timeout();
        let mut attempts = Vec::with_capacity(self.providers.len());

        for (index, provider) in self.providers.iter().enumerate() {
            let result = send_bounded(provider.as_ref(), &messages.owner, timeout).await;
            let delivered = result.is_ok();

            match &result {
                Ok(receipt) => info!(
                    provider = provider.name(),
                    id = ?receipt.id,
                    "Owner notification delivered"
                ),
                Err(e) => warn!(
                    provider = provider.name(),
                    kind = e.kind(),
                    error = %e,
                    "Owner notification failed, advancing chain"
                ),
            }
            attempts.push(ProviderAttempt {
                provider: provider.name(),
                result,
            });

            if delivered {
                let outcome = if index == 0 {
                    DeliveryOutcome::PrimarySuccess
                } else {
                    DeliveryOutcome::FallbackSuccess
                };
                let auto_reply = self
                    .send_auto_reply(provider.as_ref(), &messages.auto_reply, timeout)
                    .await;

                return DeliveryReport {
                    outcome,
                    auto_reply,
                    provider: Some(provider.name()),
                    fallback_uri: None,
                    attempts,
                };
            }
        }

        let fallback_uri = fallback_uri(&self.config.owner_address, &messages.owner.subject, submission);
        error!(
            attempts = attempts.len(),
            "All providers failed, offering compose link"
        );

        DeliveryReport {
            outcome: DeliveryOutcome::BothFailed,
            auto_reply: AutoReplyOutcome::Skipped,
            provider: None,
            fallback_uri: Some(fallback_uri),
            attempts,
        }
    }

    async fn send_auto_reply(
        &self,
        provider: &dyn Provider,
        message: &OutgoingMessage,
        timeout: Duration,
    ) -> AutoReplyOutcome {
        if !self.config.auto_reply_enabled {
            return AutoReplyOutcome::Skipped;
        }

        match send_bounded(provider, message, timeout).await {
            Ok(_) => {
                info!(provider = provider.name(), "Auto-reply sent");
                AutoReplyOutcome::Sent
            }
            Err(e) => {
                warn!(provider = provider.name(), kind = e.kind(), error = %e, "Auto-reply failed");
                AutoReplyOutcome::Failed
            }
        }
    }
}

/// Send with an upper bound on the call; expiry is an ordinary failure.
async fn send_bounded(
    provider: &dyn Provider,
    message: &OutgoingMessage,
    timeout: Duration,
) -> Result<Receipt, ProviderError> {
    match tokio::time::timeout(timeout, provider.send(message)).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout {
            provider: provider.name(),
            elapsed: timeout,
        }),
    }
}

/// `mailto:` link to the owner with subject and body pre-filled.
pub fn fallback_uri(owner_address: &str, subject: &str, submission: &Submission) -> String {
    format!(
        "mailto:{}?subject={}&body={}",
        owner_address,
        urlencoding::encode(subject),
        urlencoding::encode(&submission_summary(submission))
    )
}
