// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Email providers.
//!
//! A provider turns an [`OutgoingMessage`] into a delivered email or a
//! [`ProviderError`]. Providers never panic on missing configuration; they
//! report themselves unavailable and let the dispatcher move on.

pub mod resend;
pub mod smtp;

use crate::composer::OutgoingMessage;
use crate::error::ProviderError;
use async_trait::async_trait;

pub use resend::ResendProvider;
pub use smtp::SmtpProvider;

/// Acknowledgement of an accepted message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub provider: &'static str,
    /// Provider-assigned message id, when one is returned
    pub id: Option<String>,
}

/// A transactional email sending capability.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Stable name used in logs and metrics.
    fn name(&self) -> &'static str;

    async fn send(&self, message: &OutgoingMessage) -> Result<Receipt, ProviderError>;
}
