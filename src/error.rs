// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Error types for the contact relay.

use crate::validator::FieldErrors;
use std::time::Duration;
use thiserror::Error;

/// Failure of a single provider call. Always recovered by the dispatcher.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Provider has no usable configuration (missing or invalid credentials)
    #[error("Provider {provider} unavailable: {reason}")]
    Unavailable {
        provider: &'static str,
        reason: String,
    },

    /// Provider was contacted but the send failed
    #[error("Provider {provider} send failed: {reason}")]
    SendFailed {
        provider: &'static str,
        reason: String,
    },

    /// Provider did not answer within the configured bound
    #[error("Provider {provider} timed out after {elapsed:?}")]
    Timeout {
        provider: &'static str,
        elapsed: Duration,
    },
}

impl ProviderError {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unavailable { .. } => "unavailable",
            Self::SendFailed { .. } => "send_failed",
            Self::Timeout { .. } => "timeout",
        }
    }
}

/// Rate store backend failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Rate store backend error: {0}")]
    Backend(String),

    #[error("Corrupt rate window for {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

/// Errors that end a submission before delivery.
#[derive(Debug, Error)]
pub enum ContactError {
    #[error("Rate limit exceeded, retry after {retry_after:?}")]
    RateLimitExceeded { retry_after: Duration },

    #[error("Validation failed for {} field(s)", .0.len())]
    ValidationFailed(FieldErrors),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Malformed request body: {0}")]
    MalformedBody(#[from] serde_json::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ContactError>;
