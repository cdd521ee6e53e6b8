// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Mapping of pipeline results to the externally visible responses.
//!
//! Internal error detail never leaves this module; unexpected failures
//! become a fixed generic body.

use crate::clock::Clock;
use crate::dispatcher::{AutoReplyOutcome, DeliveryReport};
use crate::error::ContactError;
use crate::validator::FieldErrors;
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::error;

/// The closed set of results a submitter can see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExternalResponse {
    Accepted {
        method: &'static str,
        auto_reply_sent: bool,
        timestamp: DateTime<Utc>,
    },
    RateLimited {
        retry_after_secs: u64,
    },
    Invalid {
        field_errors: FieldErrors,
    },
    Degraded {
        fallback_uri: String,
    },
    InternalError,
}

impl ExternalResponse {
    /// Label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Accepted { .. } => "accepted",
            Self::RateLimited { .. } => "rate_limited",
            Self::Invalid { .. } => "invalid",
            Self::Degraded { .. } => "degraded",
            Self::InternalError => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Accepted { .. } => StatusCode::OK,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Invalid { .. } => StatusCode::BAD_REQUEST,
            Self::Degraded { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// JSON body for this response.
    pub fn body(&self) -> serde_json::Value {
        match self {
            Self::Accepted {
                method,
                auto_reply_sent,
                timestamp,
            } => json!({
                "success": true,
                "message": "Message sent successfully!",
                "method": method,
                "autoReply": auto_reply_sent,
                "timestamp": timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            }),
            Self::RateLimited { retry_after_secs } => json!({
                "error": "Too many requests. Please try again later.",
                "retryAfter": retry_after_secs,
            }),
            Self::Invalid { field_errors } => json!({
                "error": "Validation failed",
                "details": field_errors,
            }),
            Self::Degraded { fallback_uri } => json!({
                "error": "Email service temporarily unavailable. Please try again later.",
                "fallback": fallback_uri,
            }),
            Self::InternalError => json!({
                "error": "Internal server error",
                "message": "Something went wrong. Please try again later.",
            }),
        }
    }
}

impl IntoResponse for ExternalResponse {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(self.body());

        match self {
            Self::RateLimited { retry_after_secs } => (
                status,
                [(header::RETRY_AFTER, retry_after_secs.to_string())],
                body,
            )
                .into_response(),
            _ => (status, body).into_response(),
        }
    }
}

/// Maps pipeline results to external responses.
pub struct ResponseClassifier {
    clock: Arc<dyn Clock>,
}

impl ResponseClassifier {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Classify the result of one submission.
    ///
    /// The pipeline stops at the first failing stage, so the error variant
    /// already reflects the priority order: rate limit, then validation, then
    /// delivery.
    pub fn classify(&self, result: &Result<DeliveryReport, ContactError>) -> ExternalResponse {
        match result {
            Err(ContactError::RateLimitExceeded { retry_after }) => ExternalResponse::RateLimited {
                retry_after_secs: ceil_secs(*retry_after),
            },
            Err(ContactError::ValidationFailed(errors)) => ExternalResponse::Invalid {
                field_errors: errors.clone(),
            },
            Ok(report) => self.classify_delivery(report),
            Err(e) => {
                error!(error = %e, "Unexpected error handling submission");
                ExternalResponse::InternalError
            }
        }
    }

    fn classify_delivery(&self, report: &DeliveryReport) -> ExternalResponse {
        match (report.outcome.method(), &report.fallback_uri) {
            (Some(method), _) => ExternalResponse::Accepted {
                method,
                auto_reply_sent: report.auto_reply == AutoReplyOutcome::Sent,
                timestamp: self.clock.now(),
            },
            (None, Some(uri)) => ExternalResponse::Degraded {
                fallback_uri: uri.clone(),
            },
            (None, None) => {
                error!(outcome = ?report.outcome, "Failed delivery without a fallback link");
                ExternalResponse::InternalError
            }
        }
    }
}

/// Whole seconds, rounded up so clients never retry early.
fn ceil_secs(duration: Duration) -> u64 {
    let secs = duration.as_secs();
    if duration.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}
