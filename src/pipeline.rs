// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! The submission pipeline: rate limit, validate, deliver, classify.
//!
//! Rejections happen before any provider is contacted, cheapest first.

use crate::classifier::{ExternalResponse, ResponseClassifier};
use crate::dispatcher::{DeliveryDispatcher, DeliveryReport};
use crate::error::{ContactError, Result};
use crate::limiter::{RateLimitResult, RateLimiter};
use crate::metrics::ContactMetrics;
use crate::validator::{RawSubmission, SubmissionValidator};
use tracing::{debug, info};

/// One pipeline shared by every intake route.
pub struct ContactPipeline {
    limiter: RateLimiter,
    validator: SubmissionValidator,
    dispatcher: DeliveryDispatcher,
    classifier: ResponseClassifier,
    metrics: Option<ContactMetrics>,
}

impl ContactPipeline {
    pub fn new(
        limiter: RateLimiter,
        validator: SubmissionValidator,
        dispatcher: DeliveryDispatcher,
        classifier: ResponseClassifier,
    ) -> Self {
        Self {
            limiter,
            validator,
            dispatcher,
            classifier,
            metrics: None,
        }
    }

    /// Record submission and provider counters.
    pub fn with_metrics(mut self, metrics: ContactMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Handle one submission from `client` with the raw request body.
    pub async fn submit(&self, client: &str, body: &[u8]) -> ExternalResponse {
        let result = self.run(client, body).await;

        if let (Some(metrics), Ok(report)) = (&self.metrics, &result) {
            metrics.record_delivery(report);
        }

        let response = self.classifier.classify(&result);
        if let Some(metrics) = &self.metrics {
            metrics.record_submission(response.label());
        }

        info!(%client, result = response.label(), "Submission handled");
        response
    }

    async fn run(&self, client: &str, body: &[u8]) -> Result<DeliveryReport> {
        match self.limiter.check(client).await? {
            RateLimitResult::Limited { retry_after } => {
                return Err(ContactError::RateLimitExceeded { retry_after });
            }
            RateLimitResult::Allowed { remaining, .. } => {
                debug!(%client, remaining, "Submission admitted");
            }
        }

        let raw: RawSubmission = serde_json::from_slice(body)?;
        let submission = self
            .validator
            .validate(&raw)
            .map_err(ContactError::ValidationFailed)?;

        Ok(self.dispatcher.deliver(&submission).await)
    }
}
