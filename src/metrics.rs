// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prometheus metrics for submissions and provider health.

use crate::dispatcher::DeliveryReport;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

/// Counters exported at the metrics endpoint.
#[derive(Clone)]
pub struct ContactMetrics {
    registry: Registry,
    submissions: IntCounterVec,
    provider_attempts: IntCounterVec,
    auto_replies: IntCounterVec,
}

impl ContactMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let submissions = IntCounterVec::new(
            Opts::new("contact_submissions_total", "Contact submissions by result"),
            &["result"],
        )?;
        let provider_attempts = IntCounterVec::new(
            Opts::new(
                "contact_provider_attempts_total",
                "Owner notification attempts by provider and status",
            ),
            &["provider", "status"],
        )?;
        let auto_replies = IntCounterVec::new(
            Opts::new("contact_auto_replies_total", "Auto-replies by outcome"),
            &["outcome"],
        )?;

        registry.register(Box::new(submissions.clone()))?;
        registry.register(Box::new(provider_attempts.clone()))?;
        registry.register(Box::new(auto_replies.clone()))?;

        Ok(Self {
            registry,
            submissions,
            provider_attempts,
            auto_replies,
        })
    }

    /// Count a finished submission by its external result label.
    pub fn record_submission(&self, result: &str) {
        self.submissions.with_label_values(&[result]).inc();
    }

    /// Count every provider attempt and the auto-reply of one delivery.
    pub fn record_delivery(&self, report: &DeliveryReport) {
        for attempt in &report.attempts {
            let status = match &attempt.result {
                Ok(_) => "success",
                Err(e) => e.kind(),
            };
            self.provider_attempts
                .with_label_values(&[attempt.provider, status])
                .inc();
        }
        self.auto_replies
            .with_label_values(&[report.auto_reply.as_str()])
            .inc();
    }

    /// Render in the Prometheus text exposition format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
