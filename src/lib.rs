// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact Relay
//!
//! This crate accepts contact form submissions and makes sure they reach the
//! site owner even when an email provider is down:
//!
//! - Per-client fixed-window rate limiting (3 per hour default)
//! - Field validation with all violations reported together
//! - Ordered provider failover (Resend, then SMTP)
//! - Best-effort auto-reply to the submitter
//! - Pre-filled `mailto:` link when every provider fails

pub mod classifier;
pub mod clock;
pub mod composer;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod limiter;
pub mod metrics;
pub mod pipeline;
pub mod provider;
pub mod store;
pub mod validator;

pub use classifier::{ExternalResponse, ResponseClassifier};
pub use config::Config;
pub use dispatcher::{AutoReplyOutcome, DeliveryDispatcher, DeliveryOutcome, DeliveryReport};
pub use limiter::{RateLimitResult, RateLimiter};
pub use pipeline::ContactPipeline;
pub use validator::{RawSubmission, Submission, SubmissionValidator};
