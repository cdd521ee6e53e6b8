// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Pipeline builders and request bodies.

use super::providers::ScriptedProvider;
use contact_relay::{
    classifier::ResponseClassifier,
    clock::ManualClock,
    composer::PlainTextComposer,
    config::{DeliveryConfig, RateLimitConfig, ValidationConfig},
    dispatcher::DeliveryDispatcher,
    limiter::RateLimiter,
    pipeline::ContactPipeline,
    provider::Provider,
    store::MemoryRateStore,
    validator::SubmissionValidator,
};
use serde_json::json;
use std::sync::Arc;

pub const OWNER: &str = "owner@site.dev";

/// A pipeline wired to scripted providers and a manual clock.
pub struct TestPipeline {
    pub pipeline: ContactPipeline,
    pub clock: ManualClock,
    pub store: MemoryRateStore,
}

pub fn pipeline(
    primary: Arc<ScriptedProvider>,
    fallback: Arc<ScriptedProvider>,
    max_requests: u32,
) -> TestPipeline {
    let clock = ManualClock::default();
    let store = MemoryRateStore::new();

    let limiter = RateLimiter::new(
        RateLimitConfig {
            max_requests,
            window_secs: 3600,
            ..Default::default()
        },
        Arc::new(store.clone()),
        Arc::new(clock.clone()),
    );
    let providers: Vec<Arc<dyn Provider>> = vec![primary as Arc<dyn Provider>, fallback];
    let dispatcher = DeliveryDispatcher::new(
        providers,
        Arc::new(PlainTextComposer),
        DeliveryConfig {
            owner_address: OWNER.to_string(),
            provider_timeout_ms: 500,
            auto_reply_enabled: true,
        },
    );

    let pipeline = ContactPipeline::new(
        limiter,
        SubmissionValidator::new(ValidationConfig::default()),
        dispatcher,
        ResponseClassifier::new(Arc::new(clock.clone())),
    );

    TestPipeline {
        pipeline,
        clock,
        store,
    }
}

pub fn body(name: &str, email: &str, message: &str) -> Vec<u8> {
    json!({ "name": name, "email": email, "message": message })
        .to_string()
        .into_bytes()
}

/// The canonical valid submission.
pub fn jane() -> Vec<u8> {
    body(
        "Jane Doe",
        "jane@x.com",
        "Hello, I would like to discuss a project.",
    )
}
