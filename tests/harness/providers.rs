// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Scripted providers that record what they were asked to send.

use async_trait::async_trait;
use contact_relay::composer::OutgoingMessage;
use contact_relay::error::ProviderError;
use contact_relay::provider::{Provider, Receipt};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// What a scripted provider does on one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Deliver,
    Fail,
    Unavailable,
}

/// Provider that follows a script, then repeats a default step.
pub struct ScriptedProvider {
    name: &'static str,
    script: Mutex<VecDeque<Step>>,
    default: Step,
    sent: Mutex<Vec<OutgoingMessage>>,
}

impl ScriptedProvider {
    /// Always behaves the same way.
    pub fn always(name: &'static str, step: Step) -> Arc<Self> {
        Self::scripted(name, &[], step)
    }

    /// Runs `script` call by call, then falls back to `then`.
    pub fn scripted(name: &'static str, script: &[Step], then: Step) -> Arc<Self> {
        Arc::new(Self {
            name,
            script: Mutex::new(script.iter().copied().collect()),
            default: then,
            sent: Mutex::new(Vec::new()),
        })
    }

    /// Every message this provider was asked to send, in order.
    pub fn sent(&self) -> Vec<OutgoingMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn send(&self, message: &OutgoingMessage) -> Result<Receipt, ProviderError> {
        self.sent.lock().unwrap().push(message.clone());
        let step = self.script.lock().unwrap().pop_front().unwrap_or(self.default);

        match step {
            Step::Deliver => Ok(Receipt {
                provider: self.name,
                id: Some(format!("{}-{}", self.name, self.calls())),
            }),
            Step::Fail => Err(ProviderError::SendFailed {
                provider: self.name,
                reason: "550 mailbox unavailable (secret-token-xyz)".to_string(),
            }),
            Step::Unavailable => Err(ProviderError::Unavailable {
                provider: self.name,
                reason: "credentials missing".to_string(),
            }),
        }
    }
}
