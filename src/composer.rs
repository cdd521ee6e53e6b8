// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Message composition.
//!
//! Presentation lives outside the relay; the shipped composer produces
//! plain-text bodies only.

use crate::validator::Submission;

/// A message ready to hand to a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub to: String,
    pub reply_to: Option<String>,
    pub subject: String,
    pub body: String,
}

/// Owner notification and sender confirmation for one submission.
#[derive(Debug, Clone)]
pub struct ComposedMessages {
    pub owner: OutgoingMessage,
    pub auto_reply: OutgoingMessage,
}

/// Builds the outgoing messages for a validated submission.
pub trait MessageComposer: Send + Sync {
    fn compose(&self, submission: &Submission, owner_address: &str) -> ComposedMessages;
}

/// Plain-text composer.
#[derive(Debug, Clone, Default)]
pub struct PlainTextComposer;

impl MessageComposer for PlainTextComposer {
    fn compose(&self, submission: &Submission, owner_address: &str) -> ComposedMessages {
        let owner = OutgoingMessage {
            to: owner_address.to_string(),
            reply_to: Some(submission.email().to_string()),
            subject: format!("New contact message from {}", submission.name()),
            body: submission_summary(submission),
        };

        let auto_reply = OutgoingMessage {
            to: submission.email().to_string(),
            reply_to: None,
            subject: format!("Thank you for contacting me, {}!", submission.name()),
            body: format!(
                "Hi {},\n\n\
                 Thank you for getting in touch. I have received your message and \
                 will get back to you as soon as possible, usually within 24-48 hours.\n\n\
                 Best regards",
                submission.name()
            ),
        };

        ComposedMessages { owner, auto_reply }
    }
}

/// Name, email and message laid out for a human reader.
pub fn submission_summary(submission: &Submission) -> String {
    format!(
        "Name: {}\nEmail: {}\n\nMessage:\n{}",
        submission.name(),
        submission.email(),
        submission.message()
    )
}
