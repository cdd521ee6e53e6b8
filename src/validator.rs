// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact submission validator.
//!
//! Every field is checked independently and all violations are reported
//! together, keyed by field name.

use crate::config::ValidationConfig;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::OnceLock;
use tracing::debug;

/// Field name to human-readable message.
pub type FieldErrors = BTreeMap<String, String>;

/// Submission as received, before any checks.
///
/// Fields are kept as raw JSON so that a missing field and a field of the
/// wrong type can be reported separately.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSubmission {
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(default)]
    pub email: Option<Value>,
    #[serde(default)]
    pub message: Option<Value>,
}

impl RawSubmission {
    /// Raw submission from plain strings.
    pub fn new(name: &str, email: &str, message: &str) -> Self {
        Self {
            name: Some(Value::String(name.to_string())),
            email: Some(Value::String(email.to_string())),
            message: Some(Value::String(message.to_string())),
        }
    }
}

/// A submission that passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Submission {
    name: String,
    email: String,
    message: String,
}

impl Submission {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Contact submission validator.
pub struct SubmissionValidator {
    config: ValidationConfig,
}

impl SubmissionValidator {
    /// Create a new validator with the given configuration.
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate a raw submission.
    pub fn validate(&self, raw: &RawSubmission) -> Result<Submission, FieldErrors> {
        let mut errors = FieldErrors::new();

        let name = string_field(&raw.name, "name", &mut errors);
        let email = string_field(&raw.email, "email", &mut errors);
        let message = string_field(&raw.message, "message", &mut errors);

        if let Some(name) = name {
            if let Err(msg) = check_length(
                name,
                "Name",
                self.config.name_min,
                self.config.name_max,
            ) {
                errors.insert("name".to_string(), msg);
            }
        }

        if let Some(email) = email {
            if !is_valid_email(email) {
                errors.insert("email".to_string(), "Invalid email address".to_string());
            }
        }

        if let Some(message) = message {
            if let Err(msg) = check_length(
                message,
                "Message",
                self.config.message_min,
                self.config.message_max,
            ) {
                errors.insert("message".to_string(), msg);
            }
        }

        match (name, email, message) {
            (Some(name), Some(email), Some(message)) if errors.is_empty() => Ok(Submission {
                name: name.to_string(),
                email: email.to_string(),
                message: message.to_string(),
            }),
            _ => {
                debug!(fields = ?errors.keys().collect::<Vec<_>>(), "Submission invalid");
                Err(errors)
            }
        }
    }
}

/// Extract a string field, recording an error when missing or mistyped.
fn string_field<'a>(
    value: &'a Option<Value>,
    field: &str,
    errors: &mut FieldErrors,
) -> Option<&'a str> {
    match value {
        Some(Value::String(s)) => Some(s.as_str()),
        None | Some(Value::Null) => {
            errors.insert(field.to_string(), "Required".to_string());
            None
        }
        Some(_) => {
            errors.insert(field.to_string(), "Expected string".to_string());
            None
        }
    }
}

/// Check a length in characters against inclusive bounds.
fn check_length(value: &str, label: &str, min: usize, max: usize) -> Result<(), String> {
    let len = value.chars().count();
    if len < min {
        Err(format!("{label} must be at least {min} characters"))
    } else if len > max {
        Err(format!("{label} must be at most {max} characters"))
    } else {
        Ok(())
    }
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9_'+\-.]*[A-Za-z0-9_+\-]@([A-Za-z0-9][A-Za-z0-9\-]*\.)+[A-Za-z]{2,}$")
            .expect("email pattern is valid")
    })
}

/// Standard address format: no leading dot and no consecutive dots in the
/// local part, dotted domain ending in an alphabetic TLD.
pub fn is_valid_email(email: &str) -> bool {
    !email.starts_with('.') && !email.contains("..") && email_pattern().is_match(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_validator() -> SubmissionValidator {
        SubmissionValidator::new(ValidationConfig::default())
    }

    #[test]
    fn test_valid_submission() {
        let validator = default_validator();
        let raw = RawSubmission::new(
            "Jane Doe",
            "jane@x.com",
            "Hello, I would like to discuss a project.",
        );

        let submission = validator.validate(&raw).unwrap();
        assert_eq!(submission.name(), "Jane Doe");
        assert_eq!(submission.email(), "jane@x.com");
    }

    #[test]
    fn test_short_name_reports_only_name() {
        let validator = default_validator();
        let raw = RawSubmission::new("J", "jane@x.com", "Hello, I would like to discuss a project.");

        let errors = validator.validate(&raw).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors["name"], "Name must be at least 2 characters");
    }

    #[test]
    fn test_all_violations_aggregated() {
        let validator = default_validator();
        let raw = RawSubmission::new(&"x".repeat(51), "not-an-email", "too short");

        let errors = validator.validate(&raw).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors["name"], "Name must be at most 50 characters");
        assert_eq!(errors["email"], "Invalid email address");
        assert_eq!(errors["message"], "Message must be at least 10 characters");
    }

    #[test]
    fn test_length_bounds_inclusive() {
        let validator = default_validator();

        let raw = RawSubmission::new("Jo", "jo@example.org", &"m".repeat(1000));
        assert!(validator.validate(&raw).is_ok());

        let raw = RawSubmission::new(&"n".repeat(50), "jo@example.org", &"m".repeat(10));
        assert!(validator.validate(&raw).is_ok());

        let raw = RawSubmission::new("Jo", "jo@example.org", &"m".repeat(1001));
        let errors = validator.validate(&raw).unwrap_err();
        assert_eq!(errors["message"], "Message must be at most 1000 characters");
    }

    #[test]
    fn test_lengths_count_characters() {
        let validator = default_validator();
        // Three characters, four bytes
        let raw = RawSubmission::new("Zoë", "zoe@example.org", "Ünïcödé messäge");
        assert!(validator.validate(&raw).is_ok());
    }

    #[test]
    fn test_missing_and_mistyped_fields() {
        let validator = default_validator();
        let raw = RawSubmission {
            name: None,
            email: Some(Value::from(42)),
            message: Some(Value::String("Hello there, a long enough message".into())),
        };

        let errors = validator.validate(&raw).unwrap_err();
        assert_eq!(errors["name"], "Required");
        assert_eq!(errors["email"], "Expected string");
        assert!(!errors.contains_key("message"));
    }

    #[test]
    fn test_email_format() {
        assert!(is_valid_email("jane@x.com"));
        assert!(is_valid_email("first.last+tag@mail.example.co.uk"));
        assert!(is_valid_email("o'brien@example.ie"));

        assert!(!is_valid_email("plainaddress"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email(".jane@example.com"));
        assert!(!is_valid_email("jane..doe@example.com"));
        assert!(!is_valid_email("jane.@example.com"));
        assert!(!is_valid_email("jane@example"));
        assert!(!is_valid_email("jane@-example.com"));
        assert!(!is_valid_email("jane doe@example.com"));
    }
}
