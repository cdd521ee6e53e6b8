// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the contact relay.
//!
//! Defaults reproduce the behaviour of the original contact route: three
//! submissions per client per hour, Resend as the primary provider and a
//! Gmail SMTP relay as the fallback.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the contact relay service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Validation configuration
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Delivery configuration
    #[serde(default)]
    pub delivery: DeliveryConfig,

    /// Email provider credentials
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// CORS configuration
    #[serde(default)]
    pub cors: CorsConfig,

    /// Redis URL for a shared rate store. In-memory when unset.
    #[serde(default)]
    pub redis_url: Option<String>,
}

/// Fixed-window rate limiting per client identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum submissions per window (default: 3)
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    /// Window length in seconds (default: 3600)
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Interval between sweeps of expired windows in seconds (default: 60)
    #[serde(default = "default_sweep_secs")]
    pub sweep_interval_secs: u64,
}

/// Field length limits for submissions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default = "default_name_min")]
    pub name_min: usize,

    #[serde(default = "default_name_max")]
    pub name_max: usize,

    #[serde(default = "default_message_min")]
    pub message_min: usize,

    #[serde(default = "default_message_max")]
    pub message_max: usize,
}

/// Delivery configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Site owner address that receives notifications
    #[serde(default = "default_owner_address")]
    pub owner_address: String,

    /// Upper bound on a single provider call in milliseconds (default: 10000)
    #[serde(default = "default_provider_timeout_ms")]
    pub provider_timeout_ms: u64,

    /// Send a confirmation to the submitter after delivery (default: true)
    #[serde(default = "default_true")]
    pub auto_reply_enabled: bool,
}

/// Credentials for the shipped providers. A provider whose section is
/// absent stays in the chain but reports itself unavailable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub resend: Option<ResendConfig>,

    #[serde(default)]
    pub smtp: Option<SmtpConfig>,
}

/// Resend HTTP API provider.
#[derive(Clone, Serialize, Deserialize)]
pub struct ResendConfig {
    pub api_key: String,

    #[serde(default = "default_resend_from")]
    pub from: String,

    #[serde(default = "default_resend_api_url")]
    pub api_url: String,
}

/// SMTP relay provider.
#[derive(Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    #[serde(default = "default_smtp_host")]
    pub host: String,

    #[serde(default = "default_smtp_port")]
    pub port: u16,

    pub username: String,

    pub password: String,

    /// Sender address; the username when unset
    #[serde(default)]
    pub from: Option<String>,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

/// Origins allowed to post submissions cross-origin. Empty means same-origin only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorsConfig {
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_max_requests() -> u32 {
    3
}

fn default_window_secs() -> u64 {
    3600 // 1 hour
}

fn default_sweep_secs() -> u64 {
    60
}

fn default_name_min() -> usize {
    2
}

fn default_name_max() -> usize {
    50
}

fn default_message_min() -> usize {
    10
}

fn default_message_max() -> usize {
    1000
}

fn default_owner_address() -> String {
    "owner@example.com".to_string()
}

fn default_provider_timeout_ms() -> u64 {
    10_000
}

fn default_resend_from() -> String {
    "onboarding@resend.dev".to_string()
}

fn default_resend_api_url() -> String {
    "https://api.resend.com/emails".to_string()
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    465
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            rate_limit: RateLimitConfig::default(),
            validation: ValidationConfig::default(),
            delivery: DeliveryConfig::default(),
            providers: ProvidersConfig::default(),
            metrics: MetricsConfig::default(),
            cors: CorsConfig::default(),
            redis_url: None,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
            sweep_interval_secs: default_sweep_secs(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            name_min: default_name_min(),
            name_max: default_name_max(),
            message_min: default_message_min(),
            message_max: default_message_max(),
        }
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            owner_address: default_owner_address(),
            provider_timeout_ms: default_provider_timeout_ms(),
            auto_reply_enabled: default_true(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

impl ResendConfig {
    /// Config with the default sender and API endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            from: default_resend_from(),
            api_url: default_resend_api_url(),
        }
    }
}

impl SmtpConfig {
    /// Gmail relay config for the given account.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            host: default_smtp_host(),
            port: default_smtp_port(),
            username: username.into(),
            password: password.into(),
            from: None,
        }
    }

    /// Address used in the `From` header.
    pub fn sender(&self) -> &str {
        self.from.as_deref().unwrap_or(&self.username)
    }
}

// Credentials stay out of Debug output so config can be logged safely.
impl std::fmt::Debug for ResendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResendConfig")
            .field("api_key", &"<redacted>")
            .field("from", &self.from)
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("from", &self.from)
            .finish()
    }
}

impl RateLimitConfig {
    /// Longest accepted window (one leap year).
    pub const MAX_WINDOW_SECS: u64 = 366 * 24 * 60 * 60;

    /// Whether `secs` is a usable window length.
    pub fn window_secs_in_range(secs: u64) -> bool {
        (1..=Self::MAX_WINDOW_SECS).contains(&secs)
    }

    /// Get the rate window duration, capped at `MAX_WINDOW_SECS`
    pub fn window_duration(&self) -> Duration {
        Duration::from_secs(self.window_secs.min(Self::MAX_WINDOW_SECS))
    }

    /// Get the sweep interval
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

impl DeliveryConfig {
    /// Get the per-call provider timeout
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }
}
