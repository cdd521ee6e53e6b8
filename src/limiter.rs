// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Fixed-window rate limiter for contact submissions.
//!
//! Each client identifier gets a window of `window_secs` starting with its
//! first submission. Up to `max_requests` submissions are admitted inside the
//! window; the first submission after the window ends opens a new one.

use crate::clock::{remaining, to_chrono, Clock};
use crate::config::RateLimitConfig;
use crate::error::StoreError;
use crate::store::{RateStore, RateWindow};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Result of a rate limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitResult {
    /// Submission is allowed
    Allowed {
        /// Remaining submissions in current window
        remaining: u32,
        /// Time until window resets
        reset_in: Duration,
    },
    /// Submission is rate limited
    Limited {
        /// Time until the window resets
        retry_after: Duration,
    },
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitResult::Allowed { .. })
    }
}

/// Thread-safe rate limiter over an injected store.
pub struct RateLimiter {
    config: RateLimitConfig,
    store: Arc<dyn RateStore>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    /// Create a new rate limiter with the given configuration.
    pub fn new(config: RateLimitConfig, store: Arc<dyn RateStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            store,
            clock,
        }
    }

    /// Check and record a submission for `identifier`.
    ///
    /// A lost compare-and-swap means another submission for the same key was
    /// recorded in between, so the loop re-reads and decides again until its
    /// own write lands or the window is full.
    pub async fn check(&self, identifier: &str) -> Result<RateLimitResult, StoreError> {
        let max = self.config.max_requests;

        loop {
            let now = self.clock.now();
            let current = self.store.get(identifier).await?;

            let next = match current {
                Some(window) if !window.is_expired(now) => {
                    if window.count >= max {
                        let retry_after = remaining(now, window.reset_at);
                        debug!(%identifier, ?retry_after, "Client rate limit exceeded");
                        return Ok(RateLimitResult::Limited { retry_after });
                    }
                    RateWindow::new(window.count + 1, window.reset_at)
                }
                // Absent or expired: open a fresh window
                _ => RateWindow::new(1, self.window_end(now)),
            };

            if self.store.compare_and_swap(identifier, current, next).await? {
                return Ok(RateLimitResult::Allowed {
                    remaining: max.saturating_sub(next.count),
                    reset_in: remaining(now, next.reset_at),
                });
            }

            debug!(%identifier, "Rate window changed concurrently, retrying");
            tokio::task::yield_now().await;
        }
    }

    /// End of a window opened at `now`, clamped to the latest representable instant.
    fn window_end(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_add_signed(to_chrono(self.config.window_duration()))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Remove windows that have ended (should be called periodically).
    pub async fn cleanup(&self) -> Result<usize, StoreError> {
        let removed = self.store.purge_expired(self.clock.now()).await?;
        if removed > 0 {
            debug!(removed, "Purged expired rate windows");
        }
        Ok(removed)
    }
}
