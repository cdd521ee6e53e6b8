// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Storage for per-client rate windows.
//!
//! The limiter only ever mutates a window through `compare_and_swap`, so a
//! store that makes that single operation atomic is enough to keep two
//! concurrent submissions from the same client from both being admitted.

use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Submission count for one client inside the current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateWindow {
    pub count: u32,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub reset_at: DateTime<Utc>,
}

impl RateWindow {
    pub fn new(count: u32, reset_at: DateTime<Utc>) -> Self {
        Self { count, reset_at }
    }

    /// A window is expired once `now` is strictly past `reset_at`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.reset_at
    }
}

/// Keyed storage for rate windows.
#[async_trait]
pub trait RateStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<RateWindow>, StoreError>;

    async fn set(&self, key: &str, window: RateWindow) -> Result<(), StoreError>;

    /// Replace the window for `key` with `new` only if the stored value still
    /// equals `expected` (`None` meaning absent). Returns whether the swap
    /// happened.
    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<RateWindow>,
        new: RateWindow,
    ) -> Result<bool, StoreError>;

    /// Drop windows that expired before `now`. Returns how many were removed.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError>;
}

/// Process-local store for single-instance deployments and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryRateStore {
    windows: Arc<RwLock<HashMap<String, RateWindow>>>,
}

impl MemoryRateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tracked identifiers.
    pub async fn len(&self) -> usize {
        self.windows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.windows.read().await.is_empty()
    }
}

#[async_trait]
impl RateStore for MemoryRateStore {
    async fn get(&self, key: &str) -> Result<Option<RateWindow>, StoreError> {
        Ok(self.windows.read().await.get(key).copied())
    }

    async fn set(&self, key: &str, window: RateWindow) -> Result<(), StoreError> {
        self.windows.write().await.insert(key.to_string(), window);
        Ok(())
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<RateWindow>,
        new: RateWindow,
    ) -> Result<bool, StoreError> {
        let mut windows = self.windows.write().await;
        if windows.get(key).copied() != expected {
            return Ok(false);
        }
        windows.insert(key.to_string(), new);
        Ok(true)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut windows = self.windows.write().await;
        let before = windows.len();
        windows.retain(|_, window| !window.is_expired(now));
        Ok(before - windows.len())
    }
}

/// Lua script for an atomic compare-and-set on the serialized window.
/// An empty expected value means the key must be absent.
#[cfg(feature = "redis-store")]
const COMPARE_AND_SWAP_SCRIPT: &str = r#"
	local current = redis.call('GET', KEYS[1])
	if (current == false and ARGV[1] == '') or current == ARGV[1] then
		redis.call('SET', KEYS[1], ARGV[2], 'PX', ARGV[3])
		return 1
	end
	return 0
"#;

/// Redis-backed store shared by every relay instance.
///
/// Keys expire on their own once the window is over, so `purge_expired`
/// has nothing to do.
#[cfg(feature = "redis-store")]
pub struct RedisRateStore {
    client: redis::Client,
    prefix: String,
}

#[cfg(feature = "redis-store")]
impl RedisRateStore {
    pub fn new(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url).map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(Self {
            client,
            prefix: "contact:rl:".to_string(),
        })
    }

    fn key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, StoreError> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    fn encode(window: &RateWindow) -> Result<String, StoreError> {
        serde_json::to_string(window).map_err(|e| StoreError::Backend(e.to_string()))
    }

    fn decode(key: &str, raw: &str) -> Result<RateWindow, StoreError> {
        serde_json::from_str(raw).map_err(|e| StoreError::Corrupt {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }

    /// Milliseconds from `now` until the window ends, at least one.
    fn ttl_millis(window: &RateWindow, now: DateTime<Utc>) -> i64 {
        window
            .reset_at
            .signed_duration_since(now)
            .num_milliseconds()
            .max(1)
    }
}

#[cfg(feature = "redis-store")]
#[async_trait]
impl RateStore for RedisRateStore {
    async fn get(&self, key: &str) -> Result<Option<RateWindow>, StoreError> {
        use redis::AsyncCommands;
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn
            .get(self.key(key))
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        raw.map(|value| Self::decode(key, &value)).transpose()
    }

    async fn set(&self, key: &str, window: RateWindow) -> Result<(), StoreError> {
        use redis::AsyncCommands;
        let mut conn = self.connection().await?;
        let ttl = u64::try_from(Self::ttl_millis(&window, Utc::now())).unwrap_or(1);
        conn.pset_ex::<_, _, ()>(self.key(key), Self::encode(&window)?, ttl)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<RateWindow>,
        new: RateWindow,
    ) -> Result<bool, StoreError> {
        let mut conn = self.connection().await?;
        let expected = match expected {
            Some(window) => Self::encode(&window)?,
            None => String::new(),
        };

        let swapped: i32 = redis::Script::new(COMPARE_AND_SWAP_SCRIPT)
            .key(self.key(key))
            .arg(expected)
            .arg(Self::encode(&new)?)
            .arg(Self::ttl_millis(&new, Utc::now()))
            .invoke_async(&mut conn)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(swapped == 1)
    }

    async fn purge_expired(&self, _now: DateTime<Utc>) -> Result<usize, StoreError> {
        Ok(0)
    }
}
