/// Refresh Token Storage
///
/// One refresh token value per user, keyed by `prefix + "refresh:" + user_id`.
/// The store entry's TTL is the token's effective lifetime:
/// - saving with an expiry already in the past is a silent no-op
/// - saving again for the same user overwrites the previous value
/// - deleting an absent entry is not an error

use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use crate::auth::errors::StoreError;
use crate::configuration::RedisSettings;

/// Contract the authentication engine uses against the expiring key-value store
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Store `token` for `user_id` until `expires_at`, replacing any previous value
    async fn save(
        &self,
        user_id: &str,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Fetch the live token for `user_id`, or `StoreError::NotFound`
    async fn get(&self, user_id: &str) -> Result<String, StoreError>;

    /// Remove the token for `user_id`
    async fn delete(&self, user_id: &str) -> Result<(), StoreError>;

    /// Check that the backing store answers
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Build the store key for a user's refresh token
pub fn refresh_key(prefix: &str, user_id: &str) -> String {
    format!("{}refresh:{}", prefix, user_id)
}

/// Time left until `expires_at`, or `None` if it is not in the future
pub fn remaining_ttl(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> Option<StdDuration> {
    (expires_at - now).to_std().ok().filter(|ttl| !ttl.is_zero())
}

/// TTL in whole milliseconds for `SET ... PX`
///
/// PX rejects 0, so sub-millisecond remainders round up to 1.
pub fn px_millis(ttl: StdDuration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

/// Redis-backed refresh token store
#[derive(Clone)]
pub struct RedisRefreshTokenStore {
    conn: ConnectionManager,
    key_prefix: String,
}

impl RedisRefreshTokenStore {
    /// Connect to Redis using the configured URL
    pub async fn connect(settings: &RedisSettings) -> Result<Self, StoreError> {
        tracing::info!("Connecting to Redis");

        let client = redis::Client::open(settings.url.as_str())?;
        let conn = ConnectionManager::new(client).await?;

        tracing::info!(key_prefix = %settings.key_prefix, "Connected to Redis");
        Ok(Self {
            conn,
            key_prefix: settings.key_prefix.clone(),
        })
    }
}

#[async_trait]
impl RefreshTokenStore for RedisRefreshTokenStore {
    async fn save(
        &self,
        user_id: &str,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let Some(ttl) = remaining_ttl(expires_at, Utc::now()) else {
            tracing::debug!(user_id, "Refresh token already expired, not stored");
            return Ok(());
        };

        let key = refresh_key(&self.key_prefix, user_id);
        let millis = px_millis(ttl);
        let mut conn = self.conn.clone();

        let _: () = redis::cmd("SET")
            .arg(&key)
            .arg(token)
            .arg("PX")
            .arg(millis)
            .query_async(&mut conn)
            .await?;

        Ok(())
    }

    async fn get(&self, user_id: &str) -> Result<String, StoreError> {
        let key = refresh_key(&self.key_prefix, user_id);
        let mut conn = self.conn.clone();

        let value: Option<String> = conn.get(&key).await?;
        value.ok_or(StoreError::NotFound)
    }

    async fn delete(&self, user_id: &str) -> Result<(), StoreError> {
        let key = refresh_key(&self.key_prefix, user_id);
        let mut conn = self.conn.clone();

        let _: () = conn.del(&key).await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct StoredToken {
    value: String,
    expires_at: DateTime<Utc>,
}

/// In-process refresh token store with the same expiry semantics as Redis
///
/// Expired entries are dropped lazily when read.
#[derive(Debug, Default)]
pub struct InMemoryRefreshTokenStore {
    entries: DashMap<String, StoredToken>,
    key_prefix: String,
}

impl InMemoryRefreshTokenStore {
    pub fn new(key_prefix: impl Into<String>) -> Self {
        Self {
            entries: DashMap::new(),
            key_prefix: key_prefix.into(),
        }
    }

    /// Number of entries currently held, expired or not
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a raw key is present, expired or not
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

#[async_trait]
impl RefreshTokenStore for InMemoryRefreshTokenStore {
    async fn save(
        &self,
        user_id: &str,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if remaining_ttl(expires_at, Utc::now()).is_none() {
            tracing::debug!(user_id, "Refresh token already expired, not stored");
            return Ok(());
        }

        self.entries.insert(
            refresh_key(&self.key_prefix, user_id),
            StoredToken {
                value: token.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn get(&self, user_id: &str) -> Result<String, StoreError> {
        let key = refresh_key(&self.key_prefix, user_id);
        let stored = self
            .entries
            .get(&key)
            .map(|entry| entry.value().clone())
            .ok_or(StoreError::NotFound)?;

        if remaining_ttl(stored.expires_at, Utc::now()).is_none() {
            self.entries
                .remove_if(&key, |_, current| current.expires_at <= Utc::now());
            return Err(StoreError::NotFound);
        }

        Ok(stored.value)
    }

    async fn delete(&self, user_id: &str) -> Result<(), StoreError> {
        self.entries.remove(&refresh_key(&self.key_prefix, user_id));
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
