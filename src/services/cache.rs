use serde::{de::DeserializeOwned, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur with cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// In-process TTL cache for search responses and provider samples.
///
/// Values are stored as serialized JSON so the cache stays agnostic to the
/// payload type. Entries expire after the configured TTL; capacity eviction
/// is handled by moka.
pub struct ResponseCache {
    entries: moka::sync::Cache<String, String>,
}

impl ResponseCache {
    pub fn new(max_entries: u64, ttl_secs: u64) -> Self {
        let entries = moka::sync::CacheBuilder::new(max_entries)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();
        Self { entries }
    }

    pub fn get<T>(&self, key: &str) -> Option<T>
    where
        T: DeserializeOwned,
    {
        let json = self.entries.get(key)?;
        match serde_json::from_str(&json) {
            Ok(value) => {
                tracing::trace!("Cache hit: {}", key);
                Some(value)
            }
            Err(_) => None,
        }
    }

    pub fn set<T>(&self, key: &str, value: &T) -> Result<(), CacheError>
    where
        T: Serialize,
    {
        let json = serde_json::to_string(value)?;
        self.entries.insert(key.to_string(), json);
        tracing::trace!("Cache set: {}", key);
        Ok(())
    }

    pub fn invalidate(&self, key: &str) {
        self.entries.invalidate(key);
    }

    pub fn entry_count(&self) -> u64 {
        self.entries.entry_count()
    }
}

/// Stable fingerprint of a serializable payload, for cache keying.
/// Request types use ordered maps, so equal queries serialize identically.
pub fn fingerprint<T: Serialize>(value: &T) -> String {
    let json = serde_json::to_string(value).unwrap_or_default();
    let mut hasher = DefaultHasher::new();
    json.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Key for a fully paginated search response.
    pub fn search(config_key: &str, query_fingerprint: &str) -> String {
        format!("search:{}:{}", config_key, query_fingerprint)
    }

    /// Key for a provider sample, shared across pages of the same query.
    pub fn sample(config_key: &str, query_fingerprint: &str) -> String {
        format!("sample:{}:{}", config_key, query_fingerprint)
    }
}
