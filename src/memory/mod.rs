//! Memory bank and session tracking.
//!
//! This module provides:
//! - [`MemoryStore`] - key/value storage with per-entry expiry, the seam a
//!   persistent backend plugs into
//! - [`InMemoryStore`] - the process-local backend
//! - [`MemoryBank`] - wraps stage output in a `{data, metadata, timestamp}`
//!   envelope before storing it
//! - [`session`] - per-task session records mirrored by the coordinator

pub mod session;

pub use session::{Session, SessionEvent, SessionInfo, SessionManager, SessionStats};

use crate::types::{AppError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use utoipa::ToSchema;

/// Default lifetime of a memory entry.
pub const DEFAULT_MEMORY_TTL: Duration = Duration::from_secs(3600);

/// Prefix applied to every memory bank key.
const MEMORY_KEY_PREFIX: &str = "memory:";

/// Statistics reported by a memory backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MemoryStats {
    pub total_memories: usize,
    pub storage_backend: String,
    pub status: String,
    pub hits: u64,
    pub misses: u64,
}

/// Key/value store with expiry.
///
/// Implementations can use different backends (in-memory, Redis, disk, etc.).
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Store `value` under `key`, replacing any previous entry
    async fn put(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<()>;

    /// Fetch a live entry. Expired entries read as absent.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Live keys containing `pattern`
    async fn keys_matching(&self, pattern: &str) -> Result<Vec<String>>;

    /// Drop expired entries, returning how many were removed
    async fn remove_expired(&self) -> Result<usize>;

    async fn stats(&self) -> MemoryStats;
}

#[derive(Debug, Clone)]
struct StoredEntry {
    value: Value,
    expires_at: Option<Instant>,
}

impl StoredEntry {
    fn is_expired(&self) -> bool {
        self.expires_at
            .map(|exp| Instant::now() > exp)
            .unwrap_or(false)
    }
}

/// Process-local [`MemoryStore`]. Thread-safe via `parking_lot::RwLock`.
#[derive(Default)]
pub struct InMemoryStore {
    entries: RwLock<HashMap<String, StoredEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    async fn put(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<()> {
        let entry = StoredEntry {
            value,
            // A ttl past the end of the clock never expires.
            expires_at: ttl.and_then(|d| Instant::now().checked_add(d)),
        };
        self.entries.write().insert(key.to_string(), entry);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let found = self
            .entries
            .read()
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.value.clone());

        match found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        Ok(found)
    }

    async fn keys_matching(&self, pattern: &str) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self
            .entries
            .read()
            .iter()
            .filter(|(key, entry)| key.contains(pattern) && !entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn remove_expired(&self) -> Result<usize> {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired());
        Ok(before - entries.len())
    }

    async fn stats(&self) -> MemoryStats {
        let live = self
            .entries
            .read()
            .values()
            .filter(|entry| !entry.is_expired())
            .count();

        MemoryStats {
            total_memories: live,
            storage_backend: "in_memory".to_string(),
            status: "active".to_string(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// What the memory bank stores around each payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub data: Value,
    pub metadata: Value,
    pub timestamp: DateTime<Utc>,
}

/// Stage-facing memory: enveloped records with a uniform lifetime.
#[derive(Clone)]
pub struct MemoryBank {
    store: Arc<dyn MemoryStore>,
    ttl: Duration,
}

impl Default for MemoryBank {
    fn default() -> Self {
        Self::in_memory(DEFAULT_MEMORY_TTL)
    }
}

impl MemoryBank {
    pub fn new(store: Arc<dyn MemoryStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn in_memory(ttl: Duration) -> Self {
        Self::new(Arc::new(InMemoryStore::new()), ttl)
    }

    /// Store `data` with `metadata` under `key`.
    pub async fn store_memory<T: Serialize + ?Sized>(
        &self,
        key: &str,
        data: &T,
        metadata: Value,
    ) -> Result<()> {
        let record = MemoryRecord {
            data: serde_json::to_value(data)
                .map_err(|e| AppError::Internal(format!("Failed to encode memory: {}", e)))?,
            metadata,
            timestamp: Utc::now(),
        };
        let value = serde_json::to_value(&record)
            .map_err(|e| AppError::Internal(format!("Failed to encode memory: {}", e)))?;

        self.store
            .put(&format!("{}{}", MEMORY_KEY_PREFIX, key), value, Some(self.ttl))
            .await?;
        tracing::debug!(key, "Stored memory");
        Ok(())
    }

    pub async fn retrieve_memory(&self, key: &str) -> Result<Option<MemoryRecord>> {
        self.store
            .get(&format!("{}{}", MEMORY_KEY_PREFIX, key))
            .await?
            .map(decode_record)
            .transpose()
    }

    /// Every live record whose key contains `pattern`.
    pub async fn search_memories(&self, pattern: &str) -> Result<Vec<MemoryRecord>> {
        let keys = self.store.keys_matching(pattern).await?;
        let mut records = Vec::with_capacity(keys.len());

        for key in keys.iter().filter(|k| k.starts_with(MEMORY_KEY_PREFIX)) {
            if let Some(value) = self.store.get(key).await? {
                records.push(decode_record(value)?);
            }
        }

        tracing::debug!(pattern, count = records.len(), "Searched memories");
        Ok(records)
    }

    pub async fn clear_old_memories(&self) -> Result<usize> {
        let removed = self.store.remove_expired().await?;
        if removed > 0 {
            tracing::info!(removed, "Cleared expired memories");
        }
        Ok(removed)
    }

    pub async fn get_memory_stats(&self) -> MemoryStats {
        self.store.stats().await
    }
}

fn decode_record(value: Value) -> Result<MemoryRecord> {
    serde_json::from_value(value)
        .map_err(|e| AppError::Internal(format!("Corrupt memory record: {}", e)))
}
