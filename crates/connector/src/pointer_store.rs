//! Durable per-channel cursor storage.
//!
//! A flat key-value mapping from channel id to the highest acknowledged
//! message id. Writes are last-writer-wins per key; no cross-key
//! transaction exists or is needed — the tick fold is monotonic, so a
//! partially applied write fan-out always leaves a valid state.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use telepull_core::{ChannelId, CursorSet, MessageId};

use crate::error::StoreError;

/// Interface for cursor persistence between ticks.
#[async_trait]
pub trait PointerStore: Send + Sync {
    /// Enumerate every (channel, cursor) pair. Empty store yields an
    /// empty set.
    async fn list_all(&self) -> Result<CursorSet, StoreError>;

    /// Upsert the cursor for one channel.
    async fn put(&self, channel: &ChannelId, id: &MessageId) -> Result<(), StoreError>;

    /// Look up a single channel's cursor.
    async fn get(&self, channel: &ChannelId) -> Result<Option<MessageId>, StoreError> {
        let mut all = self.list_all().await?;
        Ok(all.remove(channel))
    }
}

// ── In-memory store ──────────────────────────────────────────────────

/// Ephemeral store for tests and dev runs.
#[derive(Debug, Default)]
pub struct MemoryPointerStore {
    entries: RwLock<CursorSet>,
}

impl MemoryPointerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with the given cursors.
    pub fn with_entries(entries: CursorSet) -> Self {
        Self {
            entries: RwLock::new(entries),
        }
    }
}

#[async_trait]
impl PointerStore for MemoryPointerStore {
    async fn list_all(&self) -> Result<CursorSet, StoreError> {
        Ok(self.entries.read().await.clone())
    }

    async fn put(&self, channel: &ChannelId, id: &MessageId) -> Result<(), StoreError> {
        self.entries
            .write()
            .await
            .insert(channel.clone(), id.clone());
        Ok(())
    }
}

// ── JSON file store ──────────────────────────────────────────────────

/// Durable store backed by a single JSON file mapping channel id strings
/// to message id strings.
///
/// The whole mapping is loaded and rewritten on every put. Rewrites are
/// serialized behind a mutex so the concurrent put fan-out of a tick
/// cannot interleave file writes.
#[derive(Debug)]
pub struct JsonPointerStore {
    path: PathBuf,
    file_lock: Mutex<()>,
}

impl JsonPointerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file_lock: Mutex::new(()),
        }
    }

    fn load(&self) -> Result<CursorSet, StoreError> {
        if !self.path.exists() {
            return Ok(CursorSet::new());
        }
        let data = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&data)?)
    }

    fn save(&self, entries: &CursorSet) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, data)?;
        Ok(())
    }
}

#[async_trait]
impl PointerStore for JsonPointerStore {
    async fn list_all(&self) -> Result<CursorSet, StoreError> {
        let _guard = self.file_lock.lock().await;
        self.load()
    }

    async fn put(&self, channel: &ChannelId, id: &MessageId) -> Result<(), StoreError> {
        let _guard = self.file_lock.lock().await;
        let mut entries = self.load()?;
        entries.insert(channel.clone(), id.clone());
        self.save(&entries)?;
        debug!(channel = %channel, id = %id, "pointer stored");
        Ok(())
    }
}
