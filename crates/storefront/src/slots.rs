//! Durable per-visitor key-value slots.
//!
//! The cart and the location selection each live in one named slot. In the
//! running server a slot is an entry in the visitor's `tower-sessions` session
//! (stored in `PostgreSQL`), so state survives page reloads and restarts.
//! Tests use [`MemorySlots`].

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::Value;
use thiserror::Error;
use tokio::sync::Mutex;
use tower_sessions::Session;

/// Errors reading or writing a slot.
#[derive(Debug, Error)]
pub enum SlotError {
    #[error("session store error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("slot storage unavailable: {0}")]
    Unavailable(String),
}

/// A named store of JSON snapshots scoped to one visitor.
pub trait SlotStore: Send + Sync {
    /// Read the snapshot stored under `key`, if any.
    fn load(&self, key: &str) -> impl Future<Output = Result<Option<Value>, SlotError>> + Send;

    /// Replace the snapshot stored under `key`.
    fn save(&self, key: &str, value: Value) -> impl Future<Output = Result<(), SlotError>> + Send;

    /// Remove the snapshot stored under `key`.
    fn erase(&self, key: &str) -> impl Future<Output = Result<(), SlotError>> + Send;
}

/// Slots backed by the visitor's session.
#[derive(Clone, Debug)]
pub struct SessionSlots {
    session: Session,
}

impl SessionSlots {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }
}

impl SlotStore for SessionSlots {
    async fn load(&self, key: &str) -> Result<Option<Value>, SlotError> {
        Ok(self.session.get::<Value>(key).await?)
    }

    async fn save(&self, key: &str, value: Value) -> Result<(), SlotError> {
        self.session.insert(key, value).await?;
        Ok(())
    }

    async fn erase(&self, key: &str) -> Result<(), SlotError> {
        self.session.remove::<Value>(key).await?;
        Ok(())
    }
}

/// In-memory slots for tests and tooling.
///
/// Clones share the same storage, so a test can hand one clone to a store and
/// inspect the other.
#[derive(Clone, Debug, Default)]
pub struct MemorySlots {
    values: Arc<Mutex<HashMap<String, Value>>>,
    read_only: Arc<AtomicBool>,
}

impl MemorySlots {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a slot with a raw value, e.g. a corrupt snapshot.
    pub async fn put(&self, key: &str, value: Value) {
        self.values.lock().await.insert(key.to_string(), value);
    }

    /// Read a slot without going through the trait.
    pub async fn get(&self, key: &str) -> Option<Value> {
        self.values.lock().await.get(key).cloned()
    }

    /// Make every subsequent write fail with [`SlotError::Unavailable`].
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), SlotError> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(SlotError::Unavailable("slots are read-only".to_string()));
        }
        Ok(())
    }
}

impl SlotStore for MemorySlots {
    async fn load(&self, key: &str) -> Result<Option<Value>, SlotError> {
        Ok(self.get(key).await)
    }

    async fn save(&self, key: &str, value: Value) -> Result<(), SlotError> {
        self.check_writable()?;
        self.put(key, value).await;
        Ok(())
    }

    async fn erase(&self, key: &str) -> Result<(), SlotError> {
        self.check_writable()?;
        self.values.lock().await.remove(key);
        Ok(())
    }
}
