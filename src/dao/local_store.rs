//! Best-effort JSON persistence on top of a [`KeyValueBackend`].
//!
//! Nothing in here reports failure to the caller: reads fall back to defaults
//! and writes are dropped, with a warning in the logs.

use std::sync::Arc;

use serde::{Serialize, de::DeserializeOwned};
use tracing::warn;

use crate::dao::{kv::KeyValueBackend, models::StoreSnapshot, storage::StorageResult};

/// Key under which the whole session store is persisted.
pub const SESSIONS_KEY: &str = "tarot:sessions";

/// Typed JSON documents over a key-value backend. Failures are logged, never returned.
#[derive(Clone)]
pub struct LocalStore {
    backend: Arc<dyn KeyValueBackend>,
}

impl LocalStore {
    /// Store writing through `backend`.
    pub fn new(backend: Arc<dyn KeyValueBackend>) -> Self {
        Self { backend }
    }

    /// Load the persisted session store, or an empty one when it cannot be read.
    pub fn load_sessions(&self) -> StoreSnapshot {
        self.read_json(SESSIONS_KEY).unwrap_or_default()
    }

    /// Persist the whole session store. The document is encoded on the caller's
    /// task and written from the blocking pool.
    pub async fn save_sessions(&self, snapshot: &StoreSnapshot) {
        let Some(raw) = encode(SESSIONS_KEY, snapshot) else {
            return;
        };
        let store = self.clone();
        let write = tokio::task::spawn_blocking(move || store.write_raw(SESSIONS_KEY, &raw));
        if let Err(err) = write.await {
            warn!(key = SESSIONS_KEY, error = %err, "local storage write task failed");
        }
    }

    /// Read and decode a JSON document, `None` when missing, unreadable or malformed.
    pub fn read_json<T>(&self, key: &str) -> Option<T>
    where
        T: DeserializeOwned,
    {
        let raw = match self.backend.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                warn!(key, error = %err, "local storage read failed; using defaults");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(key, error = %err, "local document is malformed; using defaults");
                None
            }
        }
    }

    /// Encode and write a JSON document, dropping the write on failure.
    pub fn write_json<T>(&self, key: &str, value: &T)
    where
        T: ?Sized + Serialize,
    {
        if let Some(raw) = encode(key, value) {
            self.write_raw(key, &raw);
        }
    }

    /// Raw read that keeps the distinction between "absent" and "unavailable".
    pub fn read_raw(&self, key: &str) -> StorageResult<Option<String>> {
        self.backend.get(key)
    }

    /// Raw write. A failure leaves the in-memory state authoritative.
    pub fn write_raw(&self, key: &str, value: &str) {
        if let Err(err) = self.backend.set(key, value) {
            warn!(key, error = %err, "local storage write failed; change kept in memory only");
        }
    }
}

fn encode<T>(key: &str, value: &T) -> Option<String>
where
    T: ?Sized + Serialize,
{
    serde_json::to_string(value)
        .inspect_err(|err| warn!(key, error = %err, "failed to encode local document"))
        .ok()
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;
    use crate::dao::{kv::MemoryKvBackend, models::SessionEntity};

    fn sample_snapshot() -> StoreSnapshot {
        let mut snapshot = StoreSnapshot::default();
        snapshot.sessions.insert(
            "sess_1".into(),
            SessionEntity {
                id: "sess_1".into(),
                remote_id: None,
                participants: vec!["Alice".into(), "Bob".into()],
                games: Vec::new(),
                created_at: SystemTime::UNIX_EPOCH,
            },
        );
        snapshot
    }

    #[test]
    fn missing_key_loads_empty_store() {
        let store = LocalStore::new(Arc::new(MemoryKvBackend::new()));
        assert!(store.load_sessions().sessions.is_empty());
    }

    #[tokio::test]
    async fn saved_store_is_loaded_back() {
        let store = LocalStore::new(Arc::new(MemoryKvBackend::new()));
        let snapshot = sample_snapshot();
        store.save_sessions(&snapshot).await;
        assert_eq!(store.load_sessions(), snapshot);
    }

    #[test]
    fn malformed_document_loads_empty_store() {
        let backend = Arc::new(MemoryKvBackend::new());
        backend.set(SESSIONS_KEY, "{not json").unwrap();
        let store = LocalStore::new(backend);
        assert!(store.load_sessions().sessions.is_empty());
    }

    #[tokio::test]
    async fn unavailable_storage_never_fails() {
        let backend = Arc::new(MemoryKvBackend::new());
        let store = LocalStore::new(backend.clone());
        store.save_sessions(&sample_snapshot()).await;

        backend.set_disabled(true);
        store.save_sessions(&StoreSnapshot::default()).await;
        assert!(store.load_sessions().sessions.is_empty());

        backend.set_disabled(false);
        assert_eq!(store.load_sessions(), sample_snapshot());
    }
}
