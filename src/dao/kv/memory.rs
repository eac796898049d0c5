use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;

use crate::dao::storage::{StorageError, StorageResult};

use super::KeyValueBackend;

/// Process-local backend used for ephemeral runs.
///
/// It can be switched off to behave like a disabled browser storage, in which
/// case every call fails with [`StorageError::Disabled`].
#[derive(Debug, Default)]
pub struct MemoryKvBackend {
    entries: DashMap<String, String>,
    disabled: AtomicBool,
}

impl MemoryKvBackend {
    /// Empty, enabled backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle availability of the backend.
    pub fn set_disabled(&self, disabled: bool) {
        self.disabled.store(disabled, Ordering::SeqCst);
    }

    fn ensure_enabled(&self) -> StorageResult<()> {
        if self.disabled.load(Ordering::SeqCst) {
            Err(StorageError::Disabled)
        } else {
            Ok(())
        }
    }
}

impl KeyValueBackend for MemoryKvBackend {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.ensure_enabled()?;
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.ensure_enabled()?;
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
