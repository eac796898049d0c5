mod file;
mod memory;

pub use file::FileKvBackend;
pub use memory::MemoryKvBackend;

use crate::dao::storage::StorageResult;

/// Abstraction over the local key-value medium holding serialized documents.
///
/// Calls are synchronous: local persistence completes before any remote work starts.
pub trait KeyValueBackend: Send + Sync {
    /// Raw document stored under `key`, `None` when absent.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;
    /// Replace the document stored under `key`.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;
}
