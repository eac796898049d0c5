/// Key-value backends holding the persisted documents.
pub mod kv;
/// Typed JSON access to the key-value backend.
pub mod local_store;
/// Session and game records as persisted locally.
pub mod models;
/// Hosted backend mirroring sessions and games.
pub mod remote;
/// Scoring rules, misère flags and theme preference.
pub mod settings;
/// Storage error types shared by the backends.
pub mod storage;
