//! Editor preload and caching subsystem.
//!
//! The heavy editor component is loaded lazily, at most once per process, and
//! evidence of successful loads is persisted across three tiers:
//!
//! 1. in-process memory (the module handle itself),
//! 2. a client-local SQLite store with a 24 hour TTL,
//! 3. a host-side filesystem cache with a 7 day expiry.
//!
//! The persistent tiers are advisory. They answer "has this editor version
//! loaded here before?" for logging and diagnostics; the instantiation itself
//! always runs, and a broken tier degrades to a cache miss.

pub mod coordinator;
pub mod envelope;
pub mod host_cache;
pub mod loader;
pub mod local_store;
pub mod status;

pub use coordinator::EditorPreloader;
pub use envelope::CacheEnvelope;
pub use host_cache::{FsEditorCache, HostCacheGateway, HostCacheInfo};
pub use loader::{AssetDirLoader, EditorLoader, EditorModule, LoadRecord};
pub use local_store::{LocalStore, SqliteLocalStore};
pub use status::EditorCacheStatus;
