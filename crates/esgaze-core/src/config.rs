//! Centralized configuration for the ElasticGaze backend.
//!
//! Directory names mirror the layout the desktop shell creates under the
//! application data directory.

use std::time::Duration;

/// Application-level configuration.
pub struct AppConfig;

impl AppConfig {
    pub const APP_NAME: &'static str = "ElasticGaze";
    /// Version string of the bundled editor component. Doubles as the cache
    /// schema version: envelopes written under a different version are cold.
    pub const EDITOR_ASSET_VERSION: &'static str = "0.52.2";
}

/// Shared directory and path configurations.
pub struct PathsConfig;

impl PathsConfig {
    pub const EDITOR_CACHE_DIR_NAME: &'static str = "editor-cache";
    pub const LOCAL_STORE_FILENAME: &'static str = "local-store.sqlite";
    pub const LOGS_DIR_NAME: &'static str = "esgaze-logs";
}

/// Editor cache timing configuration.
pub struct EditorCacheConfig;

impl EditorCacheConfig {
    /// Time-to-live for local-store envelopes (24 hours).
    pub const LOCAL_TTL: Duration = Duration::from_secs(24 * 60 * 60);
    /// Age after which the host-side cache reports entries as expired (7 days).
    pub const HOST_EXPIRY: Duration = Duration::from_secs(7 * 24 * 60 * 60);
    /// Fixed key namespace for local-store envelopes. The full key appends
    /// the editor schema version.
    pub const LOCAL_KEY_PREFIX: &'static str = "esgaze.editor-cache";
}
