//! Point-in-time cache status snapshot for diagnostics and the UI.

use serde::Serialize;

/// Immutable snapshot of the coordinator and both persistent tiers.
///
/// Assembled by `EditorPreloader::cache_status`; safe to request at any time,
/// including mid-load. Tier failures degrade the relevant fields to their
/// "no cache" values instead of failing the snapshot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorCacheStatus {
    pub is_loaded: bool,
    pub is_preloading: bool,
    pub has_memory_handle: bool,
    pub has_local_cache: bool,
    /// Age of the local envelope in milliseconds, when one is present.
    pub local_cache_age_millis: Option<i64>,
    pub has_host_cache: bool,
    pub host_cache_expired: bool,
    pub host_cache_size_bytes: u64,
    pub host_cache_path: Option<String>,
}

impl EditorCacheStatus {
    /// Snapshot with every tier reporting "no cache".
    pub(crate) fn cold(is_loaded: bool, is_preloading: bool, has_memory_handle: bool) -> Self {
        Self {
            is_loaded,
            is_preloading,
            has_memory_handle,
            has_local_cache: false,
            local_cache_age_millis: None,
            has_host_cache: false,
            host_cache_expired: false,
            host_cache_size_bytes: 0,
            host_cache_path: None,
        }
    }
}
