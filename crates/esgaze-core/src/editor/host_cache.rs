//! Host-process-backed editor cache tier.
//!
//! The host cache outlives the UI process: it records evidence of previous
//! editor loads in a cache directory under the application data dir. The
//! coordinator talks to it through the `HostCacheGateway` trait so tests can
//! substitute failing or scripted tiers.

use crate::config::EditorCacheConfig;
use crate::error::{EsGazeError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File extension for host cache entries.
const CACHE_FILE_EXT: &str = "cache";

/// Metadata snapshot for one cached entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostCacheInfo {
    pub exists: bool,
    pub is_expired: bool,
    pub size_bytes: u64,
    pub cache_key: String,
    pub cache_path: String,
    /// RFC 3339 modification time, when the entry exists.
    pub mod_time: Option<String>,
}

/// Host-side persistent cache operations consumed by the coordinator.
#[async_trait]
pub trait HostCacheGateway: Send + Sync {
    /// Query metadata for the entry written under `version`. A missing entry
    /// is reported through `exists: false`, not an error.
    async fn query_cache_info(&self, version: &str) -> Result<HostCacheInfo>;

    /// Read the payload written under `version`.
    ///
    /// Fails with `CacheEntryNotFound` when absent or expired.
    async fn read_cache(&self, version: &str) -> Result<String>;

    /// Write (or overwrite) the payload for `version`.
    async fn write_cache(&self, version: &str, payload: &str) -> Result<()>;

    /// Remove the entry for `version`. Removing a missing entry is not an
    /// error.
    async fn invalidate_cache(&self, version: &str) -> Result<()>;

    /// Remove every cache entry.
    async fn clear_all_cache(&self) -> Result<()>;

    /// Total size of all cache entries in bytes.
    async fn cache_size(&self) -> Result<u64>;
}

/// Filesystem-backed host cache rooted under the application data directory.
pub struct FsEditorCache {
    cache_dir: PathBuf,
}

impl FsEditorCache {
    /// Create the cache, ensuring the cache directory exists.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Result<Self> {
        let cache_dir = cache_dir.into();
        std::fs::create_dir_all(&cache_dir)
            .map_err(|e| EsGazeError::io_with_path(e, &cache_dir))?;
        debug!("Editor cache directory ready: {}", cache_dir.display());
        Ok(Self { cache_dir })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Stable cache key for an editor version.
    fn cache_key(version: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!("editor-assets-{}", version).as_bytes());
        hex::encode(hasher.finalize())
    }

    fn entry_path(&self, version: &str) -> PathBuf {
        self.cache_dir
            .join(format!("{}.{}", Self::cache_key(version), CACHE_FILE_EXT))
    }

    fn is_cache_file(path: &Path) -> bool {
        path.extension().map(|e| e == CACHE_FILE_EXT).unwrap_or(false)
    }
}

#[async_trait]
impl HostCacheGateway for FsEditorCache {
    async fn query_cache_info(&self, version: &str) -> Result<HostCacheInfo> {
        let cache_key = Self::cache_key(version);
        let cache_path = self.entry_path(version);

        let mut cache_info = HostCacheInfo {
            exists: false,
            is_expired: false,
            size_bytes: 0,
            cache_key,
            cache_path: cache_path.to_string_lossy().into_owned(),
            mod_time: None,
        };

        let metadata = match tokio::fs::metadata(&cache_path).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(cache_info),
            Err(e) => return Err(EsGazeError::io_with_path(e, &cache_path)),
        };

        cache_info.exists = true;
        cache_info.size_bytes = metadata.len();

        if let Ok(modified) = metadata.modified() {
            let mod_time: DateTime<Utc> = modified.into();
            cache_info.mod_time = Some(mod_time.to_rfc3339());
            if let Ok(age) = modified.elapsed() {
                cache_info.is_expired = age > EditorCacheConfig::HOST_EXPIRY;
            }
        }

        Ok(cache_info)
    }

    async fn read_cache(&self, version: &str) -> Result<String> {
        // An expired entry reads the same as a missing one.
        let cache_info = self.query_cache_info(version).await?;
        if !cache_info.exists || cache_info.is_expired {
            return Err(EsGazeError::CacheEntryNotFound {
                key: cache_info.cache_key,
            });
        }

        let cache_path = self.entry_path(version);
        let data = match tokio::fs::read_to_string(&cache_path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(EsGazeError::CacheEntryNotFound {
                    key: Self::cache_key(version),
                });
            }
            Err(e) => return Err(EsGazeError::io_with_path(e, &cache_path)),
        };
        debug!("Editor cache read: {} ({} bytes)", cache_path.display(), data.len());
        Ok(data)
    }

    async fn write_cache(&self, version: &str, payload: &str) -> Result<()> {
        let cache_path = self.entry_path(version);
        let temp_path = cache_path.with_extension("tmp");

        // Write to a temp file, then rename into place, so a concurrent read
        // never sees a partial entry.
        tokio::fs::write(&temp_path, payload)
            .await
            .map_err(|e| EsGazeError::io_with_path(e, &temp_path))?;

        if let Err(e) = tokio::fs::rename(&temp_path, &cache_path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(EsGazeError::io_with_path(e, &cache_path));
        }

        info!(
            "Editor cache written: {} ({} bytes)",
            cache_path.display(),
            payload.len()
        );
        Ok(())
    }

    async fn invalidate_cache(&self, version: &str) -> Result<()> {
        let cache_path = self.entry_path(version);
        match tokio::fs::remove_file(&cache_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(EsGazeError::io_with_path(e, &cache_path)),
        }
    }

    async fn clear_all_cache(&self) -> Result<()> {
        let mut entries = tokio::fs::read_dir(&self.cache_dir)
            .await
            .map_err(|e| EsGazeError::io_with_path(e, &self.cache_dir))?;

        let mut removed = 0usize;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| EsGazeError::io_with_path(e, &self.cache_dir))?
        {
            let path = entry.path();
            if path.is_dir() || !Self::is_cache_file(&path) {
                continue;
            }
            tokio::fs::remove_file(&path)
                .await
                .map_err(|e| EsGazeError::io_with_path(e, &path))?;
            removed += 1;
        }

        info!("Cleared {} editor cache entries", removed);
        Ok(())
    }

    async fn cache_size(&self) -> Result<u64> {
        let mut entries = tokio::fs::read_dir(&self.cache_dir)
            .await
            .map_err(|e| EsGazeError::io_with_path(e, &self.cache_dir))?;

        let mut total = 0u64;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| EsGazeError::io_with_path(e, &self.cache_dir))?
        {
            let path = entry.path();
            if path.is_dir() || !Self::is_cache_file(&path) {
                continue;
            }
            if let Ok(metadata) = entry.metadata().await {
                total += metadata.len();
            }
        }

        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_cache() -> (TempDir, FsEditorCache) {
        let temp_dir = TempDir::new().unwrap();
        let cache = FsEditorCache::new(temp_dir.path().join("editor-cache")).unwrap();
        (temp_dir, cache)
    }

    #[tokio::test]
    async fn test_query_missing_entry() {
        let (_temp, cache) = create_test_cache();
        let info = cache.query_cache_info("0.52.2").await.unwrap();
        assert!(!info.exists);
        assert!(!info.is_expired);
        assert_eq!(info.size_bytes, 0);
        assert!(info.mod_time.is_none());
        assert!(info.cache_path.ends_with(".cache"));
    }

    #[tokio::test]
    async fn test_write_then_query_and_read() {
        let (_temp, cache) = create_test_cache();
        cache.write_cache("0.52.2", "payload-data").await.unwrap();

        let info = cache.query_cache_info("0.52.2").await.unwrap();
        assert!(info.exists);
        assert!(!info.is_expired);
        assert_eq!(info.size_bytes, 12);
        assert!(info.mod_time.is_some());

        let payload = cache.read_cache("0.52.2").await.unwrap();
        assert_eq!(payload, "payload-data");
    }

    #[tokio::test]
    async fn test_read_missing_entry_is_not_found() {
        let (_temp, cache) = create_test_cache();
        let err = cache.read_cache("0.52.2").await.unwrap_err();
        assert!(matches!(err, EsGazeError::CacheEntryNotFound { .. }));
    }

    #[tokio::test]
    async fn test_read_expired_entry_is_not_found() {
        let (_temp, cache) = create_test_cache();
        cache.write_cache("0.52.2", "old-data").await.unwrap();

        // Age the entry past the 7 day expiry.
        let info = cache.query_cache_info("0.52.2").await.unwrap();
        let stale = std::time::SystemTime::now()
            - (EditorCacheConfig::HOST_EXPIRY + std::time::Duration::from_secs(60 * 60));
        let file = std::fs::File::options()
            .write(true)
            .open(&info.cache_path)
            .unwrap();
        file.set_modified(stale).unwrap();

        let info = cache.query_cache_info("0.52.2").await.unwrap();
        assert!(info.exists);
        assert!(info.is_expired);

        let err = cache.read_cache("0.52.2").await.unwrap_err();
        assert!(matches!(err, EsGazeError::CacheEntryNotFound { .. }));
    }

    #[tokio::test]
    async fn test_overwrite_replaces_payload() {
        let (_temp, cache) = create_test_cache();
        cache.write_cache("0.52.2", "first").await.unwrap();
        cache.write_cache("0.52.2", "second").await.unwrap();
        assert_eq!(cache.read_cache("0.52.2").await.unwrap(), "second");
    }

    #[tokio::test]
    async fn test_invalidate_is_idempotent() {
        let (_temp, cache) = create_test_cache();
        cache.write_cache("0.52.2", "data").await.unwrap();
        cache.invalidate_cache("0.52.2").await.unwrap();
        assert!(!cache.query_cache_info("0.52.2").await.unwrap().exists);
        // Second invalidation of a missing entry succeeds too.
        cache.invalidate_cache("0.52.2").await.unwrap();
    }

    #[tokio::test]
    async fn test_clear_all_removes_only_cache_files() {
        let (_temp, cache) = create_test_cache();
        cache.write_cache("0.52.2", "one").await.unwrap();
        cache.write_cache("0.51.0", "two").await.unwrap();
        std::fs::write(cache.cache_dir().join("notes.txt"), "keep me").unwrap();

        cache.clear_all_cache().await.unwrap();

        assert!(!cache.query_cache_info("0.52.2").await.unwrap().exists);
        assert!(!cache.query_cache_info("0.51.0").await.unwrap().exists);
        assert!(cache.cache_dir().join("notes.txt").exists());
    }

    #[tokio::test]
    async fn test_cache_size_sums_entries() {
        let (_temp, cache) = create_test_cache();
        cache.write_cache("0.52.2", "12345").await.unwrap();
        cache.write_cache("0.51.0", "1234567890").await.unwrap();
        assert_eq!(cache.cache_size().await.unwrap(), 15);
    }

    #[tokio::test]
    async fn test_distinct_versions_use_distinct_keys() {
        let (_temp, cache) = create_test_cache();
        cache.write_cache("0.52.2", "new").await.unwrap();
        cache.write_cache("0.51.0", "old").await.unwrap();
        assert_eq!(cache.read_cache("0.52.2").await.unwrap(), "new");
        assert_eq!(cache.read_cache("0.51.0").await.unwrap(), "old");
    }
}
