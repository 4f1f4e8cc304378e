//! ElasticGaze Core - Headless backend for the ElasticGaze desktop client.
//!
//! This crate provides the editor preload coordinator and its cache tiers.
//! It can be used programmatically without any HTTP/RPC layer.
//!
//! # Example
//!
//! ```rust,ignore
//! use esgaze_core::EditorService;
//!
//! #[tokio::main]
//! async fn main() -> esgaze_core::Result<()> {
//!     let service = EditorService::open("/path/to/app-data", "/path/to/editor-assets")?;
//!
//!     // Kick off a background preload at startup
//!     service.preloader().warm();
//!
//!     // Later, when the editor view opens
//!     let module = service.preloader().get_or_load().await?;
//!     println!("Editor {} ready ({} bytes)", module.version, module.size_bytes);
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod editor;
pub mod error;
pub mod task;

// Re-export commonly used types
pub use config::{AppConfig, EditorCacheConfig, PathsConfig};
pub use editor::{
    AssetDirLoader, CacheEnvelope, EditorCacheStatus, EditorLoader, EditorModule,
    EditorPreloader, FsEditorCache, HostCacheGateway, HostCacheInfo, LoadRecord, LocalStore,
    SqliteLocalStore,
};
pub use error::{EsGazeError, Result};

use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Main entry point wiring the editor subsystem over an application data
/// directory.
///
/// Owns the host cache gateway alongside the preload coordinator so the RPC
/// layer can expose raw cache operations next to the preload operations.
pub struct EditorService {
    data_dir: PathBuf,
    host: Arc<dyn HostCacheGateway>,
    preloader: EditorPreloader,
}

impl EditorService {
    /// Open the service under `data_dir`, creating the cache directory and
    /// local store database as needed. `assets_dir` is the bundled editor
    /// asset directory the loader digests.
    pub fn open(data_dir: impl Into<PathBuf>, assets_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();

        let host: Arc<dyn HostCacheGateway> = Arc::new(FsEditorCache::new(
            data_dir.join(PathsConfig::EDITOR_CACHE_DIR_NAME),
        )?);
        let local: Arc<dyn LocalStore> = Arc::new(SqliteLocalStore::new(
            data_dir.join(PathsConfig::LOCAL_STORE_FILENAME),
        )?);
        let loader: Arc<dyn EditorLoader> = Arc::new(AssetDirLoader::new(
            assets_dir.into(),
            AppConfig::EDITOR_ASSET_VERSION,
        ));

        let preloader = EditorPreloader::new(
            AppConfig::EDITOR_ASSET_VERSION,
            Arc::clone(&host),
            local,
            loader,
        );

        Ok(Self {
            data_dir,
            host,
            preloader,
        })
    }

    /// The preload coordinator.
    pub fn preloader(&self) -> &EditorPreloader {
        &self.preloader
    }

    /// Direct access to the host cache tier, for the raw cache RPC methods.
    pub fn host_cache(&self) -> &Arc<dyn HostCacheGateway> {
        &self.host
    }

    /// The application data directory this service was opened under.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
