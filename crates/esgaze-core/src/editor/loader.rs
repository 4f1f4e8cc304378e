//! Editor module loader seam.
//!
//! Instantiating the editor component is the expensive operation the whole
//! preload subsystem exists to gate: the asset bundle has to be walked,
//! digested, and handed to the webview exactly once per process. The loader
//! is a trait so the coordinator can be exercised with fakes.

use crate::error::{EsGazeError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// The resolved editor component handle.
///
/// Held in memory for the process lifetime once loaded; never serialized.
/// Only the evidence of a successful load (see `LoadRecord`) is persisted.
#[derive(Debug, Clone)]
pub struct EditorModule {
    /// Editor schema version this module was built from.
    pub version: String,
    /// Total size of the asset bundle in bytes.
    pub size_bytes: u64,
    /// Content digest over the bundle (hex sha256).
    pub digest: String,
    /// When the module finished loading.
    pub loaded_at: DateTime<Utc>,
}

/// Persistable evidence of a successful load. This is what the cache tiers
/// carry as the envelope payload; the module itself cannot be serialized.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadRecord {
    pub version: String,
    pub size_bytes: u64,
    pub digest: String,
    pub loaded_at_epoch_millis: i64,
}

impl LoadRecord {
    pub fn from_module(module: &EditorModule) -> Self {
        Self {
            version: module.version.clone(),
            size_bytes: module.size_bytes,
            digest: module.digest.clone(),
            loaded_at_epoch_millis: module.loaded_at.timestamp_millis(),
        }
    }
}

/// The expensive instantiation behind the preload coordinator.
#[async_trait]
pub trait EditorLoader: Send + Sync {
    async fn load(&self) -> Result<EditorModule>;
}

/// Loader backed by the bundled editor asset directory.
pub struct AssetDirLoader {
    assets_dir: PathBuf,
    version: String,
}

impl AssetDirLoader {
    pub fn new(assets_dir: impl Into<PathBuf>, version: impl Into<String>) -> Self {
        Self {
            assets_dir: assets_dir.into(),
            version: version.into(),
        }
    }
}

#[async_trait]
impl EditorLoader for AssetDirLoader {
    async fn load(&self) -> Result<EditorModule> {
        let assets_dir = self.assets_dir.clone();
        let version = self.version.clone();

        // Walking and hashing the bundle is CPU/IO bound; keep it off the
        // async executor.
        let (size_bytes, digest) = tokio::task::spawn_blocking(move || {
            digest_asset_dir(&assets_dir)
        })
        .await
        .map_err(|e| EsGazeError::Other(format!("Asset digest task panicked: {}", e)))??;

        debug!(
            "Editor assets loaded: version={} size={} digest={}",
            version, size_bytes, digest
        );

        Ok(EditorModule {
            version,
            size_bytes,
            digest,
            loaded_at: Utc::now(),
        })
    }
}

/// Walk the asset directory in stable order, hashing paths and contents.
fn digest_asset_dir(assets_dir: &Path) -> Result<(u64, String)> {
    if !assets_dir.is_dir() {
        return Err(EsGazeError::Io {
            message: "Editor asset directory does not exist".into(),
            path: Some(assets_dir.to_path_buf()),
            source: None,
        });
    }

    let mut hasher = Sha256::new();
    let mut total_bytes = 0u64;

    for entry in WalkDir::new(assets_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| EsGazeError::Io {
            message: format!("Failed to walk asset directory: {}", e),
            path: Some(assets_dir.to_path_buf()),
            source: e.into_io_error(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let data = std::fs::read(entry.path())
            .map_err(|e| EsGazeError::io_with_path(e, entry.path()))?;
        hasher.update(entry.path().to_string_lossy().as_bytes());
        hasher.update(&data);
        total_bytes += data.len() as u64;
    }

    Ok((total_bytes, hex::encode(hasher.finalize())))
}
