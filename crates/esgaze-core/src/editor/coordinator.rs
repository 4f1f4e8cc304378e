//! Editor preload coordinator.
//!
//! Owns the load state machine for the heavy editor component and guarantees
//! that no matter how many callers ask for it concurrently, the component is
//! instantiated exactly once per process lifetime. Evidence of successful
//! loads is fanned out to two persistent tiers (host cache and client-local
//! store); both are advisory, so any tier failure degrades to a cache miss
//! and never reaches a caller.

use crate::config::EditorCacheConfig;
use crate::editor::envelope::CacheEnvelope;
use crate::editor::host_cache::HostCacheGateway;
use crate::editor::loader::{EditorLoader, EditorModule, LoadRecord};
use crate::editor::local_store::LocalStore;
use crate::editor::status::EditorCacheStatus;
use crate::error::{EsGazeError, Result};
use crate::task::spawn_logged;
use chrono::Utc;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// The shared in-flight load. Every caller that arrives while a load is
/// running awaits a clone of this future and observes the same settlement.
type SharedLoad = Shared<BoxFuture<'static, std::result::Result<Arc<EditorModule>, Arc<EsGazeError>>>>;

/// Coordinator load state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadState {
    Unloaded,
    Preloading,
    Loaded,
}

/// Mutable coordinator state, guarded by one mutex with short critical
/// sections (never held across an await).
struct LoadCell {
    state: LoadState,
    handle: Option<Arc<EditorModule>>,
    in_flight: Option<SharedLoad>,
    /// Bumped by `clear_cache` so a load that settles afterwards cannot
    /// reinstall a handle the caller just discarded.
    epoch: u64,
}

struct Inner {
    schema_version: String,
    host: Arc<dyn HostCacheGateway>,
    local: Arc<dyn LocalStore>,
    loader: Arc<dyn EditorLoader>,
    cell: Mutex<LoadCell>,
}

/// Outcome of consulting the state machine: either the memory tier already
/// has the handle, or there is a (possibly fresh) in-flight load to await.
enum LoadTicket {
    Ready(Arc<EditorModule>),
    Pending(SharedLoad),
}

/// Single-flight preload coordinator for the editor component.
///
/// One instance per process; collaborators are injected so tests construct
/// fresh coordinators with scripted tiers and loaders.
#[derive(Clone)]
pub struct EditorPreloader {
    inner: Arc<Inner>,
}

impl EditorPreloader {
    pub fn new(
        schema_version: impl Into<String>,
        host: Arc<dyn HostCacheGateway>,
        local: Arc<dyn LocalStore>,
        loader: Arc<dyn EditorLoader>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                schema_version: schema_version.into(),
                host,
                local,
                loader,
                cell: Mutex::new(LoadCell {
                    state: LoadState::Unloaded,
                    handle: None,
                    in_flight: None,
                    epoch: 0,
                }),
            }),
        }
    }

    /// Editor schema version this coordinator caches under.
    pub fn schema_version(&self) -> &str {
        &self.inner.schema_version
    }

    /// Trigger a load if one is not already in flight or complete, and wait
    /// for the result. Concurrent callers share a single load.
    pub async fn preload(&self) -> Result<Arc<EditorModule>> {
        match self.ticket()? {
            LoadTicket::Ready(handle) => Ok(handle),
            LoadTicket::Pending(load) => load.await.map_err(|e| EsGazeError::EditorLoadFailed {
                message: e.to_string(),
            }),
        }
    }

    /// Access path for consumers that need the editor right now. Identical to
    /// [`preload`](Self::preload); after one success in this process it always
    /// resolves immediately from memory.
    pub async fn get_or_load(&self) -> Result<Arc<EditorModule>> {
        self.preload().await
    }

    /// Fire-and-forget preload. Starts a load only when nothing is loaded or
    /// in flight; failures are logged, never surfaced.
    pub fn warm(&self) {
        match self.ticket() {
            Ok(LoadTicket::Ready(_)) => {}
            Ok(LoadTicket::Pending(load)) => {
                spawn_logged("editor warm-up", async move {
                    load.await
                        .map(|_| ())
                        .map_err(|e| EsGazeError::EditorLoadFailed {
                            message: e.to_string(),
                        })
                });
            }
            Err(e) => warn!("Editor warm-up skipped: {}", e),
        }
    }

    /// Whether the editor module is loaded and held in memory.
    pub fn is_loaded(&self) -> bool {
        self.inner
            .cell
            .lock()
            .map(|cell| cell.state == LoadState::Loaded)
            .unwrap_or(false)
    }

    /// Whether a load is currently in flight.
    pub fn is_preloading(&self) -> bool {
        self.inner
            .cell
            .lock()
            .map(|cell| cell.state == LoadState::Preloading)
            .unwrap_or(false)
    }

    /// Reset the memory tier and best-effort clear both persistent tiers.
    ///
    /// Each removal is attempted independently; failures are logged and never
    /// surfaced, so this always succeeds from the caller's perspective.
    pub async fn clear_cache(&self) {
        if let Ok(mut cell) = self.inner.cell.lock() {
            cell.state = LoadState::Unloaded;
            cell.handle = None;
            cell.in_flight = None;
            cell.epoch += 1;
        }

        if let Err(e) = self.inner.local.remove(&self.local_cache_key()) {
            warn!("Local store clear failed (ignored): {}", e);
        }

        if let Err(e) = self.inner.host.clear_all_cache().await {
            warn!("Host cache clear failed (ignored): {}", e);
        }

        info!("Editor caches cleared");
    }

    /// Assemble a point-in-time snapshot of coordinator and tier state.
    ///
    /// Read-only and infallible: an unavailable tier reports "no cache".
    pub async fn cache_status(&self) -> EditorCacheStatus {
        let (is_loaded, is_preloading, has_memory_handle) = self
            .inner
            .cell
            .lock()
            .map(|cell| {
                (
                    cell.state == LoadState::Loaded,
                    cell.state == LoadState::Preloading,
                    cell.handle.is_some(),
                )
            })
            .unwrap_or((false, false, false));

        let mut status = EditorCacheStatus::cold(is_loaded, is_preloading, has_memory_handle);
        let now = Utc::now();

        match self.inner.local.get(&self.local_cache_key()) {
            Ok(Some(raw)) => {
                if let Some(envelope) =
                    CacheEnvelope::parse_valid(&raw, &self.inner.schema_version, now)
                {
                    status.has_local_cache = true;
                    status.local_cache_age_millis = Some(envelope.age_millis(now));
                }
            }
            Ok(None) => {}
            Err(e) => debug!("Local store unavailable for status (ignored): {}", e),
        }

        match self.inner.host.query_cache_info(&self.inner.schema_version).await {
            Ok(cache_info) => {
                status.has_host_cache = cache_info.exists;
                status.host_cache_expired = cache_info.is_expired;
                status.host_cache_size_bytes = cache_info.size_bytes;
                status.host_cache_path = Some(cache_info.cache_path);
            }
            Err(e) => debug!("Host cache unavailable for status (ignored): {}", e),
        }

        status
    }

    fn local_cache_key(&self) -> String {
        local_cache_key(&self.inner.schema_version)
    }

    /// Consult the state machine, starting a fresh load when state is
    /// `Unloaded`. This is the only place the `Unloaded -> Preloading`
    /// transition happens.
    fn ticket(&self) -> Result<LoadTicket> {
        let mut cell = lock_cell(&self.inner)?;

        if let Some(handle) = &cell.handle {
            return Ok(LoadTicket::Ready(Arc::clone(handle)));
        }
        if let Some(load) = &cell.in_flight {
            return Ok(LoadTicket::Pending(load.clone()));
        }

        cell.state = LoadState::Preloading;
        let load = run_load(Arc::clone(&self.inner), cell.epoch)
            .boxed()
            .shared();
        cell.in_flight = Some(load.clone());
        debug!("Starting editor preload (version {})", self.inner.schema_version);
        Ok(LoadTicket::Pending(load))
    }
}

fn local_cache_key(schema_version: &str) -> String {
    format!("{}.{}", EditorCacheConfig::LOCAL_KEY_PREFIX, schema_version)
}

fn lock_cell(inner: &Inner) -> Result<MutexGuard<'_, LoadCell>> {
    inner.cell.lock().map_err(|e| EsGazeError::Other(format!(
        "Failed to lock preloader state: {}",
        e
    )))
}

/// The real load pipeline. Runs at most once per `Unloaded -> Preloading`
/// transition; every concurrent caller awaits this same future.
async fn run_load(
    inner: Arc<Inner>,
    epoch: u64,
) -> std::result::Result<Arc<EditorModule>, Arc<EsGazeError>> {
    probe_tiers(&inner).await;

    match inner.loader.load().await {
        Ok(module) => {
            let handle = Arc::new(module);
            let installed = match inner.cell.lock() {
                Ok(mut cell) if cell.epoch == epoch => {
                    cell.state = LoadState::Loaded;
                    cell.handle = Some(Arc::clone(&handle));
                    cell.in_flight = None;
                    true
                }
                Ok(_) => false,
                Err(e) => {
                    warn!("Preloader state lock poisoned after load: {}", e);
                    false
                }
            };

            if installed {
                info!(
                    "Editor loaded: version={} size={} bytes",
                    handle.version, handle.size_bytes
                );
                write_back(&inner, &handle);
            } else {
                debug!("Editor load settled after cache clear; result not retained");
            }
            Ok(handle)
        }
        Err(e) => {
            warn!("Editor load failed: {}", e);
            if let Ok(mut cell) = inner.cell.lock() {
                if cell.epoch == epoch {
                    cell.state = LoadState::Unloaded;
                    cell.handle = None;
                    cell.in_flight = None;
                }
            }
            Err(Arc::new(e))
        }
    }
}

/// Advisory warm/cold probe against both persistent tiers.
///
/// The cached evidence is not the cached object: a hit here only tells us
/// the editor loaded before, which is logged for UX messaging. The real
/// instantiation always follows.
async fn probe_tiers(inner: &Inner) {
    let host_warm = match inner.host.query_cache_info(&inner.schema_version).await {
        Ok(cache_info) => cache_info.exists && !cache_info.is_expired,
        Err(e) => {
            warn!("Host cache query failed (ignored): {}", e);
            false
        }
    };

    if host_warm {
        info!("Editor previously cached on host; proceeding with full load");
        return;
    }

    let local_warm = match inner.local.get(&local_cache_key(&inner.schema_version)) {
        Ok(Some(raw)) => {
            CacheEnvelope::parse_valid(&raw, &inner.schema_version, Utc::now()).is_some()
        }
        Ok(None) => false,
        Err(e) => {
            warn!("Local store read failed (ignored): {}", e);
            false
        }
    };

    if local_warm {
        info!("Editor previously cached on this client; proceeding with full load");
    } else {
        debug!("Editor cache cold; first load for version {}", inner.schema_version);
    }
}

/// Fan out load evidence to both persistent tiers, each independently
/// fire-and-forget. The in-memory handle is already valid, so a write-back
/// failure must not fail the load.
fn write_back(inner: &Arc<Inner>, handle: &Arc<EditorModule>) {
    let record = LoadRecord::from_module(handle);
    let payload = match serde_json::to_string(&record) {
        Ok(p) => p,
        Err(e) => {
            warn!("Load record serialization failed; skipping write-back: {}", e);
            return;
        }
    };
    let envelope = CacheEnvelope::new(&inner.schema_version, payload);
    let raw = match envelope.to_json() {
        Ok(r) => r,
        Err(e) => {
            warn!("Envelope serialization failed; skipping write-back: {}", e);
            return;
        }
    };

    {
        let host = Arc::clone(&inner.host);
        let version = inner.schema_version.clone();
        let raw = raw.clone();
        spawn_logged("host cache write-back", async move {
            host.write_cache(&version, &raw).await
        });
    }
    {
        let local = Arc::clone(&inner.local);
        let key = local_cache_key(&inner.schema_version);
        spawn_logged("local store write-back", async move { local.set(&key, &raw) });
    }
}
