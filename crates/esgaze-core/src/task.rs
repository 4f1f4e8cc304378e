//! Detached background task helper.
//!
//! Several coordinator paths are fire-and-forget: cache write-backs, warm-up
//! preloads, best-effort clears. Those tasks must never propagate a failure
//! to any caller, so they are spawned through this helper which logs the
//! outcome and swallows the error.

use crate::error::Result;
use std::future::Future;
use tracing::warn;

/// Spawn a background task whose failure is logged, never surfaced.
///
/// `context` names the operation in the log line.
pub fn spawn_logged<F>(context: &'static str, fut: F)
where
    F: Future<Output = Result<()>> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = fut.await {
            warn!("{} failed (ignored): {}", context, e);
        }
    });
}
