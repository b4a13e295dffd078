//! TTL Pruner Task
//!
//! Background task that periodically removes expired cache entries, so keys
//! nobody reads again do not hold memory until their next access.

use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::Cache;

// == Background Pruner ==
/// Handle to a running prune loop.
///
/// Dropping the handle cancels the loop as well; `stop` additionally waits
/// for it to finish.
#[derive(Debug)]
pub struct BackgroundPruner {
    handle: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
}

impl BackgroundPruner {
    /// Spawns a task on the current tokio runtime that prunes `cache`.
    ///
    /// The task sleeps for `interval` between passes. A pass that has
    /// started always runs to completion; cancellation only prevents the
    /// next one.
    ///
    /// # Arguments
    /// * `cache` - Shared reference to the cache
    /// * `interval` - Time between prune passes
    ///
    /// # Example
    /// ```ignore
    /// let cache = Arc::new(Cache::new(1000, Some(ttl), EvictionPolicyKind::Lru)?);
    /// let pruner = BackgroundPruner::spawn(cache.clone(), Duration::from_secs(1));
    /// // Later, during shutdown:
    /// pruner.stop().await;
    /// ```
    pub fn spawn<K, V>(cache: Arc<Cache<K, V>>, interval: Duration) -> Self
    where
        K: Hash + Eq + Clone + Send + 'static,
        V: Clone + Send + 'static,
    {
        let (shutdown, mut cancelled) = watch::channel(false);

        let handle = tokio::spawn(async move {
            info!(
                "Starting TTL pruner with interval of {} ms",
                interval.as_millis()
            );

            loop {
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    // Fires on stop() and when the handle is dropped
                    _ = cancelled.changed() => break,
                }

                // Sync listeners run on the pruning thread; keep them off the runtime
                let pass = Arc::clone(&cache);
                match tokio::task::spawn_blocking(move || pass.prune_now()).await {
                    Ok(removed) if removed > 0 => {
                        debug!("TTL prune: removed {} expired entries", removed);
                    }
                    Ok(_) => {}
                    Err(err) => warn!("TTL prune pass failed: {}", err),
                }
            }

            info!("TTL pruner stopped");
        });

        Self { handle, shutdown }
    }

    /// Spawns a pruner if the cache was configured with a prune interval.
    pub fn from_config<K, V>(cache: Arc<Cache<K, V>>) -> Option<Self>
    where
        K: Hash + Eq + Clone + Send + 'static,
        V: Clone + Send + 'static,
    {
        let interval = cache.config().prune_interval?;
        Some(Self::spawn(cache, interval))
    }

    // == Stop ==
    /// Cancels the loop and waits for it to exit.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(err) = self.handle.await {
            warn!("TTL pruner ended abnormally: {}", err);
        }
    }

    /// True once the loop has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
