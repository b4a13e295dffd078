//! Notification Dispatcher
//!
//! Moves detached entries from the store's critical section to the listener.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{unbounded, Sender};
use parking_lot::RwLock;
use tracing::{debug, error, warn};

use super::{ListenerMode, Removal, RemovalListener};
use crate::error::{CacheError, Result};

type ListenerSlot<K, V> = Arc<RwLock<Option<Arc<dyn RemovalListener<K, V>>>>>;

// == Dispatcher ==
/// Routes removal batches to the installed listener.
///
/// The store calls [`Dispatcher::hand_off`] while it still holds its lock and
/// [`Dispatcher::deliver`] once the lock is released. In async mode the batch
/// is queued during `hand_off`, which keeps notifications in removal order;
/// in sync mode it is returned and delivered on the calling thread.
pub(crate) struct Dispatcher<K, V> {
    mode: ListenerMode,
    listener: ListenerSlot<K, V>,
    failures: Arc<AtomicU64>,
    queue: Option<Sender<Vec<Removal<K, V>>>>,
}

impl<K, V> Dispatcher<K, V>
where
    K: Send + 'static,
    V: Send + 'static,
{
    // == Constructor ==
    /// Creates a dispatcher, starting the notification thread in async mode.
    pub fn new(mode: ListenerMode) -> Result<Self> {
        let listener: ListenerSlot<K, V> = Arc::new(RwLock::new(None));
        let failures = Arc::new(AtomicU64::new(0));

        let queue = match mode {
            ListenerMode::Sync => None,
            ListenerMode::Async => {
                let (tx, rx) = unbounded::<Vec<Removal<K, V>>>();
                let slot = Arc::clone(&listener);
                let failed = Arc::clone(&failures);
                thread::Builder::new()
                    .name("mini-cache-notify".to_string())
                    .spawn(move || {
                        for batch in rx {
                            notify_all(&slot, &failed, batch);
                        }
                        debug!("Notification thread stopped");
                    })
                    .map_err(|e| {
                        CacheError::config(format!("failed to start notification thread: {e}"))
                    })?;
                Some(tx)
            }
        };

        Ok(Self {
            mode,
            listener,
            failures,
            queue,
        })
    }

    pub fn set_listener(&self, listener: Arc<dyn RemovalListener<K, V>>) {
        *self.listener.write() = Some(listener);
    }

    pub fn clear_listener(&self) {
        *self.listener.write() = None;
    }

    pub fn has_listener(&self) -> bool {
        self.listener.read().is_some()
    }

    /// Number of listener calls that panicked so far.
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    // == Hand Off ==
    /// Called with the store lock held. Never runs listener code.
    ///
    /// Returns the batch still owed to the listener (sync mode), or an empty
    /// batch once it has been queued (async mode).
    pub fn hand_off(&self, batch: Vec<Removal<K, V>>) -> Vec<Removal<K, V>> {
        if batch.is_empty() || !self.has_listener() {
            return Vec::new();
        }
        match &self.queue {
            Some(queue) => {
                if let Err(err) = queue.send(batch) {
                    warn!(
                        dropped = err.0.len(),
                        "Notification thread is gone, dropping removal notifications"
                    );
                }
                Vec::new()
            }
            None => batch,
        }
    }

    // == Deliver ==
    /// Runs the listener for a batch returned by [`Dispatcher::hand_off`].
    ///
    /// Must be called without the store lock held.
    pub fn deliver(&self, batch: Vec<Removal<K, V>>) {
        if batch.is_empty() {
            return;
        }
        notify_all(&self.listener, &self.failures, batch);
    }
}

impl<K, V> std::fmt::Debug for Dispatcher<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("mode", &self.mode)
            .field("has_listener", &self.listener.read().is_some())
            .field("failures", &self.failures.load(Ordering::Relaxed))
            .finish()
    }
}

fn notify_all<K, V>(slot: &ListenerSlot<K, V>, failures: &AtomicU64, batch: Vec<Removal<K, V>>) {
    // Clone the Arc so the listener runs without the slot lock held
    let Some(listener) = slot.read().clone() else {
        return;
    };

    for Removal { key, value, cause } in batch {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            listener.on_removed(key, value, cause)
        }));
        if let Err(payload) = outcome {
            failures.fetch_add(1, Ordering::Relaxed);
            let err = CacheError::Listener(panic_message(payload.as_ref()));
            error!(%cause, error = %err, "Removal listener panicked");
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
