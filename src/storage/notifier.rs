//! Background Expiration Notifier
//!
//! This module implements the task that tells the application "the cache
//! has expired". Once per TTL period it invokes the callback registered
//! with [`Cache::set_expired_callback`](crate::Cache::set_expired_callback).
//!
//! ## What It Does Not Do
//!
//! The notifier never touches the entries. Expired entries stay readable
//! until someone calls [`Cache::delete_expired`](crate::Cache::delete_expired),
//! typically from inside the callback itself.
//!
//! ## Design
//!
//! ```text
//!   Running ──── stop() / close() / drop(Cache) ────> Stopped
//!      │
//!      └── every `ttl`: clone callback out of its slot, release the lock, call it
//! ```
//!
//! The task only holds the callback slot, never the cache, so it cannot keep
//! a dropped cache alive. Shutdown goes through a `watch` channel: sending
//! never blocks, even when the task has already exited.
//!
//! By default a dedicated thread drives the loop on a small current-thread
//! runtime, so the notifier lives exactly as long as its cache. A notifier
//! started on a caller-supplied runtime handle ends when that runtime shuts
//! down; this is logged as a warning.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::runtime::{Builder, Handle};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, trace, warn};

/// A zero-argument procedure invoked on every notifier tick.
pub type ExpiredCallback = Arc<dyn Fn() + Send + Sync + 'static>;

/// Holds the registered callback. Shared between the cache and its notifier.
#[derive(Default)]
pub(crate) struct CallbackSlot {
    callback: RwLock<Option<ExpiredCallback>>,
    fired: AtomicU64,
}

impl fmt::Debug for CallbackSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackSlot")
            .field("registered", &self.is_registered())
            .field("fired", &self.fired())
            .finish()
    }
}

impl CallbackSlot {
    pub(crate) fn set(&self, callback: Option<ExpiredCallback>) {
        *self
            .callback
            .write()
            .unwrap_or_else(PoisonError::into_inner) = callback;
    }

    pub(crate) fn is_registered(&self) -> bool {
        self.callback
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Invokes the callback, if any. Returns `true` if one ran.
    ///
    /// The slot lock is released before the call so the callback may
    /// re-register itself or replace the callback.
    pub(crate) fn fire(&self) -> bool {
        let callback = self
            .callback
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        match callback {
            Some(callback) => {
                callback();
                self.fired.fetch_add(1, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    pub(crate) fn fired(&self) -> u64 {
        self.fired.load(Ordering::Relaxed)
    }
}

/// Where the notifier loop is running.
#[derive(Debug)]
enum Task {
    Tokio(JoinHandle<()>),
    Thread {
        handle: std::thread::JoinHandle<()>,
        /// Completed (or dropped) when the thread is about to exit
        exited: oneshot::Receiver<()>,
    },
}

impl Task {
    fn is_finished(&self) -> bool {
        match self {
            Task::Tokio(handle) => handle.is_finished(),
            Task::Thread { handle, .. } => handle.is_finished(),
        }
    }
}

/// A handle to the running notifier.
///
/// When this handle is dropped, the notifier is stopped.
#[derive(Debug)]
pub struct Notifier {
    /// Sender to signal shutdown
    shutdown_tx: watch::Sender<bool>,
    /// The background loop, taken by `join`
    task: Option<Task>,
    /// Tick period
    interval: Duration,
    /// Label for log events
    name: String,
}

impl Notifier {
    /// Starts a notifier on the given runtime.
    ///
    /// The loop stops when the runtime shuts down, even if no stop was
    /// requested.
    pub(crate) fn start_on(
        interval: Duration,
        slot: Arc<CallbackSlot>,
        name: Option<String>,
        handle: &Handle,
    ) -> Self {
        let name = name.unwrap_or_else(|| "cache".to_string());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = handle.spawn(notifier_loop(interval, slot, name.clone(), shutdown_rx));

        info!(cache = %name, interval_ms = interval.as_millis(), "Expiration notifier started");

        Self {
            shutdown_tx,
            task: Some(Task::Tokio(task)),
            interval,
            name,
        }
    }

    /// Starts a notifier on a dedicated thread.
    ///
    /// Independent of any runtime the caller may be inside. Returns `None`
    /// only if the thread or its runtime could not be created.
    pub(crate) fn start(
        interval: Duration,
        slot: Arc<CallbackSlot>,
        name: Option<String>,
    ) -> Option<Self> {
        let name = name.unwrap_or_else(|| "cache".to_string());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let runtime = match Builder::new_current_thread().enable_time().build() {
            Ok(runtime) => runtime,
            Err(e) => {
                error!(cache = %name, error = %e, "Failed to build notifier runtime");
                return None;
            }
        };

        let loop_name = name.clone();
        let (exited_tx, exited) = oneshot::channel();
        let spawned = std::thread::Builder::new()
            .name(format!("{}-notifier", name))
            .spawn(move || {
                runtime.block_on(notifier_loop(interval, slot, loop_name, shutdown_rx));
                let _ = exited_tx.send(());
            });

        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                error!(cache = %name, error = %e, "Failed to spawn notifier thread");
                return None;
            }
        };

        info!(
            cache = %name,
            interval_ms = interval.as_millis(),
            "Expiration notifier started on dedicated thread"
        );

        Some(Self {
            shutdown_tx,
            task: Some(Task::Thread { handle, exited }),
            interval,
            name,
        })
    }

    /// Stops the notifier.
    ///
    /// A callback that is already running completes; no further ticks fire.
    /// Calling this more than once is harmless. This is called automatically
    /// when the handle is dropped.
    pub fn stop(&self) {
        if !self.shutdown_tx.send_replace(true) {
            info!(cache = %self.name, "Expiration notifier stopped");
        }
    }

    /// Returns `true` while the loop is alive and no stop was requested.
    pub fn is_running(&self) -> bool {
        !*self.shutdown_tx.borrow()
            && self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Returns the tick period.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Stops the notifier and waits for the loop to exit.
    ///
    /// For a notifier on its own thread this needs no Tokio runtime and may
    /// be awaited from any executor.
    pub async fn join(mut self) {
        self.stop();

        match self.task.take() {
            Some(Task::Tokio(handle)) => {
                if let Err(e) = handle.await {
                    debug!(cache = %self.name, error = %e, "Notifier task ended abnormally");
                }
            }
            Some(Task::Thread { exited, .. }) => {
                // A dropped sender means the thread unwound without finishing
                if exited.await.is_err() {
                    debug!(cache = %self.name, "Notifier thread ended abnormally");
                }
            }
            None => {}
        }
    }
}

impl Drop for Notifier {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Warns when the loop is torn down without a stop request, which happens
/// when the runtime it was spawned on shuts down.
struct LoopGuard {
    name: String,
    shutdown_rx: watch::Receiver<bool>,
}

impl Drop for LoopGuard {
    fn drop(&mut self) {
        if !*self.shutdown_rx.borrow() && !std::thread::panicking() {
            warn!(
                cache = %self.name,
                "Expiration notifier ended without a stop request; its runtime was shut down"
            );
        }
    }
}

/// The main notifier loop.
async fn notifier_loop(
    interval: Duration,
    slot: Arc<CallbackSlot>,
    name: String,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let _guard = LoopGuard {
        name: name.clone(),
        shutdown_rx: shutdown_rx.clone(),
    };

    // First tick one full period after start
    let mut ticker = time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    debug!(cache = %name, "Expiration notifier received shutdown signal");
                    return;
                }
            }
            _ = ticker.tick() => {
                let fired = slot.fire();
                trace!(cache = %name, fired, "Expiration tick");
            }
        }
    }
}
