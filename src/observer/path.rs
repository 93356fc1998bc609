//! Path-change subscriptions.
//!
//! A [`PathMonitor`] turns OS change notifications into [`PathNotifier::notify`]
//! calls. The notifier only enqueues; resolution happens on the observer's
//! resolver thread, one event at a time.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config;
use crate::error::ObserverError;

/// Work item for the resolver thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResolverCommand {
    /// Resolve and publish. `0` is the initial pass, changes count up from 1.
    Resolve { sequence: u64 },
    Shutdown,
}

/// Handle given to a [`PathMonitor`] for reporting changes.
#[derive(Debug, Clone)]
pub struct PathNotifier {
    tx: Sender<ResolverCommand>,
    sequence: Arc<AtomicU64>,
}

impl PathNotifier {
    pub(crate) fn new(tx: Sender<ResolverCommand>) -> Self {
        Self {
            tx,
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Report one path change. Returns `false` once the observer has stopped.
    pub fn notify(&self) -> bool {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        self.tx.send(ResolverCommand::Resolve { sequence }).is_ok()
    }
}

/// Live subscription; cancels when dropped.
pub struct PathSubscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl PathSubscription {
    pub fn on_cancel(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn cancel(mut self) {
        self.run_cancel();
    }

    fn run_cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for PathSubscription {
    fn drop(&mut self) {
        self.run_cancel();
    }
}

impl std::fmt::Debug for PathSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathSubscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Source of path-change notifications.
pub trait PathMonitor: Send {
    /// Start delivering changes to `notifier` until the returned subscription
    /// is dropped. The initial state must not be reported as a change.
    fn subscribe(&mut self, notifier: PathNotifier) -> Result<PathSubscription, ObserverError>;
}

/// OS interface/address change notifications via `netwatcher`.
///
/// The watch lives on its own thread for the lifetime of the subscription;
/// cancelling wakes that thread, which drops the watch and exits.
///
/// Only interface and address changes are reported. A switch of the preferred
/// route that leaves every address in place (a second uplink taking over the
/// default route, say) produces no callback, so the gateway is not re-resolved
/// until the next address change.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemPathMonitor;

impl PathMonitor for SystemPathMonitor {
    fn subscribe(&mut self, notifier: PathNotifier) -> Result<PathSubscription, ObserverError> {
        let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<(), String>>(1);
        let (cancel_tx, cancel_rx) = mpsc::channel::<()>();

        let watcher = std::thread::Builder::new()
            .name(config::PATH_WATCH_THREAD_NAME.into())
            .spawn(move || {
                let seen_initial = AtomicBool::new(false);
                let watch = netwatcher::watch_interfaces(move |update| {
                    let (added, removed) = (update.diff.added.len(), update.diff.removed.len());
                    if is_initial_update(&seen_initial, added, removed, update.interfaces.len()) {
                        tracing::debug!("Skipping initial interface set ({added} interfaces)");
                        return;
                    }
                    tracing::debug!("Path change: {added} added, {removed} removed");
                    if !notifier.notify() {
                        tracing::debug!("Path change after observer stopped; ignored");
                    }
                });
                let handle = match watch {
                    Ok(handle) => handle,
                    Err(e) => {
                        let _ = ready_tx.send(Err(format!("netwatcher: {e}")));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(()));

                // Returns once the subscription drops its sender.
                let _ = cancel_rx.recv();
                drop(handle);
                tracing::info!("OS path change subscription cancelled");
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(message)) => {
                let _ = watcher.join();
                return Err(ObserverError::PathMonitor(message));
            }
            Err(_) => {
                let _ = watcher.join();
                return Err(ObserverError::PathMonitor("path watch thread exited".into()));
            }
        }

        tracing::info!("Subscribed to OS path changes");
        Ok(PathSubscription::on_cancel(move || {
            drop(cancel_tx);
            if watcher.join().is_err() {
                tracing::error!("Path watch thread panicked");
            }
        }))
    }
}

/// Whether a watch callback is the initial interface set reported on
/// subscription: the first callback, adding every interface and removing none.
/// Marks the initial callback as seen either way.
fn is_initial_update(seen: &AtomicBool, added: usize, removed: usize, total: usize) -> bool {
    let first = !seen.swap(true, Ordering::SeqCst);
    first && removed == 0 && added == total
}

/// Path monitor driven by hand, for simulations and tests.
///
/// Clones share the same subscription slot; [`trigger`](Self::trigger) fires
/// one change on whichever observer is currently subscribed.
#[derive(Debug, Clone, Default)]
pub struct ManualPathMonitor {
    slot: Arc<Mutex<Option<PathNotifier>>>,
}

impl ManualPathMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire one path change. Returns `false` when nothing is subscribed.
    pub fn trigger(&self) -> bool {
        match self.slot.lock().as_ref() {
            Some(notifier) => notifier.notify(),
            None => false,
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.slot.lock().is_some()
    }
}

impl PathMonitor for ManualPathMonitor {
    fn subscribe(&mut self, notifier: PathNotifier) -> Result<PathSubscription, ObserverError> {
        *self.slot.lock() = Some(notifier);
        let slot = Arc::clone(&self.slot);
        Ok(PathSubscription::on_cancel(move || {
            slot.lock().take();
        }))
    }
}
