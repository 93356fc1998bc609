//! Delivery contexts: where finished snapshots are handed to the consumer.
//!
//! The resolver thread never calls the consumer directly; it dispatches a
//! publish job to a [`DeliveryContext`]. Jobs run one at a time, in dispatch
//! order.

use std::sync::mpsc::{self, Sender};
use std::thread::JoinHandle;

use parking_lot::Mutex;

use crate::config;
use crate::error::ObserverError;

/// A unit of work run on the delivery context.
pub type DeliveryJob = Box<dyn FnOnce() + Send + 'static>;

/// Runs publish jobs serially, in dispatch order.
pub trait DeliveryContext: Send + Sync {
    fn dispatch(&self, job: DeliveryJob);
}

/// Runs each job immediately on the dispatching (resolver) thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineDelivery;

impl DeliveryContext for InlineDelivery {
    fn dispatch(&self, job: DeliveryJob) {
        job();
    }
}

/// Dedicated delivery thread draining a FIFO queue.
///
/// Stands in for a UI main thread: every consumer callback runs on this one
/// thread, so the consumer never sees concurrent publishes.
pub struct DeliveryQueue {
    tx: Mutex<Option<Sender<DeliveryJob>>>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl DeliveryQueue {
    pub fn spawn() -> Result<Self, ObserverError> {
        let (tx, rx) = mpsc::channel::<DeliveryJob>();
        let thread = std::thread::Builder::new()
            .name(config::DELIVERY_THREAD_NAME.into())
            .spawn(move || {
                for job in rx {
                    job();
                }
                tracing::debug!("Delivery queue drained");
            })?;

        Ok(Self {
            tx: Mutex::new(Some(tx)),
            thread: Mutex::new(Some(thread)),
        })
    }

    /// Stop accepting jobs, run the ones already queued, and join the thread.
    pub fn shutdown(&self) {
        self.tx.lock().take();
        if let Some(thread) = self.thread.lock().take() {
            if thread.thread().id() == std::thread::current().id() {
                return;
            }
            if thread.join().is_err() {
                tracing::error!("Delivery thread panicked");
            }
        }
    }
}

impl DeliveryContext for DeliveryQueue {
    fn dispatch(&self, job: DeliveryJob) {
        match self.tx.lock().as_ref() {
            Some(tx) => {
                if tx.send(job).is_err() {
                    tracing::warn!("Delivery thread gone; snapshot dropped");
                }
            }
            None => tracing::debug!("Delivery queue shut down; snapshot dropped"),
        }
    }
}

impl Drop for DeliveryQueue {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for DeliveryQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryQueue")
            .field("open", &self.tx.lock().is_some())
            .finish()
    }
}
