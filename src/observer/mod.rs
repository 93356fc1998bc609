//! Network status observer lifecycle.
//!
//! `NetworkStatusObserver` owns one monitoring session at a time:
//! 1. A resolver thread pulls [`ResolverCommand`]s from a channel and runs one
//!    full [`StatusSampler`] pass per command, strictly in order.
//! 2. The initial pass is queued before subscribing, so it is always delivered
//!    first; every path change queues one more pass.
//! 3. Finished snapshots are published through the [`DeliveryContext`]. The
//!    publish gate re-checks the monitoring flag under a lock, and `stop` takes
//!    that lock, so nothing reaches the consumer once `stop` has returned.

pub mod delivery;
pub mod path;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::Mutex;

use crate::config::{self, ObserverConfig};
use crate::core::{NetworkStatusSnapshot, StatusSampler};
use crate::error::ObserverError;

pub use delivery::{DeliveryContext, DeliveryJob, DeliveryQueue, InlineDelivery};
pub use path::{ManualPathMonitor, PathMonitor, PathNotifier, PathSubscription, SystemPathMonitor};

use path::ResolverCommand;

type UpdateCallback = Box<dyn FnMut(NetworkStatusSnapshot) + Send + 'static>;

/// Guards consumer delivery for one monitoring session.
struct Publisher {
    monitoring: AtomicBool,
    on_update: Mutex<UpdateCallback>,
    latest: Arc<Mutex<Option<NetworkStatusSnapshot>>>,
}

impl Publisher {
    fn is_monitoring(&self) -> bool {
        self.monitoring.load(Ordering::SeqCst)
    }

    fn publish(&self, snapshot: NetworkStatusSnapshot) {
        let mut on_update = self.on_update.lock();
        if !self.is_monitoring() {
            tracing::debug!("Observer stopped; discarding resolved snapshot");
            return;
        }
        *self.latest.lock() = Some(snapshot.clone());
        let callback: &mut UpdateCallback = &mut on_update;
        callback(snapshot);
    }

    /// Close the gate. Waits for a delivery already in progress.
    fn close(&self) {
        let _gate = self.on_update.lock();
        self.monitoring.store(false, Ordering::SeqCst);
    }
}

/// One `start`..`stop` span.
struct Session {
    publisher: Arc<Publisher>,
    commands: Sender<ResolverCommand>,
    subscription: Option<PathSubscription>,
    resolver_thread: JoinHandle<()>,
}

/// Tracks wired link state, interface addresses and default gateway, and
/// delivers a fresh [`NetworkStatusSnapshot`] on start and on every path change.
pub struct NetworkStatusObserver {
    sampler: Arc<StatusSampler>,
    path_monitor: Box<dyn PathMonitor>,
    delivery: Arc<dyn DeliveryContext>,
    latest: Arc<Mutex<Option<NetworkStatusSnapshot>>>,
    session: Option<Session>,
    /// Resolver of the last stopped session; may still be finishing a pass.
    retired_resolver: Option<JoinHandle<()>>,
}

impl NetworkStatusObserver {
    pub fn new(
        sampler: StatusSampler,
        path_monitor: Box<dyn PathMonitor>,
        delivery: Arc<dyn DeliveryContext>,
    ) -> Self {
        Self {
            sampler: Arc::new(sampler),
            path_monitor,
            delivery,
            latest: Arc::new(Mutex::new(None)),
            session: None,
            retired_resolver: None,
        }
    }

    /// Observer wired to the OS resolvers and OS path notifications.
    pub fn system(config: &ObserverConfig, delivery: Arc<dyn DeliveryContext>) -> Self {
        Self::new(
            StatusSampler::system(config),
            Box::new(SystemPathMonitor),
            delivery,
        )
    }

    /// Begin monitoring (Idle → Monitoring).
    ///
    /// Waits for the previous session's resolver to exit, so passes never
    /// overlap. Then queues the initial resolution pass and subscribes to path
    /// changes. A failed subscription is logged and leaves the observer
    /// monitoring with the initial snapshot only.
    pub fn start<F>(&mut self, on_update: F) -> Result<(), ObserverError>
    where
        F: FnMut(NetworkStatusSnapshot) + Send + 'static,
    {
        if self.session.is_some() {
            return Err(ObserverError::AlreadyMonitoring);
        }

        if let Some(previous) = self.retired_resolver.take() {
            if previous.join().is_err() {
                tracing::error!("Previous resolver thread panicked");
            }
        }
        *self.latest.lock() = None;

        let publisher = Arc::new(Publisher {
            monitoring: AtomicBool::new(true),
            on_update: Mutex::new(Box::new(on_update)),
            latest: Arc::clone(&self.latest),
        });
        let (tx, rx) = mpsc::channel();

        let resolver_thread = {
            let sampler = Arc::clone(&self.sampler);
            let publisher = Arc::clone(&publisher);
            let delivery = Arc::clone(&self.delivery);
            std::thread::Builder::new()
                .name(config::RESOLVER_THREAD_NAME.into())
                .spawn(move || run_resolver_loop(sampler, rx, publisher, delivery))?
        };

        // Receiver is alive until Shutdown, so this send cannot fail.
        let _ = tx.send(ResolverCommand::Resolve { sequence: 0 });

        let subscription = match self.path_monitor.subscribe(PathNotifier::new(tx.clone())) {
            Ok(subscription) => Some(subscription),
            Err(e) => {
                tracing::warn!("Path change monitoring unavailable ({}): {e}", e.kind());
                None
            }
        };

        self.session = Some(Session {
            publisher,
            commands: tx,
            subscription,
            resolver_thread,
        });
        tracing::info!("Network status observer started for {}", self.sampler.interface());
        Ok(())
    }

    /// Stop monitoring (Monitoring → Idle). No-op when idle.
    ///
    /// Does not block on a pass already running: it may finish, but its
    /// snapshot is discarded. The next `start` waits for it.
    pub fn stop(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };

        session.publisher.close();
        if let Some(subscription) = session.subscription.take() {
            subscription.cancel();
        }
        let _ = session.commands.send(ResolverCommand::Shutdown);
        self.retired_resolver = Some(session.resolver_thread);
        tracing::info!("Network status observer stopped");
    }

    pub fn is_monitoring(&self) -> bool {
        self.session.is_some()
    }

    /// Most recently delivered snapshot of the current session; `None` until
    /// the first delivery after `start`.
    pub fn latest(&self) -> Option<NetworkStatusSnapshot> {
        self.latest.lock().clone()
    }
}

impl Drop for NetworkStatusObserver {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for NetworkStatusObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkStatusObserver")
            .field("sampler", &self.sampler)
            .field("monitoring", &self.is_monitoring())
            .finish_non_exhaustive()
    }
}

fn run_resolver_loop(
    sampler: Arc<StatusSampler>,
    commands: Receiver<ResolverCommand>,
    publisher: Arc<Publisher>,
    delivery: Arc<dyn DeliveryContext>,
) {
    for command in commands {
        let sequence = match command {
            ResolverCommand::Resolve { sequence } => sequence,
            ResolverCommand::Shutdown => break,
        };
        if !publisher.is_monitoring() {
            break;
        }

        let snapshot = sampler.resolve();
        tracing::debug!(
            "Resolved pass {sequence}: wired={} ipv4={:?} ipv6={:?} gateway={:?}",
            snapshot.link_is_wired,
            snapshot.ipv4_address,
            snapshot.ipv6_address,
            snapshot.gateway_address
        );

        let publisher = Arc::clone(&publisher);
        delivery.dispatch(Box::new(move || publisher.publish(snapshot)));
    }
    tracing::debug!("Resolver loop exited");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AddressResolver, GatewayResolver, InterfaceAddresses, LinkClassifier};
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    const WAIT: Duration = Duration::from_secs(5);
    const QUIET: Duration = Duration::from_millis(200);

    struct WiredLink;

    impl LinkClassifier for WiredLink {
        fn is_wired(&self) -> bool {
            true
        }
    }

    struct FixedAddresses(InterfaceAddresses);

    impl AddressResolver for FixedAddresses {
        fn resolve_addresses(&self, _interface: &str) -> InterfaceAddresses {
            self.0.clone()
        }
    }

    /// Reports the pass number as the gateway so delivery order is visible.
    #[derive(Default)]
    struct CountingGateway {
        passes: AtomicUsize,
    }

    impl GatewayResolver for CountingGateway {
        fn resolve_gateway(&self) -> Option<String> {
            Some((self.passes.fetch_add(1, Ordering::SeqCst) + 1).to_string())
        }
    }

    /// Blocks the second pass until released.
    struct GatedGateway {
        passes: AtomicUsize,
        entered: Mutex<Sender<()>>,
        release: Mutex<Receiver<()>>,
    }

    impl GatewayResolver for GatedGateway {
        fn resolve_gateway(&self) -> Option<String> {
            if self.passes.fetch_add(1, Ordering::SeqCst) == 1 {
                let _ = self.entered.lock().send(());
                let _ = self.release.lock().recv_timeout(WAIT);
            }
            Some("10.0.0.1".into())
        }
    }

    fn make_sampler(gateway: Box<dyn GatewayResolver>) -> StatusSampler {
        StatusSampler::new(
            "en0",
            Box::new(WiredLink),
            Box::new(FixedAddresses(InterfaceAddresses {
                ipv4: Some("192.168.1.20".into()),
                ipv6: None,
            })),
            gateway,
        )
    }

    fn make_observer(
        gateway: Box<dyn GatewayResolver>,
        delivery: Arc<dyn DeliveryContext>,
    ) -> (NetworkStatusObserver, ManualPathMonitor) {
        let monitor = ManualPathMonitor::new();
        let observer =
            NetworkStatusObserver::new(make_sampler(gateway), Box::new(monitor.clone()), delivery);
        (observer, monitor)
    }

    fn start_collecting(
        observer: &mut NetworkStatusObserver,
    ) -> Receiver<NetworkStatusSnapshot> {
        let (tx, rx) = mpsc::channel();
        observer
            .start(move |snap| {
                let _ = tx.send(snap);
            })
            .unwrap();
        rx
    }

    #[test]
    fn test_initial_snapshot_delivered_on_start() {
        let (mut observer, _monitor) =
            make_observer(Box::new(CountingGateway::default()), Arc::new(InlineDelivery));
        assert!(!observer.is_monitoring());
        assert_eq!(observer.latest(), None);

        let rx = start_collecting(&mut observer);
        let first = rx.recv_timeout(WAIT).unwrap();
        assert!(first.link_is_wired);
        assert_eq!(first.ipv4_address.as_deref(), Some("192.168.1.20"));
        assert_eq!(first.ipv6_address, None);
        assert_eq!(first.gateway_address.as_deref(), Some("1"));
        assert!(observer.is_monitoring());
        assert_eq!(observer.latest(), Some(first));
    }

    #[test]
    fn test_one_delivery_per_change_plus_initial_in_order() {
        let queue: Arc<dyn DeliveryContext> = Arc::new(DeliveryQueue::spawn().unwrap());
        let (mut observer, monitor) = make_observer(Box::new(CountingGateway::default()), queue);
        let rx = start_collecting(&mut observer);

        const EVENTS: usize = 10;
        for _ in 0..EVENTS {
            assert!(monitor.trigger());
        }

        for expected in 1..=EVENTS + 1 {
            let snap = rx.recv_timeout(WAIT).unwrap();
            assert_eq!(snap.gateway_address, Some(expected.to_string()));
        }
        assert!(rx.recv_timeout(QUIET).is_err());
        assert_eq!(
            observer.latest().and_then(|s| s.gateway_address),
            Some((EVENTS + 1).to_string())
        );
    }

    #[test]
    fn test_no_delivery_after_stop_returns() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let gateway = GatedGateway {
            passes: AtomicUsize::new(0),
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        };
        let (mut observer, monitor) = make_observer(Box::new(gateway), Arc::new(InlineDelivery));
        let rx = start_collecting(&mut observer);
        rx.recv_timeout(WAIT).unwrap();

        // Second pass is in flight when stop is called.
        assert!(monitor.trigger());
        entered_rx.recv_timeout(WAIT).unwrap();
        observer.stop();
        release_tx.send(()).unwrap();

        assert!(rx.recv_timeout(QUIET).is_err());
        assert!(!observer.is_monitoring());
        assert!(!monitor.is_subscribed());
        assert!(!monitor.trigger());
    }

    #[test]
    fn test_stop_without_start_and_twice_is_noop() {
        let (mut observer, _monitor) =
            make_observer(Box::new(CountingGateway::default()), Arc::new(InlineDelivery));
        observer.stop();
        assert!(!observer.is_monitoring());

        let rx = start_collecting(&mut observer);
        rx.recv_timeout(WAIT).unwrap();
        observer.stop();
        observer.stop();
        assert!(!observer.is_monitoring());
    }

    #[test]
    fn test_start_while_monitoring_is_rejected() {
        let (mut observer, monitor) =
            make_observer(Box::new(CountingGateway::default()), Arc::new(InlineDelivery));
        let rx = start_collecting(&mut observer);
        rx.recv_timeout(WAIT).unwrap();

        let err = observer.start(|_| {}).unwrap_err();
        assert_eq!(err.kind(), "AlreadyMonitoring");

        // The original session keeps delivering.
        assert!(monitor.trigger());
        assert_eq!(
            rx.recv_timeout(WAIT).unwrap().gateway_address.as_deref(),
            Some("2")
        );
    }

    #[test]
    fn test_restart_after_stop() {
        let (mut observer, monitor) =
            make_observer(Box::new(CountingGateway::default()), Arc::new(InlineDelivery));
        let first_rx = start_collecting(&mut observer);
        first_rx.recv_timeout(WAIT).unwrap();
        observer.stop();

        let second_rx = start_collecting(&mut observer);
        assert_eq!(
            second_rx.recv_timeout(WAIT).unwrap().gateway_address.as_deref(),
            Some("2")
        );
        assert!(monitor.trigger());
        assert!(second_rx.recv_timeout(WAIT).is_ok());
        assert!(first_rx.recv_timeout(QUIET).is_err());
    }

    #[test]
    fn test_failed_subscription_keeps_initial_snapshot() {
        struct BrokenMonitor;

        impl PathMonitor for BrokenMonitor {
            fn subscribe(
                &mut self,
                _notifier: PathNotifier,
            ) -> Result<PathSubscription, ObserverError> {
                Err(ObserverError::PathMonitor("unsupported".into()))
            }
        }

        let mut observer = NetworkStatusObserver::new(
            make_sampler(Box::new(CountingGateway::default())),
            Box::new(BrokenMonitor),
            Arc::new(InlineDelivery),
        );
        let rx = start_collecting(&mut observer);
        assert!(observer.is_monitoring());
        assert_eq!(
            rx.recv_timeout(WAIT).unwrap().gateway_address.as_deref(),
            Some("1")
        );
    }

    #[test]
    fn test_restart_waits_for_previous_pass() {
        /// Records how many passes ever ran at once; the second pass is slow.
        struct OverlapGateway {
            passes: AtomicUsize,
            in_flight: AtomicUsize,
            max_in_flight: AtomicUsize,
            entered: Mutex<Sender<()>>,
        }

        impl GatewayResolver for OverlapGateway {
            fn resolve_gateway(&self) -> Option<String> {
                let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                self.max_in_flight.fetch_max(running, Ordering::SeqCst);
                if self.passes.fetch_add(1, Ordering::SeqCst) == 1 {
                    let _ = self.entered.lock().send(());
                    std::thread::sleep(Duration::from_millis(300));
                }
                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                Some("10.0.0.1".into())
            }
        }

        let (entered_tx, entered_rx) = mpsc::channel();
        let gateway = Arc::new(OverlapGateway {
            passes: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            entered: Mutex::new(entered_tx),
        });

        struct Shared(Arc<OverlapGateway>);

        impl GatewayResolver for Shared {
            fn resolve_gateway(&self) -> Option<String> {
                self.0.resolve_gateway()
            }
        }

        let (mut observer, monitor) =
            make_observer(Box::new(Shared(Arc::clone(&gateway))), Arc::new(InlineDelivery));
        let first_rx = start_collecting(&mut observer);
        first_rx.recv_timeout(WAIT).unwrap();

        assert!(monitor.trigger());
        entered_rx.recv_timeout(WAIT).unwrap();
        observer.stop();

        let second_rx = start_collecting(&mut observer);
        second_rx.recv_timeout(WAIT).unwrap();
        assert_eq!(gateway.passes.load(Ordering::SeqCst), 3);
        assert_eq!(gateway.max_in_flight.load(Ordering::SeqCst), 1);
        assert!(first_rx.recv_timeout(QUIET).is_err());
    }

    #[test]
    fn test_latest_cleared_on_restart() {
        /// Runs jobs inline while enabled, drops them otherwise.
        struct SwitchableDelivery {
            enabled: AtomicBool,
        }

        impl DeliveryContext for SwitchableDelivery {
            fn dispatch(&self, job: DeliveryJob) {
                if self.enabled.load(Ordering::SeqCst) {
                    job();
                }
            }
        }

        let delivery = Arc::new(SwitchableDelivery {
            enabled: AtomicBool::new(true),
        });
        let (mut observer, _monitor) =
            make_observer(Box::new(CountingGateway::default()), delivery.clone());
        let rx = start_collecting(&mut observer);
        rx.recv_timeout(WAIT).unwrap();
        assert!(observer.latest().is_some());

        delivery.enabled.store(false, Ordering::SeqCst);
        observer.stop();
        let _rx = start_collecting(&mut observer);
        assert_eq!(observer.latest(), None);
    }

    #[test]
    fn test_observer_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<NetworkStatusObserver>();
        assert_send::<PathSubscription>();
    }

    #[test]
    fn test_drop_stops_monitoring() {
        let (mut observer, monitor) =
            make_observer(Box::new(CountingGateway::default()), Arc::new(InlineDelivery));
        let rx = start_collecting(&mut observer);
        rx.recv_timeout(WAIT).unwrap();

        drop(observer);
        assert!(!monitor.is_subscribed());
        assert!(!monitor.trigger());
    }
}
