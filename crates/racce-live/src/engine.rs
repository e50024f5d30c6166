//! The [`LiveState`] handle: instance lifecycle and the event pump.
//!
//! At most one instance is current. [`LiveState::start_instance`] makes a new
//! event source current and signals the previous pump to stop. Pumps take a
//! shared writer gate for each event and re-check that they are still
//! current while holding it, so a superseded pump can never publish after
//! its successor's `Starting` announcement.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use racce_catalog::Catalog;
use racce_events::LogEvent;
use racce_types::{CarId, CarState, LiveSnapshot, ServerState};
use tokio::sync::{Mutex, RwLock, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::error::LiveStateError;
use crate::store::Store;
use crate::subscription::{Registry, Subscription};
use crate::transition;

/// How a pump finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceExit {
    /// The event source ended while the instance was current. The engine
    /// went offline.
    Exhausted,
    /// Another instance was started, or the engine shut down.
    Superseded,
}

/// Handle to a running pump.
#[derive(Debug)]
pub struct InstanceHandle {
    generation: u64,
    task: JoinHandle<InstanceExit>,
}

impl InstanceHandle {
    /// Sequence number of this instance; later instances have larger ones.
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the pump has finished.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the pump to finish.
    ///
    /// # Errors
    ///
    /// Returns [`LiveStateError::PumpAborted`] if the pump task was
    /// cancelled or panicked outside a transition.
    pub async fn join(self) -> Result<InstanceExit, LiveStateError> {
        Ok(self.task.await?)
    }
}

struct Inner {
    catalog: Arc<dyn Catalog>,
    store: RwLock<Store>,
    /// Held by a pump for the whole of one event: apply and deliver.
    gate: Mutex<()>,
    registry: Registry,
    /// Generation of the current instance. Bumped on every start and on
    /// shutdown; a pump whose generation differs is superseded.
    generation: watch::Sender<u64>,
    shut_down: AtomicBool,
}

/// Shared handle to the live-state engine.
///
/// Cloning is cheap; every clone drives the same state.
#[derive(Clone)]
pub struct LiveState {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for LiveState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveState")
            .field("generation", &*self.inner.generation.borrow())
            .field("shut_down", &self.inner.shut_down.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

impl LiveState {
    /// Create an engine with an empty, offline state and no instance.
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                catalog,
                store: RwLock::new(Store::new()),
                gate: Mutex::new(()),
                registry: Registry::default(),
                generation,
                shut_down: AtomicBool::new(false),
            }),
        }
    }

    /// Register a new subscriber.
    ///
    /// The subscriber receives every update published from now on. After
    /// [`shutdown`](Self::shutdown) the subscription is returned closed.
    pub async fn subscribe(&self) -> Subscription {
        self.inner.registry.subscribe().await
    }

    /// Number of registered subscribers.
    pub async fn subscriber_count(&self) -> usize {
        self.inner.registry.len().await
    }

    /// Make `events` the current source and spawn its pump.
    ///
    /// The previous instance, if any, is told to stop; none of its events
    /// are applied once this instance has announced `Starting`. Must be
    /// called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`LiveStateError::ShutDown`] after [`shutdown`](Self::shutdown).
    pub fn start_instance(
        &self,
        events: mpsc::Receiver<LogEvent>,
    ) -> Result<InstanceHandle, LiveStateError> {
        let mut started = None;
        self.inner.generation.send_if_modified(|current| {
            if self.inner.shut_down.load(Ordering::Acquire) {
                return false;
            }
            *current = current.wrapping_add(1);
            started = Some(*current);
            true
        });
        let generation = started.ok_or(LiveStateError::ShutDown)?;

        let pump = Pump {
            inner: Arc::clone(&self.inner),
            generation,
            superseded: self.inner.generation.subscribe(),
            events,
        };
        let task = tokio::spawn(pump.run());
        info!(generation, "instance started");
        Ok(InstanceHandle { generation, task })
    }

    /// Consistent copy of the published state.
    pub async fn snapshot(&self) -> LiveSnapshot {
        self.inner.store.read().await.snapshot()
    }

    /// Current connectivity.
    pub async fn server_state(&self) -> ServerState {
        self.inner.store.read().await.server_state()
    }

    /// Whether the server is up (online or not registered).
    pub async fn is_running(&self) -> bool {
        self.inner.store.read().await.is_running()
    }

    /// State of one car, if it is live.
    pub async fn car(&self, car_id: CarId) -> Option<CarState> {
        self.inner.store.read().await.car(car_id).cloned()
    }

    /// Stop the current pump and close every subscriber.
    ///
    /// Waits for an in-flight event to finish delivering. Further calls to
    /// [`start_instance`](Self::start_instance) fail.
    pub async fn shutdown(&self) {
        self.inner.generation.send_modify(|current| {
            self.inner.shut_down.store(true, Ordering::Release);
            *current = current.wrapping_add(1);
        });
        let _gate = self.inner.gate.lock().await;
        self.inner.registry.close_all().await;
        info!("live state shut down");
    }
}

/// What the pump woke up for.
enum Wake {
    Event(LogEvent),
    Exhausted,
    Signal,
}

struct Pump {
    inner: Arc<Inner>,
    generation: u64,
    superseded: watch::Receiver<u64>,
    events: mpsc::Receiver<LogEvent>,
}

impl Pump {
    async fn run(mut self) -> InstanceExit {
        {
            let _gate = self.inner.gate.lock().await;
            if self.is_superseded() {
                info!(generation = self.generation, "instance superseded before starting");
                return InstanceExit::Superseded;
            }
            self.commit(|store| {
                store.set_server_state(ServerState::Starting);
                store.set_nr_clients(0);
            })
            .await;
        }

        loop {
            let wake = tokio::select! {
                biased;
                _ = self.superseded.changed() => Wake::Signal,
                event = self.events.recv() => event.map_or(Wake::Exhausted, Wake::Event),
            };

            let _gate = self.inner.gate.lock().await;
            if self.is_superseded() {
                info!(generation = self.generation, "instance superseded");
                return InstanceExit::Superseded;
            }
            match wake {
                Wake::Event(event) => self.apply(event).await,
                Wake::Exhausted => {
                    self.commit(|store| {
                        store.set_server_state(ServerState::Offline);
                        store.purge_all_cars();
                        store.clear_connections();
                    })
                    .await;
                    info!(generation = self.generation, "event source exhausted, server offline");
                    return InstanceExit::Exhausted;
                }
                Wake::Signal => {}
            }
        }
    }

    fn is_superseded(&self) -> bool {
        *self.superseded.borrow() != self.generation
    }

    /// Apply one event, containing handler errors and panics.
    async fn apply(&self, event: LogEvent) {
        let kind = event.kind();
        let catalog = Arc::clone(&self.inner.catalog);
        self.commit(move |store| {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                transition::apply(store, catalog.as_ref(), event)
            }));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(error)) => warn!(kind, %error, "event not applied"),
                Err(payload) => warn!(
                    kind,
                    panic = panic_message(payload.as_ref()),
                    "transition panicked, event skipped"
                ),
            }
        })
        .await;
    }

    /// Run `change` under the store's write lock, then deliver whatever it
    /// published once the lock is released.
    async fn commit<F>(&self, change: F)
    where
        F: FnOnce(&mut Store),
    {
        let updates = {
            let mut store = self.inner.store.write().await;
            change(&mut store);
            store.take_updates()
        };
        self.inner.registry.publish(&updates).await;
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
