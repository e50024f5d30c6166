//! Subscriber endpoints and the registry that multicasts to them.
//!
//! Each subscriber owns six bounded channels, one per facet. Publishing
//! awaits `send` on every registered endpoint in turn, so a value is handed
//! to every subscriber before the next one is published. A subscriber that
//! stops reading eventually stalls the publisher; nothing is ever dropped.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use racce_types::{CarId, CarState, LiveUpdate, ServerState, SessionState, Track};
use tokio::sync::{Mutex, mpsc};
use tracing::debug;

/// Buffer of each facet channel. Tokio channels cannot be unbuffered, so one
/// slot is the closest to a hand-off.
const FACET_CAPACITY: usize = 1;

/// The receiving side of one subscriber: one channel per facet.
///
/// All six channels close together when the engine shuts down. Dropping the
/// subscription (or any one of its receivers) unsubscribes it; the registry
/// prunes it on the next delivery.
#[derive(Debug)]
pub struct Subscription {
    /// Connectivity changes.
    pub server_state: mpsc::Receiver<ServerState>,
    /// Client count reports.
    pub nr_clients: mpsc::Receiver<u32>,
    /// Track changes.
    pub track: mpsc::Receiver<Arc<Track>>,
    /// Session descriptor changes.
    pub session_state: mpsc::Receiver<SessionState>,
    /// Full car snapshots.
    pub car_state: mpsc::Receiver<CarState>,
    /// Car removal notices.
    pub car_purged: mpsc::Receiver<CarId>,
}

impl Subscription {
    /// Wait for the next update on any facet.
    ///
    /// Order is preserved within a facet but not across facets. Returns
    /// `None` once every facet is closed.
    pub async fn recv(&mut self) -> Option<LiveUpdate> {
        tokio::select! {
            Some(state) = self.server_state.recv() => Some(LiveUpdate::ServerState(state)),
            Some(count) = self.nr_clients.recv() => Some(LiveUpdate::NrClients(count)),
            Some(track) = self.track.recv() => Some(LiveUpdate::Track(track)),
            Some(session) = self.session_state.recv() => Some(LiveUpdate::SessionState(session)),
            Some(car) = self.car_state.recv() => Some(LiveUpdate::CarState(car)),
            Some(car_id) = self.car_purged.recv() => Some(LiveUpdate::CarPurged(car_id)),
            else => None,
        }
    }

    /// Take an update that is already buffered, checking facets in a fixed
    /// order. Never waits.
    pub fn try_recv(&mut self) -> Option<LiveUpdate> {
        if let Ok(state) = self.server_state.try_recv() {
            return Some(LiveUpdate::ServerState(state));
        }
        if let Ok(count) = self.nr_clients.try_recv() {
            return Some(LiveUpdate::NrClients(count));
        }
        if let Ok(track) = self.track.try_recv() {
            return Some(LiveUpdate::Track(track));
        }
        if let Ok(session) = self.session_state.try_recv() {
            return Some(LiveUpdate::SessionState(session));
        }
        if let Ok(car) = self.car_state.try_recv() {
            return Some(LiveUpdate::CarState(car));
        }
        self.car_purged.try_recv().ok().map(LiveUpdate::CarPurged)
    }

    /// Read every facet until all are closed, discarding the values.
    /// Returns how many updates were discarded.
    pub async fn drain(mut self) -> usize {
        let mut drained: usize = 0;
        while self.recv().await.is_some() {
            drained = drained.saturating_add(1);
        }
        drained
    }
}

/// The sending side of one subscriber.
#[derive(Debug, Clone)]
struct Endpoints {
    id: u64,
    server_state: mpsc::Sender<ServerState>,
    nr_clients: mpsc::Sender<u32>,
    track: mpsc::Sender<Arc<Track>>,
    session_state: mpsc::Sender<SessionState>,
    car_state: mpsc::Sender<CarState>,
    car_purged: mpsc::Sender<CarId>,
}

impl Endpoints {
    fn pair(id: u64) -> (Self, Subscription) {
        let (server_state_tx, server_state) = mpsc::channel(FACET_CAPACITY);
        let (nr_clients_tx, nr_clients) = mpsc::channel(FACET_CAPACITY);
        let (track_tx, track) = mpsc::channel(FACET_CAPACITY);
        let (session_state_tx, session_state) = mpsc::channel(FACET_CAPACITY);
        let (car_state_tx, car_state) = mpsc::channel(FACET_CAPACITY);
        let (car_purged_tx, car_purged) = mpsc::channel(FACET_CAPACITY);

        let endpoints = Self {
            id,
            server_state: server_state_tx,
            nr_clients: nr_clients_tx,
            track: track_tx,
            session_state: session_state_tx,
            car_state: car_state_tx,
            car_purged: car_purged_tx,
        };
        let subscription = Subscription {
            server_state,
            nr_clients,
            track,
            session_state,
            car_state,
            car_purged,
        };
        (endpoints, subscription)
    }

    /// Hand one update to the matching facet. Returns `false` if the
    /// subscriber has gone away.
    async fn deliver(&self, update: &LiveUpdate) -> bool {
        match update {
            LiveUpdate::ServerState(state) => self.server_state.send(*state).await.is_ok(),
            LiveUpdate::NrClients(count) => self.nr_clients.send(*count).await.is_ok(),
            LiveUpdate::Track(track) => self.track.send(Arc::clone(track)).await.is_ok(),
            LiveUpdate::SessionState(session) => self.session_state.send(*session).await.is_ok(),
            LiveUpdate::CarState(car) => self.car_state.send(car.clone()).await.is_ok(),
            LiveUpdate::CarPurged(car_id) => self.car_purged.send(*car_id).await.is_ok(),
        }
    }
}

#[derive(Debug, Default)]
struct Registered {
    endpoints: Vec<Endpoints>,
    closed: bool,
}

/// Every registered subscriber. Safe to use from any task.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    registered: Mutex<Registered>,
    next_id: AtomicU64,
}

impl Registry {
    /// Register a fresh subscriber. After [`close_all`](Self::close_all)
    /// the returned subscription is already closed.
    pub(crate) async fn subscribe(&self) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (endpoints, subscription) = Endpoints::pair(id);

        let mut registered = self.registered.lock().await;
        if !registered.closed {
            registered.endpoints.push(endpoints);
            debug!(
                subscriber = id,
                subscribers = registered.endpoints.len(),
                "subscriber registered"
            );
        }
        subscription
    }

    /// Number of subscribers currently registered.
    pub(crate) async fn len(&self) -> usize {
        self.registered.lock().await.endpoints.len()
    }

    /// Deliver each update to every subscriber registered when the batch
    /// starts, in order. Subscribers found closed are pruned afterwards.
    pub(crate) async fn publish(&self, updates: &[LiveUpdate]) {
        if updates.is_empty() {
            return;
        }
        let targets = self.registered.lock().await.endpoints.clone();

        let mut gone = BTreeSet::new();
        for update in updates {
            for target in &targets {
                if gone.contains(&target.id) {
                    continue;
                }
                if !target.deliver(update).await {
                    gone.insert(target.id);
                }
            }
        }

        if !gone.is_empty() {
            let mut registered = self.registered.lock().await;
            registered
                .endpoints
                .retain(|endpoints| !gone.contains(&endpoints.id));
            debug!(
                pruned = gone.len(),
                subscribers = registered.endpoints.len(),
                "pruned closed subscribers"
            );
        }
    }

    /// Drop every subscriber's senders and refuse new registrations.
    pub(crate) async fn close_all(&self) {
        let mut registered = self.registered.lock().await;
        registered.closed = true;
        let closed = std::mem::take(&mut registered.endpoints);
        debug!(subscribers = closed.len(), "closing all subscribers");
    }
}
