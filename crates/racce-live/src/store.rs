//! The authoritative in-memory live state and its mutators.
//!
//! Every published facet has exactly one mutator here. A mutator updates the
//! field and records the new value in the store's outbox; the pump drains the
//! outbox after each event and delivers it to every subscriber. Nothing
//! outside this module can change a published field without going through a
//! mutator, so nothing can change without being published.
//!
//! The store also owns the unpublished bookkeeping the transitions need:
//! pending connection requests and the connection indices used to clean up
//! after a dead connection.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use racce_types::{
    CarId, CarModelId, CarState, ConnectionId, Driver, LiveSnapshot, LiveUpdate, ServerState,
    SessionState, Track,
};

/// A client's announced intent to join, waiting for its car to connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionRequest {
    /// Connection the request arrived on.
    pub connection_id: ConnectionId,
    /// Display name of the player.
    pub player_name: String,
    /// Stable player identifier.
    pub player_id: String,
    /// Car model the player asked for.
    pub car_model_id: CarModelId,
}

impl From<ConnectionRequest> for Driver {
    fn from(request: ConnectionRequest) -> Self {
        Self {
            connection_id: request.connection_id,
            name: request.player_name,
            player_id: request.player_id,
        }
    }
}

/// Live state of one server, plus the bookkeeping needed to maintain it.
#[derive(Debug, Default)]
pub struct Store {
    server_state: ServerState,
    nr_clients: u32,
    track: Option<Arc<Track>>,
    session: SessionState,
    cars: BTreeMap<CarId, CarState>,

    /// Unmatched connection requests, oldest first.
    pending_requests: Vec<ConnectionRequest>,
    /// Driver created for each connection.
    driver_per_connection: BTreeMap<ConnectionId, Driver>,
    /// Car each connection drives.
    car_per_connection: BTreeMap<ConnectionId, CarId>,

    /// Updates recorded since the last drain, in publication order.
    outbox: Vec<LiveUpdate>,
}

impl Store {
    /// Create an empty store: offline, no clients, no track, no cars.
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Current connectivity.
    pub const fn server_state(&self) -> ServerState {
        self.server_state
    }

    /// Whether the server is up (online or not registered).
    pub const fn is_running(&self) -> bool {
        self.server_state.is_running()
    }

    /// Last reported client count.
    pub const fn nr_clients(&self) -> u32 {
        self.nr_clients
    }

    /// Track currently loaded.
    pub const fn track(&self) -> Option<&Arc<Track>> {
        self.track.as_ref()
    }

    /// Current session.
    pub const fn session(&self) -> SessionState {
        self.session
    }

    /// State of one car.
    pub fn car(&self, car_id: CarId) -> Option<&CarState> {
        self.cars.get(&car_id)
    }

    /// Number of live cars.
    pub fn car_count(&self) -> usize {
        self.cars.len()
    }

    /// All live cars ordered by position, ties by car id.
    pub fn cars_by_position(&self) -> Vec<&CarState> {
        let mut cars: Vec<&CarState> = self.cars.values().collect();
        cars.sort_by_key(|car| car.position);
        cars
    }

    /// Number of connection requests still waiting for a car.
    pub const fn pending_request_count(&self) -> usize {
        self.pending_requests.len()
    }

    /// Car bound to a connection, if any.
    pub fn car_for_connection(&self, connection_id: ConnectionId) -> Option<CarId> {
        self.car_per_connection.get(&connection_id).copied()
    }

    /// Position a newly connected car is placed at.
    pub fn next_position(&self) -> u32 {
        u32::try_from(self.cars.len())
            .unwrap_or(u32::MAX)
            .saturating_add(1)
    }

    /// Consistent copy of every published facet.
    pub fn snapshot(&self) -> LiveSnapshot {
        LiveSnapshot {
            server_state: self.server_state,
            nr_clients: self.nr_clients,
            track: self.track.clone(),
            session: self.session,
            cars: self.cars_by_position().into_iter().cloned().collect(),
        }
    }

    /// Remove and return every update recorded since the last call.
    pub fn take_updates(&mut self) -> Vec<LiveUpdate> {
        std::mem::take(&mut self.outbox)
    }

    // -----------------------------------------------------------------------
    // Published mutators
    // -----------------------------------------------------------------------

    /// Set connectivity. Published even when unchanged.
    pub fn set_server_state(&mut self, state: ServerState) {
        self.server_state = state;
        self.outbox.push(LiveUpdate::ServerState(state));
    }

    /// Set the client count. Published even when unchanged.
    pub fn set_nr_clients(&mut self, nr_clients: u32) {
        self.nr_clients = nr_clients;
        self.outbox.push(LiveUpdate::NrClients(nr_clients));
    }

    /// Set the loaded track.
    pub fn set_track(&mut self, track: Arc<Track>) {
        self.track = Some(Arc::clone(&track));
        self.outbox.push(LiveUpdate::Track(track));
    }

    /// Set the session descriptor.
    pub fn set_session(&mut self, session: SessionState) {
        self.session = session;
        self.outbox.push(LiveUpdate::SessionState(session));
    }

    /// Insert or replace a car and publish its full state.
    pub fn set_car(&mut self, car: CarState) {
        self.outbox.push(LiveUpdate::CarState(car.clone()));
        self.cars.insert(car.car_id, car);
    }

    /// Remove a car and publish the purge notice.
    ///
    /// Connection indices pointing at the car are dropped with it. Positions
    /// are not renormalised; callers follow up with
    /// [`recalculate_positions`](Self::recalculate_positions).
    pub fn purge_car(&mut self, car_id: CarId) -> Option<CarState> {
        let removed = self.cars.remove(&car_id);
        if let Some(car) = &removed {
            for driver in &car.drivers {
                self.driver_per_connection.remove(&driver.connection_id);
            }
        }
        self.car_per_connection.retain(|_, bound| *bound != car_id);
        self.outbox.push(LiveUpdate::CarPurged(car_id));
        removed
    }

    /// Purge every car whose driver roster is empty. Returns the purged ids.
    pub fn purge_driverless_cars(&mut self) -> Vec<CarId> {
        let empty: Vec<CarId> = self
            .cars
            .values()
            .filter(|car| car.drivers.is_empty())
            .map(|car| car.car_id)
            .collect();
        for car_id in &empty {
            self.purge_car(*car_id);
        }
        empty
    }

    /// Purge every car, in position order.
    pub fn purge_all_cars(&mut self) {
        let all: Vec<CarId> = self
            .cars_by_position()
            .into_iter()
            .map(|car| car.car_id)
            .collect();
        for car_id in all {
            self.purge_car(car_id);
        }
    }

    /// Clear every car's lap bookkeeping and publish each car.
    pub fn reset_laps(&mut self) {
        let ids: Vec<CarId> = self.cars.keys().copied().collect();
        for car_id in ids {
            if let Some(mut car) = self.cars.get(&car_id).cloned() {
                car.reset_laps();
                self.set_car(car);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Positions
    // -----------------------------------------------------------------------

    /// Renormalise positions to `1..N` keeping the current order.
    ///
    /// Cars are stable-sorted by their current position and renumbered; only
    /// cars whose position actually changed are published.
    pub fn recalculate_positions(&mut self) {
        self.rank_by(|_, _| Ordering::Equal);
    }

    /// Rank cars ascending by best lap. Cars without a best lap keep their
    /// relative order behind those that have one.
    pub fn rank_by_best_lap(&mut self) {
        self.rank_by(|a, b| match (a.best_lap_ms, b.best_lap_ms) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
    }

    /// Rank cars by laps completed, most first; equal lap counts are ordered
    /// by who completed their last lap earliest.
    pub fn rank_by_race_progress(&mut self) {
        self.rank_by(|a, b| {
            b.laps.cmp(&a.laps).then_with(|| {
                let at = a.last_lap_timestamp_ms().unwrap_or(u64::MAX);
                let bt = b.last_lap_timestamp_ms().unwrap_or(u64::MAX);
                at.cmp(&bt)
            })
        });
    }

    /// Stable-sort cars by `compare`, falling back to current position, then
    /// assign `1..N` and publish the cars that moved.
    fn rank_by<F>(&mut self, compare: F)
    where
        F: Fn(&CarState, &CarState) -> Ordering,
    {
        let mut order: Vec<&CarState> = self.cars_by_position();
        order.sort_by(|a, b| compare(a, b));
        let order: Vec<CarId> = order.into_iter().map(|car| car.car_id).collect();

        let mut moved = Vec::new();
        for (position, car_id) in (1_u32..).zip(order) {
            if let Some(car) = self
                .cars
                .get_mut(&car_id)
                .filter(|car| car.position != position)
            {
                car.position = position;
                moved.push(car.clone());
            }
        }
        for car in moved {
            self.outbox.push(LiveUpdate::CarState(car));
        }
    }

    // -----------------------------------------------------------------------
    // Unpublished bookkeeping
    // -----------------------------------------------------------------------

    /// Queue a connection request.
    pub fn push_request(&mut self, request: ConnectionRequest) {
        self.pending_requests.push(request);
    }

    /// Take the most recently queued request for a car model.
    ///
    /// The remaining requests keep their order.
    pub fn take_request_for_model(&mut self, car_model_id: CarModelId) -> Option<ConnectionRequest> {
        let index = self
            .pending_requests
            .iter()
            .rposition(|request| request.car_model_id == car_model_id)?;
        Some(self.pending_requests.remove(index))
    }

    /// Drop every pending request made on a connection.
    pub fn drop_requests_from(&mut self, connection_id: ConnectionId) {
        self.pending_requests
            .retain(|request| request.connection_id != connection_id);
    }

    /// Record that `driver` drives `car_id`.
    pub fn bind_connection(&mut self, driver: Driver, car_id: CarId) {
        self.car_per_connection.insert(driver.connection_id, car_id);
        self.driver_per_connection.insert(driver.connection_id, driver);
    }

    /// Forget both indices for a connection, returning what they held.
    pub fn unbind_connection(
        &mut self,
        connection_id: ConnectionId,
    ) -> (Option<Driver>, Option<CarId>) {
        (
            self.driver_per_connection.remove(&connection_id),
            self.car_per_connection.remove(&connection_id),
        )
    }

    /// Forget every pending request and connection index.
    pub fn clear_connections(&mut self) {
        self.pending_requests.clear();
        self.driver_per_connection.clear();
        self.car_per_connection.clear();
    }
}
