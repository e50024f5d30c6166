//! Integration tests for the live-state engine.
//!
//! Each test drives a real [`LiveState`] through an event channel and
//! observes it through a subscription, as a dashboard would. Every wait is
//! bounded so a stalled pump fails the test instead of hanging it.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::arithmetic_side_effects)]

use std::sync::Arc;
use std::time::Duration;

use racce_catalog::{Catalog, StaticCatalog};
use racce_events::{LapFlags, LogEvent};
use racce_live::{InstanceExit, InstanceHandle, LiveState, LiveStateError, Subscription};
use racce_types::{
    CarId, CarModel, CarModelId, CarState, ConnectionId, LiveUpdate, ServerState, SessionPhase,
    SessionState, SessionType, Track,
};
use tokio::sync::mpsc;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(2);

async fn next<T>(rx: &mut mpsc::Receiver<T>) -> T {
    timeout(WAIT, rx.recv())
        .await
        .expect("timed out waiting for an update")
        .expect("facet closed")
}

/// Engine with one subscriber and one running instance whose `Starting`
/// announcement has been consumed.
struct Fixture {
    live: LiveState,
    sub: Subscription,
    tx: mpsc::Sender<LogEvent>,
    handle: InstanceHandle,
    marker: u32,
}

impl Fixture {
    async fn new() -> Self {
        Self::with_catalog(Arc::new(StaticCatalog::builtin())).await
    }

    async fn with_catalog(catalog: Arc<dyn Catalog>) -> Self {
        let live = LiveState::new(catalog);
        let mut sub = live.subscribe().await;
        let (tx, rx) = mpsc::channel(16);
        let handle = live.start_instance(rx).unwrap();

        assert_eq!(next(&mut sub.server_state).await, ServerState::Starting);
        assert_eq!(next(&mut sub.nr_clients).await, 0);

        Self {
            live,
            sub,
            tx,
            handle,
            marker: 1000,
        }
    }

    async fn send(&self, event: LogEvent) {
        timeout(WAIT, self.tx.send(event))
            .await
            .expect("pump stopped reading")
            .expect("pump gone");
    }

    /// Collect exactly `count` updates from any facet.
    async fn updates(&mut self, count: usize) -> Vec<LiveUpdate> {
        let mut updates = Vec::with_capacity(count);
        while updates.len() < count {
            let update = timeout(WAIT, self.sub.recv())
                .await
                .expect("timed out waiting for updates")
                .expect("subscription closed");
            updates.push(update);
        }
        updates
    }

    /// Push a marker through the pump and return everything published
    /// before it that the test has not read yet.
    async fn settle(&mut self) -> Vec<LiveUpdate> {
        self.marker += 1;
        let marker = self.marker;
        self.send(LogEvent::NrClientsOnline { nr_clients: marker })
            .await;

        let mut extra = Vec::new();
        loop {
            match timeout(WAIT, self.sub.recv()).await.unwrap().unwrap() {
                LiveUpdate::NrClients(n) if n == marker => break,
                other => extra.push(other),
            }
        }
        while let Some(update) = self.sub.try_recv() {
            extra.push(update);
        }
        extra
    }

    async fn assert_settled(&mut self) {
        let extra = self.settle().await;
        assert!(extra.is_empty(), "unexpected updates: {extra:?}");
    }

    async fn join(&mut self, connection: u32, model: u32, car: u32, race_number: u32) -> CarState {
        self.send(request(connection, model)).await;
        self.send(LogEvent::NewCarConnection {
            car_id: CarId::new(car),
            car_model_id: CarModelId::new(model),
            race_number,
        })
        .await;
        next(&mut self.sub.car_state).await
    }
}

fn request(connection: u32, model: u32) -> LogEvent {
    LogEvent::NewConnectionRequest {
        connection_id: ConnectionId::new(connection),
        player_name: format!("Driver {connection}"),
        player_id: format!("S{connection}"),
        car_model_id: CarModelId::new(model),
    }
}

fn lap(car: u32, lap_time_ms: u32, timestamp_ms: u64, flags: u32) -> LogEvent {
    LogEvent::NewLapTime {
        car_id: CarId::new(car),
        lap_time_ms,
        timestamp_ms,
        flags: LapFlags(flags),
    }
}

fn session(session_type: SessionType, phase: SessionPhase) -> LogEvent {
    LogEvent::SessionPhaseChanged {
        session_type,
        phase,
    }
}

fn cars_in(updates: &[LiveUpdate]) -> Vec<(u32, u32)> {
    let mut cars: Vec<(u32, u32)> = updates
        .iter()
        .filter_map(|update| match update {
            LiveUpdate::CarState(car) => Some((car.car_id.into_inner(), car.position)),
            _ => None,
        })
        .collect();
    cars.sort_unstable();
    cars
}

fn purges_in(updates: &[LiveUpdate]) -> Vec<u32> {
    let mut purged: Vec<u32> = updates
        .iter()
        .filter_map(|update| match update {
            LiveUpdate::CarPurged(car_id) => Some(car_id.into_inner()),
            _ => None,
        })
        .collect();
    purged.sort_unstable();
    purged
}

// =============================================================================
// Lifecycle
// =============================================================================

#[tokio::test]
async fn server_lifecycle() {
    let mut f = Fixture::new().await;
    assert!(!f.live.is_running().await);

    f.send(LogEvent::ServerStarting { version: 255 }).await;
    assert_eq!(next(&mut f.sub.server_state).await, ServerState::NotRegistered);
    assert!(f.live.is_running().await);

    f.send(LogEvent::LobbyConnectionSucceeded).await;
    assert_eq!(next(&mut f.sub.server_state).await, ServerState::Online);
    assert!(f.live.is_running().await);
    f.assert_settled().await;

    let Fixture {
        live,
        mut sub,
        tx,
        handle,
        ..
    } = f;
    drop(tx);
    assert_eq!(next(&mut sub.server_state).await, ServerState::Offline);
    assert_eq!(timeout(WAIT, handle.join()).await.unwrap().unwrap(), InstanceExit::Exhausted);
    assert!(!live.is_running().await);
    assert_eq!(live.server_state().await, ServerState::Offline);
}

#[tokio::test]
async fn lobby_connection_lost() {
    let mut f = Fixture::new().await;
    f.send(LogEvent::LobbyConnectionSucceeded).await;
    assert_eq!(next(&mut f.sub.server_state).await, ServerState::Online);

    f.send(LogEvent::LobbyConnectionFailed).await;
    assert_eq!(next(&mut f.sub.server_state).await, ServerState::NotRegistered);
    assert!(f.live.is_running().await);
    f.assert_settled().await;
}

#[tokio::test]
async fn new_instance_ignores_old_source() {
    let live = LiveState::new(Arc::new(StaticCatalog::builtin()));
    let mut sub = live.subscribe().await;

    let (old_tx, old_rx) = mpsc::channel(16);
    let old = live.start_instance(old_rx).unwrap();
    assert_eq!(next(&mut sub.server_state).await, ServerState::Starting);
    assert_eq!(next(&mut sub.nr_clients).await, 0);

    // Nobody reads nr_clients, so the old pump stalls with events still
    // queued behind it.
    for nr_clients in 1..=5 {
        old_tx
            .send(LogEvent::NrClientsOnline { nr_clients })
            .await
            .unwrap();
    }
    tokio::time::sleep(Duration::from_millis(50)).await;

    let (new_tx, new_rx) = mpsc::channel(16);
    let new = live.start_instance(new_rx).unwrap();
    assert!(new.generation() > old.generation());

    let mut seen = Vec::new();
    loop {
        let count = next(&mut sub.nr_clients).await;
        if count == 0 {
            break;
        }
        seen.push(count);
    }
    assert!(!seen.is_empty());
    assert!(seen.len() < 5, "superseded pump applied its whole backlog: {seen:?}");
    assert_eq!(seen, (1..=5).take(seen.len()).collect::<Vec<u32>>());
    assert_eq!(next(&mut sub.server_state).await, ServerState::Starting);

    assert_eq!(timeout(WAIT, old.join()).await.unwrap().unwrap(), InstanceExit::Superseded);
    let _ = old_tx.send(LogEvent::LobbyConnectionSucceeded).await;

    new_tx
        .send(LogEvent::NrClientsOnline { nr_clients: 42 })
        .await
        .unwrap();
    assert_eq!(next(&mut sub.nr_clients).await, 42);
    assert!(sub.try_recv().is_none());
    assert!(!new.is_finished());
}

#[tokio::test]
async fn exhaustion_of_superseded_source_keeps_server_up() {
    let live = LiveState::new(Arc::new(StaticCatalog::builtin()));
    let mut sub = live.subscribe().await;

    let (old_tx, old_rx) = mpsc::channel(4);
    let old = live.start_instance(old_rx).unwrap();
    assert_eq!(next(&mut sub.server_state).await, ServerState::Starting);
    assert_eq!(next(&mut sub.nr_clients).await, 0);

    let (new_tx, new_rx) = mpsc::channel(4);
    let _new = live.start_instance(new_rx).unwrap();
    assert_eq!(next(&mut sub.server_state).await, ServerState::Starting);
    assert_eq!(next(&mut sub.nr_clients).await, 0);
    new_tx.send(LogEvent::LobbyConnectionSucceeded).await.unwrap();
    assert_eq!(next(&mut sub.server_state).await, ServerState::Online);

    drop(old_tx);
    assert_eq!(timeout(WAIT, old.join()).await.unwrap().unwrap(), InstanceExit::Superseded);
    assert_eq!(live.server_state().await, ServerState::Online);
    assert!(sub.try_recv().is_none());
}

#[tokio::test]
async fn nr_clients_is_published_even_when_unchanged() {
    let mut f = Fixture::new().await;
    for nr_clients in [3, 3, 0] {
        f.send(LogEvent::NrClientsOnline { nr_clients }).await;
        assert_eq!(next(&mut f.sub.nr_clients).await, nr_clients);
    }
    f.assert_settled().await;
}

// =============================================================================
// Track and session
// =============================================================================

#[tokio::test]
async fn track_changes_resolve_through_the_catalog() {
    let mut f = Fixture::new().await;

    f.send(LogEvent::Track {
        track: String::from("misano"),
    })
    .await;
    let track = next(&mut f.sub.track).await;
    assert_eq!(track.label, "misano");

    f.send(LogEvent::Track {
        track: String::from("nordschleife"),
    })
    .await;
    f.assert_settled().await;

    let snapshot = f.live.snapshot().await;
    assert_eq!(snapshot.track.map(|t| t.label.clone()), Some(String::from("misano")));
}

#[tokio::test]
async fn session_phase_changes_are_published() {
    let mut f = Fixture::new().await;
    f.send(session(SessionType::Qualifying, SessionPhase::PreSession))
        .await;
    assert_eq!(
        next(&mut f.sub.session_state).await,
        SessionState {
            session_type: SessionType::Qualifying,
            phase: SessionPhase::PreSession,
        }
    );
    f.send(session(SessionType::Qualifying, SessionPhase::Session))
        .await;
    assert_eq!(next(&mut f.sub.session_state).await.phase, SessionPhase::Session);
    f.assert_settled().await;
}

// =============================================================================
// Cars
// =============================================================================

#[tokio::test]
async fn new_car_connection() {
    let mut f = Fixture::new().await;
    let car = f.join(5, 1, 1001, 404).await;

    assert_eq!(car.car_id, CarId::new(1001));
    assert_eq!(car.race_number, 404);
    assert_eq!(car.position, 1);
    assert_eq!(car.car_model.as_ref().map(|m| m.id), Some(CarModelId::new(1)));
    assert_eq!(car.drivers.len(), 1);
    assert_eq!(car.drivers.first().map(|d| d.name.as_str()), Some("Driver 5"));
    assert_eq!(car.current_driver, car.drivers.first().cloned());
    f.assert_settled().await;

    assert_eq!(f.live.car(CarId::new(1001)).await, Some(car));
}

#[tokio::test]
async fn most_recent_request_is_matched_first() {
    let mut f = Fixture::new().await;
    f.send(request(1, 24)).await;
    f.send(request(2, 24)).await;
    f.send(request(3, 25)).await;

    let first = f.join(4, 24, 1001, 1).await;
    assert_eq!(
        first.current_driver.map(|d| d.connection_id),
        Some(ConnectionId::new(4))
    );

    f.send(LogEvent::NewCarConnection {
        car_id: CarId::new(1002),
        car_model_id: CarModelId::new(24),
        race_number: 2,
    })
    .await;
    let second = next(&mut f.sub.car_state).await;
    assert_eq!(
        second.current_driver.map(|d| d.connection_id),
        Some(ConnectionId::new(2))
    );
    f.assert_settled().await;
}

#[tokio::test]
async fn car_purge_renormalises_positions() {
    let mut f = Fixture::new().await;
    f.join(6, 5, 1002, 42).await;
    f.join(7, 6, 1004, 37).await;

    f.send(LogEvent::CarPurged {
        car_id: CarId::new(1002),
    })
    .await;
    assert_eq!(next(&mut f.sub.car_purged).await, CarId::new(1002));
    let moved = next(&mut f.sub.car_state).await;
    assert_eq!((moved.car_id, moved.position), (CarId::new(1004), 1));
    f.assert_settled().await;

    let snapshot = f.live.snapshot().await;
    assert_eq!(snapshot.cars.len(), 1);
}

#[tokio::test]
async fn dead_connection_leaves_car_driverless() {
    let mut f = Fixture::new().await;
    f.join(6, 5, 1002, 42).await;

    f.send(LogEvent::DeadConnection {
        connection_id: ConnectionId::new(6),
    })
    .await;
    let car = next(&mut f.sub.car_state).await;
    assert!(car.drivers.is_empty());
    f.assert_settled().await;
}

#[tokio::test]
async fn cars_are_purged_when_the_source_ends() {
    let mut f = Fixture::new().await;
    f.join(6, 5, 1002, 42).await;
    f.join(7, 6, 1004, 37).await;
    f.assert_settled().await;

    let Fixture {
        live,
        mut sub,
        tx,
        handle,
        ..
    } = f;
    drop(tx);
    assert_eq!(next(&mut sub.server_state).await, ServerState::Offline);
    assert_eq!(next(&mut sub.car_purged).await, CarId::new(1002));
    assert_eq!(next(&mut sub.car_purged).await, CarId::new(1004));
    handle.join().await.unwrap();
    assert!(sub.try_recv().is_none());
    assert!(live.snapshot().await.cars.is_empty());
}

#[tokio::test]
async fn session_type_change_purges_driverless_cars() {
    let mut f = Fixture::new().await;
    f.join(6, 5, 1002, 42).await;
    f.join(7, 6, 1004, 37).await;
    f.send(LogEvent::DeadConnection {
        connection_id: ConnectionId::new(6),
    })
    .await;
    next(&mut f.sub.car_state).await;

    f.send(session(SessionType::Race, SessionPhase::Starting))
        .await;
    assert_eq!(next(&mut f.sub.session_state).await.session_type, SessionType::Race);
    let updates = f.updates(3).await;
    assert_eq!(purges_in(&updates), vec![1002]);
    // Car 1004 is published once for the lap reset and once when it moves up.
    assert_eq!(cars_in(&updates), vec![(1004, 1), (1004, 2)]);
    f.assert_settled().await;
    assert!(f.live.car(CarId::new(1002)).await.is_none());
}

#[tokio::test]
async fn reset_weekend_purges_driverless_cars() {
    let mut f = Fixture::new().await;
    f.join(6, 5, 1002, 42).await;
    f.join(7, 6, 1004, 37).await;
    f.join(8, 7, 1006, 12).await;
    f.send(LogEvent::DeadConnection {
        connection_id: ConnectionId::new(7),
    })
    .await;
    next(&mut f.sub.car_state).await;

    f.send(LogEvent::ResettingWeekend).await;
    let updates = f.updates(2).await;
    assert_eq!(purges_in(&updates), vec![1004]);
    assert_eq!(cars_in(&updates), vec![(1006, 2)]);
    f.assert_settled().await;
}

#[tokio::test]
async fn grid_position_is_published() {
    let mut f = Fixture::new().await;
    f.join(6, 5, 1002, 42).await;
    f.send(LogEvent::GridPosition {
        car_id: CarId::new(1002),
        position: 6,
    })
    .await;
    assert_eq!(next(&mut f.sub.car_state).await.position, 6);
    f.assert_settled().await;
}

// =============================================================================
// Laps and positions
// =============================================================================

#[tokio::test]
async fn lap_times_update_best_and_last_lap() {
    let mut f = Fixture::new().await;
    f.join(6, 5, 1002, 42).await;

    f.send(lap(1002, 123_456, 1_000, 0)).await;
    let car = next(&mut f.sub.car_state).await;
    assert_eq!((car.laps, car.best_lap_ms), (1, Some(123_456)));

    f.send(lap(1002, 120_000, 2_000, 1)).await;
    let car = next(&mut f.sub.car_state).await;
    assert_eq!((car.laps, car.best_lap_ms), (2, Some(123_456)));
    assert_eq!(car.last_lap.map(|l| l.lap_time_ms), Some(120_000));

    f.send(lap(1002, 123_000, 3_000, 0)).await;
    let car = next(&mut f.sub.car_state).await;
    assert_eq!((car.laps, car.best_lap_ms), (3, Some(123_000)));
    f.assert_settled().await;
}

#[tokio::test]
async fn qualifying_ranks_by_best_lap() {
    let mut f = Fixture::new().await;
    f.send(session(SessionType::Qualifying, SessionPhase::Session))
        .await;
    next(&mut f.sub.session_state).await;
    f.join(6, 5, 1002, 42).await;
    f.join(7, 6, 1004, 37).await;

    f.send(lap(1002, 123_050, 100, 0)).await;
    next(&mut f.sub.car_state).await;

    f.send(lap(1004, 123_040, 101, 0)).await;
    let updates = f.updates(3).await;
    assert_eq!(cars_in(&updates), vec![(1002, 2), (1004, 1), (1004, 2)]);
    f.assert_settled().await;

    let order: Vec<CarId> = f.live.snapshot().await.cars.iter().map(|c| c.car_id).collect();
    assert_eq!(order, vec![CarId::new(1004), CarId::new(1002)]);
}

#[tokio::test]
async fn race_ranks_by_laps_completed() {
    let mut f = Fixture::new().await;
    f.send(session(SessionType::Race, SessionPhase::Session)).await;
    next(&mut f.sub.session_state).await;
    f.join(6, 5, 1002, 42).await;
    f.join(7, 6, 1004, 37).await;

    f.send(lap(1004, 130_000, 100, 0)).await;
    let updates = f.updates(3).await;
    assert_eq!(cars_in(&updates), vec![(1002, 2), (1004, 1), (1004, 2)]);

    f.send(lap(1002, 125_000, 101, 0)).await;
    next(&mut f.sub.car_state).await;
    f.assert_settled().await;

    let snapshot = f.live.snapshot().await;
    let order: Vec<CarId> = snapshot.cars.iter().map(|c| c.car_id).collect();
    assert_eq!(order, vec![CarId::new(1004), CarId::new(1002)]);
}

#[tokio::test]
async fn flagged_race_lap_counts_without_reordering() {
    let mut f = Fixture::new().await;
    f.send(session(SessionType::Race, SessionPhase::Session)).await;
    next(&mut f.sub.session_state).await;
    f.join(6, 5, 1002, 42).await;
    f.join(7, 6, 1004, 37).await;

    f.send(lap(1004, 100_000, 100, 1)).await;
    let car = next(&mut f.sub.car_state).await;
    assert_eq!((car.car_id, car.laps, car.position), (CarId::new(1004), 1, 2));
    assert_eq!(car.best_lap_ms, None);
    f.assert_settled().await;

    f.send(lap(1004, 130_000, 101, 0)).await;
    let updates = f.updates(3).await;
    assert_eq!(cars_in(&updates), vec![(1002, 2), (1004, 1), (1004, 2)]);
    f.assert_settled().await;
}

#[tokio::test]
async fn laps_reset_on_session_change() {
    let mut f = Fixture::new().await;
    f.join(6, 5, 1002, 42).await;
    f.send(lap(1002, 123_456, 100, 0)).await;
    next(&mut f.sub.car_state).await;

    f.send(session(SessionType::Qualifying, SessionPhase::Session))
        .await;
    next(&mut f.sub.session_state).await;
    let car = next(&mut f.sub.car_state).await;
    assert_eq!((car.laps, car.best_lap_ms, car.last_lap), (0, None, None));
    f.assert_settled().await;
}

// =============================================================================
// Robustness
// =============================================================================

/// Catalog that panics on one track label.
struct TrappedCatalog(StaticCatalog);

impl Catalog for TrappedCatalog {
    fn track_by_label(&self, label: &str) -> Option<Arc<Track>> {
        assert_ne!(label, "trap", "catalog exploded");
        self.0.track_by_label(label)
    }

    fn car_model_by_id(&self, id: CarModelId) -> Option<Arc<CarModel>> {
        self.0.car_model_by_id(id)
    }
}

#[tokio::test]
async fn faulty_events_do_not_stop_the_pump() {
    let mut f = Fixture::with_catalog(Arc::new(TrappedCatalog(StaticCatalog::builtin()))).await;

    f.send(LogEvent::Track {
        track: String::from("trap"),
    })
    .await;
    f.send(lap(9999, 100_000, 1, 0)).await;
    f.send(LogEvent::GridPosition {
        car_id: CarId::new(9999),
        position: 1,
    })
    .await;
    f.send(LogEvent::Unknown).await;
    f.send(LogEvent::Track {
        track: String::from("spa"),
    })
    .await;

    assert_eq!(next(&mut f.sub.track).await.label, "spa");
    f.assert_settled().await;
    assert!(!f.handle.is_finished());
}

#[tokio::test]
async fn dropped_subscriber_is_pruned() {
    let mut f = Fixture::new().await;
    let extra = f.live.subscribe().await;
    assert_eq!(f.live.subscriber_count().await, 2);
    drop(extra);

    // The first marker triggers the prune; the second proves it finished.
    f.assert_settled().await;
    f.assert_settled().await;
    assert_eq!(f.live.subscriber_count().await, 1);
}

#[tokio::test]
async fn late_subscriber_sees_only_later_updates() {
    let mut f = Fixture::new().await;
    f.join(6, 5, 1002, 42).await;
    f.assert_settled().await;

    let mut late = f.live.subscribe().await;
    assert_eq!(f.live.snapshot().await.cars.len(), 1);
    f.send(LogEvent::LobbyConnectionSucceeded).await;
    assert_eq!(next(&mut late.server_state).await, ServerState::Online);
    assert_eq!(next(&mut f.sub.server_state).await, ServerState::Online);
    assert!(late.try_recv().is_none());
}

#[tokio::test]
async fn shutdown_closes_every_subscriber() {
    let mut f = Fixture::new().await;
    f.send(LogEvent::LobbyConnectionSucceeded).await;
    assert_eq!(next(&mut f.sub.server_state).await, ServerState::Online);
    let second = f.live.subscribe().await;

    let Fixture {
        live, sub, handle, ..
    } = f;
    timeout(WAIT, live.shutdown()).await.unwrap();

    assert_eq!(timeout(WAIT, sub.drain()).await.unwrap(), 0);
    assert_eq!(timeout(WAIT, second.drain()).await.unwrap(), 0);
    assert_eq!(timeout(WAIT, handle.join()).await.unwrap().unwrap(), InstanceExit::Superseded);

    let (_tx, rx) = mpsc::channel(1);
    assert!(matches!(live.start_instance(rx), Err(LiveStateError::ShutDown)));
    assert_eq!(timeout(WAIT, live.subscribe().await.drain()).await.unwrap(), 0);
}
