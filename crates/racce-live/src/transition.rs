//! Event-driven transitions of the live state.
//!
//! [`apply`] dispatches one [`LogEvent`] to its handler. Handlers only change
//! the [`Store`] through its mutators, so every change they make lands in the
//! store's outbox for delivery. Handlers run one at a time in arrival order.

use racce_catalog::Catalog;
use racce_events::{LapFlags, LogEvent};
use racce_types::{
    CarId, CarModelId, CarState, ConnectionId, Driver, LapRecord, ServerState, SessionPhase,
    SessionState, SessionType,
};
use tracing::debug;

use crate::error::TransitionError;
use crate::store::{ConnectionRequest, Store};

/// Apply one event to the store.
///
/// # Errors
///
/// Returns a [`TransitionError`] when the event cannot be applied. The store
/// keeps whatever the handler changed before it failed; no handler fails
/// after its first mutation.
pub fn apply(store: &mut Store, catalog: &dyn Catalog, event: LogEvent) -> Result<(), TransitionError> {
    match event {
        LogEvent::ServerStarting { .. } | LogEvent::LobbyConnectionFailed => {
            store.set_server_state(ServerState::NotRegistered);
        }
        LogEvent::LobbyConnectionSucceeded => store.set_server_state(ServerState::Online),
        LogEvent::NrClientsOnline { nr_clients } => store.set_nr_clients(nr_clients),
        LogEvent::Track { track } => handle_track(store, catalog, &track),
        LogEvent::SessionPhaseChanged {
            session_type,
            phase,
        } => handle_session_phase_changed(store, session_type, phase),
        LogEvent::NewConnectionRequest {
            connection_id,
            player_name,
            player_id,
            car_model_id,
        } => store.push_request(ConnectionRequest {
            connection_id,
            player_name,
            player_id,
            car_model_id,
        }),
        LogEvent::NewCarConnection {
            car_id,
            car_model_id,
            race_number,
        } => handle_new_car_connection(store, catalog, car_id, car_model_id, race_number),
        LogEvent::DeadConnection { connection_id } => handle_dead_connection(store, connection_id),
        LogEvent::CarPurged { car_id } => {
            store.purge_car(car_id);
            store.recalculate_positions();
        }
        LogEvent::ResettingWeekend => {
            store.purge_driverless_cars();
            store.recalculate_positions();
        }
        LogEvent::GridPosition { car_id, position } => {
            return handle_grid_position(store, car_id, position);
        }
        LogEvent::NewLapTime {
            car_id,
            lap_time_ms,
            timestamp_ms,
            flags,
        } => return handle_new_lap_time(store, car_id, lap_time_ms, timestamp_ms, flags),
        LogEvent::Unknown => {}
    }
    Ok(())
}

fn handle_track(store: &mut Store, catalog: &dyn Catalog, label: &str) {
    if let Some(track) = catalog.track_by_label(label) {
        store.set_track(track);
    } else {
        debug!(label, "ignoring unknown track");
    }
}

fn handle_session_phase_changed(store: &mut Store, session_type: SessionType, phase: SessionPhase) {
    let previous = store.session().session_type;
    store.set_session(SessionState {
        session_type,
        phase,
    });

    if previous != session_type {
        let purged = store.purge_driverless_cars();
        store.reset_laps();
        store.recalculate_positions();
        debug!(
            from = ?previous,
            to = ?session_type,
            purged = purged.len(),
            "session type changed, lap data reset"
        );
    }
}

fn handle_new_car_connection(
    store: &mut Store,
    catalog: &dyn Catalog,
    car_id: CarId,
    car_model_id: CarModelId,
    race_number: u32,
) {
    let mut car = store
        .car(car_id)
        .cloned()
        .unwrap_or_else(|| CarState::new(car_id, store.next_position()));
    car.race_number = race_number;
    car.car_model = catalog.car_model_by_id(car_model_id);
    if car.car_model.is_none() {
        debug!(%car_id, %car_model_id, "car connected with unknown model");
    }

    if let Some(request) = store.take_request_for_model(car_model_id) {
        let driver = Driver::from(request);
        store.bind_connection(driver.clone(), car_id);
        if car.current_driver.is_none() {
            car.current_driver = Some(driver.clone());
        }
        car.drivers.push(driver);
    }

    store.set_car(car);
}

fn handle_dead_connection(store: &mut Store, connection_id: ConnectionId) {
    store.drop_requests_from(connection_id);
    let (driver, car_id) = store.unbind_connection(connection_id);

    let Some(mut car) = car_id.and_then(|id| store.car(id).cloned()) else {
        return;
    };
    if let Some(driver) = driver {
        car.drivers.retain(|held| held != &driver);
    }
    store.set_car(car);
}

fn handle_grid_position(store: &mut Store, car_id: CarId, position: u32) -> Result<(), TransitionError> {
    if position == 0 {
        return Err(TransitionError::InvalidPosition { car_id, position });
    }
    let mut car = store
        .car(car_id)
        .cloned()
        .ok_or(TransitionError::UnknownCar(car_id))?;
    car.position = position;
    store.set_car(car);
    Ok(())
}

fn handle_new_lap_time(
    store: &mut Store,
    car_id: CarId,
    lap_time_ms: u32,
    timestamp_ms: u64,
    flags: LapFlags,
) -> Result<(), TransitionError> {
    let mut car = store
        .car(car_id)
        .cloned()
        .ok_or(TransitionError::UnknownCar(car_id))?;

    car.laps = car.laps.saturating_add(1);
    car.last_lap = Some(LapRecord {
        lap_time_ms,
        timestamp_ms,
    });
    let improved =
        flags.is_clean() && car.best_lap_ms.is_none_or(|best| lap_time_ms < best);
    if improved {
        car.best_lap_ms = Some(lap_time_ms);
    }
    store.set_car(car);

    // Flagged laps still count, but never move anyone.
    match store.session().session_type {
        SessionType::Race if flags.is_clean() => store.rank_by_race_progress(),
        SessionType::Practice | SessionType::Qualifying if improved => store.rank_by_best_lap(),
        SessionType::Race | SessionType::Practice | SessionType::Qualifying => {}
    }
    Ok(())
}
