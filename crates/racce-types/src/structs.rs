//! Core records of the live state: reference data, drivers, cars, sessions.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{ServerState, SessionPhase, SessionType};
use crate::ids::{CarId, CarModelId, ConnectionId};

// ---------------------------------------------------------------------------
// Reference data
// ---------------------------------------------------------------------------

/// A circuit the server can host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Track {
    /// Label the server uses in its configuration and logs (e.g. `spa`).
    pub label: String,
    /// Human-readable circuit name.
    pub name: String,
    /// Country the circuit is located in.
    pub country: String,
}

/// Homologation class of a car model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export, export_to = "bindings/")]
pub enum CarClass {
    /// GT3 cars.
    Gt3,
    /// GT4 cars.
    Gt4,
    /// GT2 cars.
    Gt2,
    /// One-make cup cars.
    Cup,
    /// Lamborghini Super Trofeo cars.
    St,
    /// Ferrari Challenge cars.
    Chl,
    /// BMW M2 CS Racing cars.
    Tcx,
}

/// A car model the server can field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CarModel {
    /// Identifier used by the server for this model.
    pub id: CarModelId,
    /// Manufacturer and model name.
    pub name: String,
    /// Homologation class.
    pub class: CarClass,
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

/// Type and phase of the running session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SessionState {
    /// Practice, qualifying or race.
    pub session_type: SessionType,
    /// Position within the session timeline.
    pub phase: SessionPhase,
}

// ---------------------------------------------------------------------------
// Cars and drivers
// ---------------------------------------------------------------------------

/// A driver bound to one network connection.
///
/// Drivers are never mutated; they are only added to or removed from a car's
/// roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Driver {
    /// The connection this driver arrived on.
    pub connection_id: ConnectionId,
    /// Display name.
    pub name: String,
    /// Stable player identifier (e.g. a Steam id).
    pub player_id: String,
}

/// A completed lap as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LapRecord {
    /// Lap time in milliseconds.
    pub lap_time_ms: u32,
    /// Server timestamp at which the lap was completed, in milliseconds.
    pub timestamp_ms: u64,
}

/// Live state of a single car.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CarState {
    /// Identifier of the car.
    pub car_id: CarId,
    /// Number painted on the car.
    pub race_number: u32,
    /// Model record; `None` when the catalog does not know the model.
    pub car_model: Option<Arc<CarModel>>,
    /// Drivers associated with the car, in join order.
    pub drivers: Vec<Driver>,
    /// The driver in the car; the first to join unless reassigned.
    pub current_driver: Option<Driver>,
    /// 1-based classification position.
    pub position: u32,
    /// Number of laps completed in this session.
    pub laps: u32,
    /// Best clean lap in milliseconds.
    pub best_lap_ms: Option<u32>,
    /// Most recent lap, clean or not.
    pub last_lap: Option<LapRecord>,
}

impl CarState {
    /// Create a car with no drivers and no laps at the given position.
    pub const fn new(car_id: CarId, position: u32) -> Self {
        Self {
            car_id,
            race_number: 0,
            car_model: None,
            drivers: Vec::new(),
            current_driver: None,
            position,
            laps: 0,
            best_lap_ms: None,
            last_lap: None,
        }
    }

    /// Forget every lap of the current session.
    pub const fn reset_laps(&mut self) {
        self.laps = 0;
        self.best_lap_ms = None;
        self.last_lap = None;
    }

    /// Arrival timestamp of the last lap, if any lap was completed.
    pub fn last_lap_timestamp_ms(&self) -> Option<u64> {
        self.last_lap.map(|lap| lap.timestamp_ms)
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Consistent copy of every published facet of the live state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LiveSnapshot {
    /// Connectivity of the server.
    pub server_state: ServerState,
    /// Number of clients connected to the server.
    pub nr_clients: u32,
    /// Track currently loaded, once the server reported one.
    pub track: Option<Arc<Track>>,
    /// Current session.
    pub session: SessionState,
    /// All live cars ordered by position.
    pub cars: Vec<CarState>,
}
