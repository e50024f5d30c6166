//! The closed set of server events the live-state engine understands.

use racce_types::{CarId, CarModelId, ConnectionId, SessionPhase, SessionType};
use serde::{Deserialize, Serialize};

/// Flag word attached to a lap by the server.
///
/// Any set bit marks the lap as not clean (cut, pit lane, out lap, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LapFlags(pub u32);

impl LapFlags {
    /// A lap with no flags set.
    pub const CLEAN: Self = Self(0);

    /// Whether the lap counts toward the best lap.
    pub const fn is_clean(self) -> bool {
        self.0 == 0
    }
}

/// One parsed line of race-server output.
///
/// Encoded on the wire as an internally tagged JSON object, e.g.
/// `{"type": "new_car_connection", "car_id": 1001, "car_model_id": 24, "race_number": 42}`.
/// Event kinds this build does not know decode to [`LogEvent::Unknown`] and
/// are ignored by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LogEvent {
    /// The server process reported it is starting up.
    ServerStarting {
        /// Server build number.
        #[serde(default)]
        version: u32,
    },
    /// The server registered with the matchmaking lobby.
    LobbyConnectionSucceeded,
    /// The server lost or failed to obtain its lobby registration.
    LobbyConnectionFailed,
    /// Periodic report of the number of connected clients.
    NrClientsOnline {
        /// Number of clients.
        nr_clients: u32,
    },
    /// The server loaded a track.
    Track {
        /// Track label as used by the server.
        track: String,
    },
    /// The session type or phase changed.
    SessionPhaseChanged {
        /// New session type.
        session_type: SessionType,
        /// New session phase.
        phase: SessionPhase,
    },
    /// A client announced it wants to join with a car model.
    NewConnectionRequest {
        /// Connection the request arrived on.
        connection_id: ConnectionId,
        /// Display name of the player.
        player_name: String,
        /// Stable player identifier.
        player_id: String,
        /// Car model the player asked for.
        car_model_id: CarModelId,
    },
    /// A car entered the server.
    NewCarConnection {
        /// Identifier of the car.
        car_id: CarId,
        /// Model of the car.
        car_model_id: CarModelId,
        /// Race number of the car.
        race_number: u32,
    },
    /// A connection died.
    DeadConnection {
        /// The dead connection.
        connection_id: ConnectionId,
    },
    /// The server removed a car.
    CarPurged {
        /// The removed car.
        car_id: CarId,
    },
    /// The race weekend is being reset.
    ResettingWeekend,
    /// The server assigned a grid position.
    GridPosition {
        /// The car being placed.
        car_id: CarId,
        /// 1-based grid position.
        position: u32,
    },
    /// A car completed a lap.
    NewLapTime {
        /// The car that completed the lap.
        car_id: CarId,
        /// Lap time in milliseconds.
        lap_time_ms: u32,
        /// Server timestamp of lap completion, in milliseconds.
        timestamp_ms: u64,
        /// Validity flags of the lap.
        #[serde(default)]
        flags: LapFlags,
    },
    /// An event kind this build does not recognise.
    #[serde(other)]
    Unknown,
}

impl LogEvent {
    /// Short name of the event kind, for logging.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ServerStarting { .. } => "server_starting",
            Self::LobbyConnectionSucceeded => "lobby_connection_succeeded",
            Self::LobbyConnectionFailed => "lobby_connection_failed",
            Self::NrClientsOnline { .. } => "nr_clients_online",
            Self::Track { .. } => "track",
            Self::SessionPhaseChanged { .. } => "session_phase_changed",
            Self::NewConnectionRequest { .. } => "new_connection_request",
            Self::NewCarConnection { .. } => "new_car_connection",
            Self::DeadConnection { .. } => "dead_connection",
            Self::CarPurged { .. } => "car_purged",
            Self::ResettingWeekend => "resetting_weekend",
            Self::GridPosition { .. } => "grid_position",
            Self::NewLapTime { .. } => "new_lap_time",
            Self::Unknown => "unknown",
        }
    }
}
