//! The outbound change notification pushed to observers.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::ServerState;
use crate::ids::CarId;
use crate::structs::{CarState, SessionState, Track};

/// One published change of a single facet of the live state.
///
/// Serialized as `{"type": "<facet>", "data": <value>}` so dashboards can
/// dispatch on `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum LiveUpdate {
    /// Connectivity changed (or was re-announced).
    ServerState(ServerState),
    /// Client count reported by the server.
    NrClients(u32),
    /// The server loaded a track.
    Track(Arc<Track>),
    /// Session type or phase changed.
    SessionState(SessionState),
    /// Full snapshot of one car after any change to it.
    CarState(CarState),
    /// A car left the live state.
    CarPurged(CarId),
}

impl LiveUpdate {
    /// Facet name used as the `type` tag on the wire.
    pub const fn facet(&self) -> &'static str {
        match self {
            Self::ServerState(_) => "serverState",
            Self::NrClients(_) => "nrClients",
            Self::Track(_) => "track",
            Self::SessionState(_) => "sessionState",
            Self::CarState(_) => "carState",
            Self::CarPurged(_) => "carPurged",
        }
    }
}
