//! Enumerations describing server connectivity and the session schedule.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Connectivity
// ---------------------------------------------------------------------------

/// Whether the race-server process is reachable and registered with the lobby.
///
/// `Offline` and `Starting` are only entered through the instance lifecycle;
/// `NotRegistered` and `Online` are only entered while an event source is
/// being pumped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ServerState {
    /// No server instance is running.
    #[default]
    Offline,
    /// A new instance was started but has not reported in yet.
    Starting,
    /// The server runs but is not registered with the matchmaking lobby.
    NotRegistered,
    /// The server runs and is registered with the lobby.
    Online,
}

impl ServerState {
    /// A server counts as running once it has reported it is up, whether or
    /// not the lobby accepted it.
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Online | Self::NotRegistered)
    }
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

/// The kind of session currently scheduled on the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum SessionType {
    /// Free practice. Cars are ranked by best lap.
    #[default]
    Practice,
    /// Qualifying. Cars are ranked by best lap.
    Qualifying,
    /// Race. Cars are ranked by laps completed.
    Race,
}

/// Where the current session is in its own timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum SessionPhase {
    /// No phase reported yet.
    #[default]
    #[serde(rename = "none")]
    None,
    /// The session is being set up.
    #[serde(rename = "starting")]
    Starting,
    /// Waiting for the formation lap to begin.
    #[serde(rename = "pre formation")]
    PreFormation,
    /// Formation lap in progress.
    #[serde(rename = "formation time")]
    FormationTime,
    /// Countdown before the session proper.
    #[serde(rename = "pre session")]
    PreSession,
    /// The session is live.
    #[serde(rename = "session")]
    Session,
    /// The clock ran out; cars are finishing their last lap.
    #[serde(rename = "session over")]
    SessionOver,
    /// Cool-down after the session.
    #[serde(rename = "post session")]
    PostSession,
    /// Results are being shown.
    #[serde(rename = "result UI")]
    ResultUi,
}
