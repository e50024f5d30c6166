//! Error types for the live-state engine.
//!
//! [`TransitionError`] never leaves the engine: the pump logs it at the
//! per-event boundary and moves on to the next event.

use racce_types::CarId;

/// Why a single event could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    /// The event refers to a car that is not in the live state.
    #[error("car {0} is not live")]
    UnknownCar(CarId),

    /// A grid position outside `1..` was reported.
    #[error("invalid grid position {position} for car {car_id}")]
    InvalidPosition {
        /// The car being placed.
        car_id: CarId,
        /// The reported position.
        position: u32,
    },
}

/// Errors returned by the [`LiveState`](crate::LiveState) handle.
#[derive(Debug, thiserror::Error)]
pub enum LiveStateError {
    /// The engine was shut down permanently.
    #[error("live state engine has been shut down")]
    ShutDown,

    /// A pump task was cancelled or panicked outside a transition.
    #[error("event pump aborted: {source}")]
    PumpAborted {
        /// The underlying join error.
        #[from]
        source: tokio::task::JoinError,
    },
}
