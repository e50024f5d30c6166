//! Shared type definitions for the racce live-state engine.
//!
//! Every value the engine publishes to observers is defined here. Types flow
//! downstream to `TypeScript` via `ts-rs` for the live dashboard.
//!
//! # Modules
//!
//! - [`ids`] -- Newtype wrappers for car, connection and car-model ids
//! - [`enums`] -- Server connectivity and session enumerations
//! - [`structs`] -- Reference records, drivers, cars and the full snapshot
//! - [`update`] -- [`LiveUpdate`], the per-facet change notification

pub mod enums;
pub mod ids;
pub mod structs;
pub mod update;

pub use enums::{ServerState, SessionPhase, SessionType};
pub use ids::{CarId, CarModelId, ConnectionId};
pub use structs::{
    CarClass, CarModel, CarState, Driver, LapRecord, LiveSnapshot, SessionState, Track,
};
pub use update::LiveUpdate;
