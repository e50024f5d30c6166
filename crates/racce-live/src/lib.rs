//! Live-state engine for a dedicated race server.
//!
//! Consumes the server's parsed event stream, keeps one consistent
//! in-memory picture of the session (connectivity, clients, track, session,
//! cars), and multicasts every change to any number of subscribers without
//! dropping an update.
//!
//! # Modules
//!
//! - [`store`] -- [`Store`], the state and its publishing mutators
//! - [`transition`] -- one handler per [`LogEvent`](racce_events::LogEvent)
//! - [`subscription`] -- [`Subscription`] endpoints and the multicast registry
//! - [`engine`] -- [`LiveState`], instance lifecycle and the event pump
//! - [`error`] -- [`TransitionError`] and [`LiveStateError`]

pub mod engine;
pub mod error;
pub mod store;
pub mod subscription;
pub mod transition;

pub use engine::{InstanceExit, InstanceHandle, LiveState};
pub use error::{LiveStateError, TransitionError};
pub use store::{ConnectionRequest, Store};
pub use subscription::Subscription;
