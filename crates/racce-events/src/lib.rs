//! Inbound events for the racce live-state engine.
//!
//! The engine consumes a single ordered stream of typed events produced by
//! a log-tailing parser that sits in front of it. This crate defines that
//! event type and the JSON-lines plumbing used to feed it from files or
//! standard input.
//!
//! # Modules
//!
//! - [`event`] -- [`LogEvent`], the closed sum type of server events
//! - [`reader`] -- Async JSON-lines reader producing an event channel
//! - [`error`] -- [`EventError`]

pub mod error;
pub mod event;
pub mod reader;

pub use error::EventError;
pub use event::{LapFlags, LogEvent};
pub use reader::{decode_line, open_file, spawn_reader, ReadStats, DEFAULT_CAPACITY};
