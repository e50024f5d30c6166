//! Observer API server for the racce live-state engine.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **`WebSocket` endpoint** (`/ws/live`) sending a full snapshot, then
//!   every live update as `{"type": <facet>, "data": <value>}`
//! - **REST endpoints** for the current snapshot and per-car state
//! - **Minimal HTML status page** (`GET /`)
//!
//! # Architecture
//!
//! REST reads take a consistent snapshot from the engine. Each `WebSocket`
//! client holds its own engine subscription, so updates reach it in order
//! and are never skipped; a client that stops reading slows the engine.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod ws;

pub use error::ObserverError;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use startup::{StartupError, spawn_observer};
pub use state::AppState;
