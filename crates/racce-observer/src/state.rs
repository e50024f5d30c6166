//! Shared application state for the Observer API server.

use racce_live::LiveState;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`](std::sync::Arc) and injected via Axum's `State`
/// extractor. REST handlers read snapshots from the engine; each
/// `WebSocket` client holds its own engine subscription.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Handle to the live-state engine.
    pub live: LiveState,
}

impl AppState {
    /// Wrap an engine handle.
    pub const fn new(live: LiveState) -> Self {
        Self { live }
    }
}
