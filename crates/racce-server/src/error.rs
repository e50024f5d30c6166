//! Error types for the racce server binary.

/// Top-level error for the server binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum ServerAppError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: crate::config::ConfigError,
    },

    /// An event source could not be opened or read.
    #[error("event source error: {source}")]
    Events {
        /// The underlying event error.
        #[from]
        source: racce_events::EventError,
    },

    /// The live-state engine refused or lost an instance.
    #[error("live state error: {source}")]
    Live {
        /// The underlying engine error.
        #[from]
        source: racce_live::LiveStateError,
    },

    /// Observer API server failed to start.
    #[error("observer error: {source}")]
    Observer {
        /// The underlying startup error.
        #[from]
        source: racce_observer::StartupError,
    },

    /// A background task panicked or was cancelled.
    #[error("task failed: {source}")]
    Task {
        /// The underlying join error.
        #[from]
        source: tokio::task::JoinError,
    },

    /// Waiting for the interrupt signal failed.
    #[error("signal error: {source}")]
    Signal {
        /// The underlying I/O error.
        source: std::io::Error,
    },
}
