//! Error types for decoding and reading event sources.

/// Errors that can occur while turning input into [`LogEvent`](crate::LogEvent)s.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    /// A line was not a valid JSON-encoded event.
    #[error("malformed event on line {line}: {source}")]
    Decode {
        /// 1-based line number within the source.
        line: u64,
        /// The underlying JSON error.
        source: serde_json::Error,
    },

    /// Reading from the underlying source failed.
    #[error("failed to read event source: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}
