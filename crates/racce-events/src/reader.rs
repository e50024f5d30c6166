//! JSON-lines event sources.
//!
//! The log parser in front of the engine writes one JSON-encoded
//! [`LogEvent`] per line. [`spawn_reader`] turns any buffered async reader
//! into the ordered channel the engine pumps from. Malformed lines are
//! logged and skipped so a single bad line never ends an instance.

use std::path::Path;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::EventError;
use crate::event::LogEvent;

/// Default capacity of the channel between a reader and the engine.
pub const DEFAULT_CAPACITY: usize = 64;

/// Counters reported when a reader finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadStats {
    /// Lines read, including blank and malformed ones.
    pub lines: u64,
    /// Events forwarded to the engine.
    pub forwarded: u64,
    /// Lines that could not be decoded.
    pub malformed: u64,
}

/// Decode a single line.
///
/// Returns `Ok(None)` for blank lines.
///
/// # Errors
///
/// Returns [`EventError::Decode`] if the line is not a valid event.
pub fn decode_line(line_number: u64, line: &str) -> Result<Option<LogEvent>, EventError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(trimmed)
        .map(Some)
        .map_err(|source| EventError::Decode {
            line: line_number,
            source,
        })
}

/// Spawn a task that reads `reader` line by line and forwards decoded
/// events on the returned channel.
///
/// The channel closes when the reader reaches end of input, which the
/// engine treats as the server going offline. If the receiving side is
/// dropped (for example because the instance was superseded) the task
/// stops reading.
pub fn spawn_reader<R>(
    reader: R,
    capacity: usize,
) -> (mpsc::Receiver<LogEvent>, JoinHandle<Result<ReadStats, EventError>>)
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let handle = tokio::spawn(forward_lines(reader, tx));
    (rx, handle)
}

/// Open a JSON-lines file and spawn a reader for it.
///
/// # Errors
///
/// Returns [`EventError::Io`] if the file cannot be opened.
pub async fn open_file(
    path: &Path,
    capacity: usize,
) -> Result<(mpsc::Receiver<LogEvent>, JoinHandle<Result<ReadStats, EventError>>), EventError> {
    let file = tokio::fs::File::open(path).await?;
    Ok(spawn_reader(BufReader::new(file), capacity))
}

async fn forward_lines<R>(reader: R, tx: mpsc::Sender<LogEvent>) -> Result<ReadStats, EventError>
where
    R: AsyncBufRead + Unpin,
{
    let mut stats = ReadStats::default();
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        stats.lines = stats.lines.saturating_add(1);
        match decode_line(stats.lines, &line) {
            Ok(Some(event)) => {
                if tx.send(event).await.is_err() {
                    debug!(line = stats.lines, "event receiver dropped, stopping reader");
                    return Ok(stats);
                }
                stats.forwarded = stats.forwarded.saturating_add(1);
            }
            Ok(None) => {}
            Err(e) => {
                stats.malformed = stats.malformed.saturating_add(1);
                warn!(error = %e, "skipping malformed event line");
            }
        }
    }

    debug!(
        lines = stats.lines,
        forwarded = stats.forwarded,
        malformed = stats.malformed,
        "event source exhausted"
    );
    Ok(stats)
}
