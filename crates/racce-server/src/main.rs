//! Live-state server binary.
//!
//! Wires the reference catalog, the live-state engine and the observer API
//! together, then feeds the engine from the configured event sources.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `racce-config.yaml` (or `RACCE_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Load the built-in reference catalog
//! 4. Create the live-state engine
//! 5. Start the observer API server
//! 6. Replay each event source as one server instance
//! 7. Serve until `Ctrl-C`, then shut the engine down

mod config;
mod error;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use racce_catalog::StaticCatalog;
use racce_events::{DEFAULT_CAPACITY, EventError, LogEvent, ReadStats};
use racce_live::LiveState;
use racce_observer::{AppState, ServerConfig};
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::ServerAppConfig;
use crate::error::ServerAppError;

/// Application entry point for the live-state server.
///
/// # Errors
///
/// Returns an error if configuration, the observer, or an event source
/// fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config_path = ServerAppConfig::path();
    let (config, config_found) = load_config(&config_path)?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("racce-server starting");
    if config_found {
        info!(path = %config_path.display(), "Configuration loaded");
    } else {
        info!(path = %config_path.display(), "Config file not found, using defaults");
    }

    // 3. Reference catalog.
    let catalog = StaticCatalog::builtin();
    info!(
        tracks = catalog.track_count(),
        car_models = catalog.car_model_count(),
        "Reference catalog loaded"
    );

    // 4. Live-state engine.
    let live = LiveState::new(Arc::new(catalog));

    // 5. Observer API server.
    let observer_config = ServerConfig {
        host: config.observer.host.clone(),
        port: config.observer.port,
    };
    let observer = racce_observer::spawn_observer(
        observer_config,
        Arc::new(AppState::new(live.clone())),
    )
    .map_err(ServerAppError::from)?;

    // 6. Feed the engine.
    let mut feeder = tokio::spawn(feed_sources(live.clone(), config.events.paths.clone()));

    // 7. Serve until interrupted.
    let mut feeding = true;
    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.map_err(|source| ServerAppError::Signal { source })?;
                info!("Interrupt received, shutting down");
                break;
            }
            result = &mut feeder, if feeding => {
                feeding = false;
                match result.map_err(ServerAppError::from)? {
                    Ok(()) => info!("All event sources replayed, still serving"),
                    Err(e) => warn!(error = %e, "Event feeding stopped"),
                }
            }
        }
    }

    feeder.abort();
    live.shutdown().await;
    observer.abort();
    info!("racce-server shutdown complete");
    Ok(())
}

/// Load configuration, falling back to defaults when the file is absent.
fn load_config(path: &Path) -> Result<(ServerAppConfig, bool), ServerAppError> {
    if path.exists() {
        Ok((ServerAppConfig::from_file(path)?, true))
    } else {
        let mut config = ServerAppConfig::default();
        config.observer.apply_env_overrides()?;
        Ok((config, false))
    }
}

/// Replay every configured source in order, one instance each. With no
/// paths, standard input is the only source.
async fn feed_sources(live: LiveState, paths: Vec<PathBuf>) -> Result<(), ServerAppError> {
    if paths.is_empty() {
        info!("No event paths configured, reading standard input");
        let (events, reader) =
            racce_events::spawn_reader(BufReader::new(tokio::io::stdin()), DEFAULT_CAPACITY);
        return run_instance(&live, "stdin", events, reader).await;
    }

    for path in paths {
        let (events, reader) = racce_events::open_file(&path, DEFAULT_CAPACITY).await?;
        run_instance(&live, &path.display().to_string(), events, reader).await?;
    }
    Ok(())
}

/// Make one source current and wait until its pump and reader finish.
async fn run_instance(
    live: &LiveState,
    source: &str,
    events: mpsc::Receiver<LogEvent>,
    reader: JoinHandle<Result<ReadStats, EventError>>,
) -> Result<(), ServerAppError> {
    let instance = live.start_instance(events)?;
    info!(source, generation = instance.generation(), "Replaying event source");

    let exit = instance.join().await?;
    let stats = reader.await??;
    info!(
        source,
        ?exit,
        lines = stats.lines,
        forwarded = stats.forwarded,
        malformed = stats.malformed,
        "Event source finished"
    );
    Ok(())
}
