//! REST endpoint handlers for the Observer server.
//!
//! All handlers read a consistent snapshot from the engine through the
//! shared [`AppState`].
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/api/live` | Full live snapshot |
//! | `GET` | `/api/cars` | Cars ordered by position |
//! | `GET` | `/api/cars/{id}` | Single car |

use std::fmt::Write as _;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse};
use racce_types::CarId;

use crate::error::ObserverError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page showing the live state and API links.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.live.snapshot().await;
    let server_state = format!("{:?}", snapshot.server_state);
    let status_class = if snapshot.server_state.is_running() {
        "running"
    } else {
        "stopped"
    };
    let nr_clients = snapshot.nr_clients;
    let track = snapshot
        .track
        .as_ref()
        .map_or_else(|| String::from("-"), |track| track.name.clone());
    let session = format!(
        "{:?} / {:?}",
        snapshot.session.session_type, snapshot.session.phase
    );

    let mut rows = String::new();
    for car in &snapshot.cars {
        let driver = car
            .current_driver
            .as_ref()
            .map_or("-", |driver| driver.name.as_str());
        let model = car.car_model.as_ref().map_or("-", |model| model.name.as_str());
        let best = car
            .best_lap_ms
            .map_or_else(|| String::from("-"), format_lap_time);
        let _ = write!(
            rows,
            "<tr><td>{}</td><td>#{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            car.position, car.race_number, driver, model, car.laps, best
        );
    }

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Racce Live</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 900px;
            margin: 0 auto;
        }}
        h1 {{ color: #58a6ff; margin-bottom: 0.25rem; }}
        .metric {{
            display: inline-block;
            background: #161b22;
            border: 1px solid #30363d;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
            min-width: 120px;
        }}
        .metric .label {{ color: #8b949e; font-size: 0.85rem; }}
        .metric .value {{ color: #58a6ff; font-size: 1.25rem; font-weight: bold; }}
        .running {{ color: #3fb950; font-weight: bold; }}
        .stopped {{ color: #f85149; font-weight: bold; }}
        table {{ border-collapse: collapse; width: 100%; }}
        td, th {{ border-bottom: 1px solid #30363d; padding: 0.3rem 0.6rem; text-align: left; }}
        a {{ color: #58a6ff; text-decoration: none; }}
        ul {{ list-style: none; padding: 0; }}
        li::before {{ content: "GET "; color: #7ee787; font-weight: bold; }}
        hr {{ border: none; border-top: 1px solid #30363d; margin: 1.5rem 0; }}
    </style>
</head>
<body>
    <h1>Racce Live</h1>
    <p>Server: <span class="{status_class}">{server_state}</span></p>

    <div>
        <div class="metric">
            <div class="label">Clients</div>
            <div class="value">{nr_clients}</div>
        </div>
        <div class="metric">
            <div class="label">Track</div>
            <div class="value">{track}</div>
        </div>
        <div class="metric">
            <div class="label">Session</div>
            <div class="value">{session}</div>
        </div>
    </div>

    <hr>

    <table>
        <tr><th>Pos</th><th>No.</th><th>Driver</th><th>Car</th><th>Laps</th><th>Best</th></tr>
        {rows}
    </table>

    <hr>

    <h2>API Endpoints</h2>
    <ul>
        <li><a href="/api/live">/api/live</a> -- Full live snapshot</li>
        <li><a href="/api/cars">/api/cars</a> -- Cars by position</li>
        <li><a href="/api/cars/{{id}}">/api/cars/{{id}}</a> -- Single car</li>
    </ul>

    <h2>WebSocket</h2>
    <ul>
        <li style="list-style:none;"><code>ws://host:port/ws/live</code> -- Snapshot, then every live update</li>
    </ul>
</body>
</html>"#
    ))
}

/// Render milliseconds as `m:ss.mmm`.
fn format_lap_time(ms: u32) -> String {
    let minutes = ms / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;
    format!("{minutes}:{seconds:02}.{millis:03}")
}

// ---------------------------------------------------------------------------
// GET /api/live -- full snapshot
// ---------------------------------------------------------------------------

/// Return the full live snapshot.
pub async fn get_live(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.live.snapshot().await)
}

// ---------------------------------------------------------------------------
// GET /api/cars -- cars by position
// ---------------------------------------------------------------------------

/// List every live car ordered by position.
pub async fn list_cars(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let cars = state.live.snapshot().await.cars;
    Json(serde_json::json!({
        "count": cars.len(),
        "cars": cars,
    }))
}

// ---------------------------------------------------------------------------
// GET /api/cars/{id} -- single car
// ---------------------------------------------------------------------------

/// Return one car's full state.
pub async fn get_car(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    let raw: u32 = id_str
        .parse()
        .map_err(|e| ObserverError::InvalidId(format!("{id_str}: {e}")))?;
    let car_id = CarId::new(raw);

    let car = state
        .live
        .car(car_id)
        .await
        .ok_or_else(|| ObserverError::NotFound(format!("car {car_id}")))?;
    Ok(Json(car))
}
