//! Route table of the observer.
//!
//! | Route | Handler |
//! |---|---|
//! | `GET /` | HTML status page |
//! | `GET /ws/live` | snapshot, then every live update |
//! | `GET /api/live` | full snapshot |
//! | `GET /api/cars` | cars in position order |
//! | `GET /api/cars/{id}` | one car |

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Read-only JSON endpoints, mounted under `/api`.
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/live", get(handlers::get_live))
        .route("/cars", get(handlers::list_cars))
        .route("/cars/{id}", get(handlers::get_car))
}

/// Build the observer router over `state`.
///
/// Every route is a `GET`; dashboards on other origins may call them.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/ws/live", get(ws::ws_live))
        .nest("/api", api_routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
