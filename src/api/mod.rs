//! REST + WebSocket API module using Axum
//!
//! HTTP endpoints for the fleet dashboard and the `/ws` duplex channel
//! viewers stream over. UI rendering itself lives in external clients; this
//! module only serves data.

pub mod handlers;
mod routes;
pub mod ws;

pub use handlers::DashboardState;

use axum::http::{header, Method};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build a CORS layer that is restrictive by default (same-origin only).
///
/// Set `FLEETWATCH_CORS_ORIGINS` to a comma-separated list of allowed
/// origins for development (e.g., `http://localhost:5173` for a Vite dev
/// server).
fn build_cors_layer() -> CorsLayer {
    match std::env::var("FLEETWATCH_CORS_ORIGINS") {
        Ok(origins) => {
            let allowed: Vec<_> = origins
                .split(',')
                .filter_map(|o| o.trim().parse().ok())
                .collect();
            tracing::info!(origins = %origins, "CORS: allowing configured origins");
            CorsLayer::new()
                .allow_origin(allowed)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([header::CONTENT_TYPE])
        }
        Err(_) => CorsLayer::new()
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE]),
    }
}

/// Create the complete application router.
pub fn create_app(state: DashboardState) -> Router {
    let cors = build_cors_layer();

    Router::new()
        .nest("/api/v1", routes::api_routes(state.clone()))
        .merge(routes::root_routes(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}
