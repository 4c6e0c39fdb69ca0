//! API Routes
//!
//! Configures the Axum router with all lookup service endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    get_record_by_slug_handler, get_record_handler, health_handler, stats_handler, warm_handler,
    AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /records/:id` - Record by primary key
/// - `GET /records/by-slug/:slug` - Record by slug
/// - `POST /warm` - Rebuild the table index
/// - `GET /stats` - Cache statistics
/// - `GET /health` - Health check endpoint
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/records/:id", get(get_record_handler))
        .route("/records/by-slug/:slug", get(get_record_by_slug_handler))
        .route("/warm", post(warm_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
