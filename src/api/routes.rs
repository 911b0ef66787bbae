//! API Routes
//!
//! Configures the Axum router with all registry endpoints.

use axum::{
    routing::{get, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use super::handlers::{
    create_handler, delete_handler, get_by_id_handler, get_by_imei_handler, health_handler,
    list_handler, stats_handler, update_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
/// - Timeout: Cuts requests off after the configured request budget
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let timeout = TimeoutLayer::new(state.request_timeout);

    Router::new()
        .route("/telefonos", get(list_handler).post(create_handler))
        .route("/telefonos/imei/:imei", get(get_by_imei_handler))
        .route(
            "/telefonos/:id",
            put(update_handler)
                .get(get_by_id_handler)
                .delete(delete_handler),
        )
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(timeout)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
