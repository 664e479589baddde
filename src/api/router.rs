use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;
use super::auth::{require_admin, require_auth};
use super::handlers;

pub fn create_router(state: AppState) -> Router {
    // Public routes, no authentication required
    let public = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::render));

    // User routes, Bearer token required when API_TOKEN is set
    let protected = Router::new()
        // Challenges
        .route("/api/challenges", get(handlers::challenges::list))
        .route("/api/challenges/:id/accept", post(handlers::challenges::accept))
        .route("/api/challenges/:id/cancel", post(handlers::challenges::cancel))
        // Join flow
        .route("/api/challenges/:id/join-sessions", post(handlers::join::open))
        .route(
            "/api/join-sessions/:sid",
            get(handlers::join::get)
                .put(handlers::join::update)
                .delete(handlers::join::close),
        )
        .route("/api/join-sessions/:sid/submit", post(handlers::join::submit))
        // WebSocket
        .route("/ws", get(handlers::ws::handler))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    // Admin routes, checked against ADMIN_API_TOKEN
    let admin = Router::new()
        .route("/api/admin/escrow", get(handlers::escrow::overview))
        .layer(middleware::from_fn_with_state(state.clone(), require_admin));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    public
        .merge(protected)
        .merge(admin)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
