//! API route definitions

use axum::routing::{get, MethodRouter};
use axum::Router;

use super::handlers;
use super::server::AppState;

/// Create the API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Dashboard page
        .route("/", get(handlers::dashboard::dashboard_page))
        // Health check
        .route("/health", get(handlers::health::health_check))
        // Message endpoint; `/api/message` is the path the dashboard page uses
        .route("/message", message_routes())
        .route("/api/message", message_routes())
        .with_state(state)
}

fn message_routes() -> MethodRouter<AppState> {
    get(handlers::message::get_message).post(handlers::message::publish_message)
}
