//! Dashboard page handler

use axum::extract::State;
use axum::response::Html;

use crate::api::server::AppState;
use crate::dashboard::render_page;

/// Serve the live dashboard
pub async fn dashboard_page(State(state): State<AppState>) -> Html<String> {
    Html(render_page(state.config.dashboard.max_messages))
}
