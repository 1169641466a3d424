use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::static_files::static_handler;
use super::state::AppState;

// UI Routes - web interface
pub fn ui_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::ui::index_handler))
        .route("/static/{*path}", get(static_handler))
}

// API Routes - JSON API used by the form and by scripts
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest(
            "/api",
            Router::new()
                // Sessions
                .route("/sessions/{session_id}", delete(handlers::api::delete_session))

                // Column table
                .route(
                    "/sessions/{session_id}/columns",
                    get(handlers::api::get_columns).put(handlers::api::replace_columns),
                )
                .route("/sessions/{session_id}/paste", post(handlers::api::paste_columns))
                .route("/sessions/{session_id}/term-columns", get(handlers::api::term_columns))

                // Query generation
                .route("/sessions/{session_id}/query", post(handlers::api::generate_query))
                .route(
                    "/sessions/{session_id}/query/download",
                    get(handlers::api::download_query),
                )

                // System status
                .route("/status", get(handlers::api::system_status))
        )
}
