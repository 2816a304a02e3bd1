pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::interview::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Session lifecycle
        .route(
            "/api/v1/interviews/session/start",
            post(handlers::handle_start_session),
        )
        .route(
            "/api/v1/interviews/session/message",
            post(handlers::handle_send_message),
        )
        .route(
            "/api/v1/interviews/session/end",
            post(handlers::handle_end_session),
        )
        // Manual result submission (works with or without a prior session)
        .route(
            "/api/v1/interviews/results",
            post(handlers::handle_submit_result),
        )
        // Read-only context fetch
        .route(
            "/api/v1/interviews/:attempt_id/context",
            get(handlers::handle_get_context),
        )
        .with_state(state)
}
