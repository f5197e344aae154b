pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};

use crate::state::AppState;
use crate::workflow::handlers;

pub fn build_router(state: AppState) -> Router {
    let max_resume_bytes = state.config.max_resume_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // AutoApply sessions
        .route(
            "/api/v1/autoapply/sessions",
            post(handlers::handle_create_session),
        )
        .route(
            "/api/v1/autoapply/sessions/:id",
            get(handlers::handle_get_session).delete(handlers::handle_close_session),
        )
        .route(
            "/api/v1/autoapply/sessions/:id/job",
            put(handlers::handle_update_job),
        )
        .route(
            "/api/v1/autoapply/sessions/:id/resume",
            put(handlers::handle_upload_resume)
                .layer(DefaultBodyLimit::max(max_resume_bytes))
                .delete(handlers::handle_clear_resume),
        )
        .route(
            "/api/v1/autoapply/sessions/:id/analyze",
            post(handlers::handle_analyze),
        )
        .with_state(state)
}
