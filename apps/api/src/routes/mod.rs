pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Router,
};

use crate::analysis::handlers as analysis;
use crate::state::AppState;
use crate::store::handlers as store;

/// Uploaded résumés arrive inline (data URI or multipart).
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Analysis session
        .route(
            "/api/v1/analysis",
            get(analysis::handle_get_analysis).post(analysis::handle_start_analysis),
        )
        .route(
            "/api/v1/analysis/upload",
            post(analysis::handle_upload_analysis),
        )
        .route("/api/v1/analysis/simulate", post(analysis::handle_simulate))
        .route(
            "/api/v1/analysis/simulation",
            get(analysis::handle_get_simulation),
        )
        .route("/api/v1/analysis/rewrite", post(analysis::handle_rewrite))
        .route("/api/v1/resume/fresh", post(analysis::handle_fresh_resume))
        .route("/api/v1/diff", post(analysis::handle_diff))
        // Saved analyses
        .route(
            "/api/v1/analyses",
            get(store::handle_list_analyses).post(store::handle_save_analysis),
        )
        .route("/api/v1/analyses/:id", get(store::handle_get_analysis))
        .route(
            "/api/v1/analyses/:id/status",
            patch(store::handle_update_status),
        )
        .route(
            "/api/v1/analyses/:id/insights",
            post(store::handle_generate_insights),
        )
        .route(
            "/api/v1/resume-versions",
            get(store::handle_list_resume_versions).post(store::handle_save_resume_version),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
