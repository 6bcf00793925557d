use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handler;
use crate::state::AppState;

/// Build the axum router with all history endpoints.
///
/// Static `versions/*` segments are registered before `versions/:version`
/// so they are never parsed as version ids.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route("/v1/info", get(handler::info_handler))
        .route(
            "/v1/documents/:id",
            get(handler::get_document).put(handler::put_document),
        )
        .route(
            "/v1/documents/:id/versions",
            get(handler::list_history).post(handler::create_snapshot),
        )
        .route(
            "/v1/documents/:id/versions/compare",
            get(handler::compare_versions),
        )
        .route(
            "/v1/documents/:id/versions/previous",
            get(handler::compare_previous),
        )
        .route(
            "/v1/documents/:id/versions/restore",
            post(handler::restore_version),
        )
        .route(
            "/v1/documents/:id/versions/validate",
            get(handler::validate_chain),
        )
        .route(
            "/v1/documents/:id/versions/:version",
            get(handler::get_snapshot),
        )
        .route(
            "/v1/documents/:id/versions/:version/live",
            get(handler::compare_live),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
