use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use super::handlers::{get_stats, health_check, record_event, record_pageview, AppState};

/// Build the API router
///
/// Beacon routes accept cross-origin POSTs so the public site may be served
/// from a different host than the API.
pub fn create_api_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    let beacon_routes = Router::new()
        .route("/pageview", post(record_pageview))
        .route("/event", post(record_event))
        .layer(cors);

    let analytics_routes = Router::new()
        .merge(beacon_routes)
        .route("/stats", get(get_stats))
        .with_state(state);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/analytics", analytics_routes)
}
