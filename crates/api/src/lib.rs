//! HTTP API server with observability for the booking core.
//!
//! Provides REST endpoints for reservations, reactions and capacity, with
//! structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod seed;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch, post};
use domain::ServiceSettings;
use domain::ports::{InMemoryIdentityProvider, TracingAuditLog};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::{AppState, Backends};

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/reservations",
            post(routes::reservations::create).get(routes::reservations::list),
        )
        .route(
            "/reservations/{id}/cancel",
            patch(routes::reservations::cancel),
        )
        .route("/reactions", post(routes::reactions::toggle))
        .route("/reactions/{target_id}", get(routes::reactions::aggregate))
        .route("/reactions/{target_id}/me", get(routes::reactions::mine))
        .route("/inventory/{target_id}", get(routes::inventory::get))
        .route("/admin/reservations", get(routes::reservations::list_all))
        .route(
            "/admin/reservations/{id}/cancel",
            patch(routes::reservations::admin_cancel),
        )
        .route(
            "/admin/inventory/{target_id}/capacity",
            patch(routes::inventory::adjust_capacity),
        )
        .route(
            "/admin/reconciliation",
            get(routes::admin::reconciliation),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates application state on in-memory stores.
///
/// Returns the identity provider too, so callers can register tokens.
pub fn create_in_memory_state(
    settings: ServiceSettings,
) -> (Arc<AppState>, InMemoryIdentityProvider) {
    let identities = InMemoryIdentityProvider::new();
    let state = AppState::new(
        Backends::in_memory(),
        Arc::new(identities.clone()),
        Arc::new(TracingAuditLog),
        settings,
    );
    (Arc::new(state), identities)
}
