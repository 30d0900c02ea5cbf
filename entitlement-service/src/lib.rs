pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;

use axum::middleware::{from_fn, from_fn_with_state};
use axum::{
    routing::{get, post, put},
    Router,
};
use service_core::middleware::rate_limit::{ip_rate_limit_middleware, IpRateLimit};
use service_core::middleware::tracing::request_id_middleware;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use config::Config;
use services::{BillingProvider, EntitlementStore, LimitEnforcer, TenantDirectory};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn EntitlementStore>,
    pub directory: Arc<dyn TenantDirectory>,
    pub billing: Arc<dyn BillingProvider>,
    pub limits: LimitEnforcer,
    pub rate_limit: IpRateLimit,
}

/// Build the service router over a prepared state.
///
/// Split from startup so tests can drive the same routes against the
/// in-memory store and mock billing provider.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        // Billing provider webhook; signed with the shared webhook secret,
        // so it is excluded from user auth and rate limiting.
        .route("/webhooks/billing", post(handlers::webhook::billing_webhook))
        .route(
            "/subscription",
            get(handlers::subscription::get_subscription),
        )
        // Public-facing billing mutation: rate limited per client IP.
        .route(
            "/subscription/status",
            put(handlers::subscription::update_status).route_layer(from_fn_with_state(
                state.rate_limit.clone(),
                ip_rate_limit_middleware,
            )),
        )
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .with_state(state)
}
