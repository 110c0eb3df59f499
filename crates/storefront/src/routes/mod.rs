//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Health check
//!
//! # Products
//! GET  /products/all?lang=              - All products, sorted by id
//! GET  /products/{category}?lang=       - Category listing (404 for unknown categories)
//!
//! # Reviews
//! GET  /products/{id}/reviews           - Reviews, newest first
//! POST /products/{id}/reviews           - Add review (signed-in user)
//! PUT  /products/{id}/reviews/{review}  - Edit review (author only)
//!
//! # Orders
//! GET  /orders                          - Cached local orders
//! POST /orders                          - Place order (checkout)
//! POST /orders/sync                     - Request an immediate status sync
//! POST /orders/{id}/status              - Record a payment decision
//! GET  /orders/events                   - Status change stream (SSE)
//! ```
//!
//! Category slugs and product ids share the `/products/{slug}` segment.

pub mod orders;
pub mod products;
pub mod reviews;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Create the product and review routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/all", get(products::all))
        .route("/{slug}", get(products::category))
        .route("/{slug}/reviews", get(reviews::list).post(reviews::create))
        .route("/{slug}/reviews/{review}", axum::routing::put(reviews::update))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index).post(orders::place))
        .route("/sync", post(orders::sync))
        .route("/events", get(orders::events))
        .route("/{id}/status", post(orders::record_status))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/products", product_routes())
        .nest("/orders", order_routes())
}

/// The complete application: routes, health check, request tracing.
///
/// Sentry layers are added by the binary.
pub fn app(state: AppState) -> axum::Router {
    Router::new()
        .route("/health", get(health))
        .merge(routes())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}
