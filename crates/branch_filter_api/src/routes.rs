//! HTTP routing configuration
//!
//! # Route Structure
//!
//! - ANY {webhook path} - Filter and relay a webhook delivery (default `/`)
//! - GET /health        - Health check
//!
//! A webhook path ending in `/` covers its whole subtree, so the default `/`
//! accepts deliveries on any path. `/health` is matched first.

use axum::{
    middleware,
    routing::{any, get},
    Router,
};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};

use crate::{handlers, middleware as relay_middleware, AppState, HEALTH_PATH};

/// Create the relay router.
///
/// The webhook handler accepts every method so that non-POST requests are
/// answered with an empty 200 rather than 405.
pub fn create_router(state: AppState, webhook_path: &str) -> Router {
    // Headers are left out of the span; deliveries may carry signatures and tokens
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new())
        .on_response(DefaultOnResponse::new());

    let mut router: Router<AppState> =
        Router::new().route(webhook_path, any(handlers::handle_webhook));
    if webhook_path == "/" {
        router = router.fallback(handlers::handle_webhook);
    } else if webhook_path.ends_with('/') {
        router = router.route(
            &format!("{}*rest", webhook_path),
            any(handlers::handle_webhook),
        );
    }

    router
        .route(HEALTH_PATH, get(handlers::health_check))
        .layer(middleware::from_fn(relay_middleware::tracing_middleware))
        .layer(trace_layer)
        .with_state(state)
}

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;
