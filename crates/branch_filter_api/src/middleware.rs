//! Request tracing middleware

use axum::{extract::Request, middleware::Next, response::Response};

#[cfg(test)]
#[path = "middleware_tests.rs"]
mod tests;

/// Log the start and completion of every request under a generated request id.
pub async fn tracing_middleware(request: Request, next: Next) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string();

    tracing::info!(
        request_id = %request_id,
        method = %request.method(),
        uri = %request.uri(),
        "Request started"
    );

    let response = next.run(request).await;

    tracing::info!(
        request_id = %request_id,
        status = %response.status(),
        "Request completed"
    );

    response
}
