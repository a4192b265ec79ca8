//! HTTP request handlers
//!
//! # Webhook handler
//!
//! | Outcome                                   | Status | Body            |
//! |-------------------------------------------|--------|-----------------|
//! | Method other than POST                    | 200    | empty           |
//! | Body could not be read                    | 500    | empty           |
//! | Delivery is not a pull request event      | 500    | empty           |
//! | Pull request targets a disallowed branch  | 204    | empty           |
//! | Pull request targets an allowed branch    | 200    | original body   |
//!
//! On the relay path every end-to-end request header is copied to the
//! response, including repeated headers, and the body is returned byte for
//! byte. Connection-level headers (`Host`, `Transfer-Encoding`, `Connection`
//! and the headers it names, and the other hop-by-hop headers) belong to the
//! inbound connection and are not echoed; the server frames the response itself.

use axum::{
    body::{to_bytes, Body, Bytes},
    extract::{Request, State},
    http::{header, HeaderMap, HeaderName, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use branch_filter_core::{parse_pull_request, WebhookRequest};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{errors::RelayError, AppState};

/// ANY {webhook path}
///
/// Filter a pull request webhook by its target branch.
///
/// # Errors
///
/// Returns [`RelayError`] when the body cannot be read or the delivery is not
/// a pull request event. Both map to `500 Internal Server Error`.
pub async fn handle_webhook(
    State(state): State<AppState>,
    request: Request,
) -> Result<Response, RelayError> {
    if request.method() != Method::POST {
        info!(method = %request.method(), "Ignoring non-POST request");
        return Ok(StatusCode::OK.into_response());
    }

    let (parts, body) = request.into_parts();
    let body = to_bytes(body, state.max_body_bytes)
        .await
        .map_err(RelayError::BodyRead)?;

    let webhook = WebhookRequest::new(parts.headers, body);
    let event = parse_pull_request(state.client.as_ref(), &webhook)?;

    if !state.allow_list.contains(&event.target_branch) {
        info!(
            target_branch = %event.target_branch,
            repository = %event.repository,
            number = event.number,
            "Target branch not allowed, dropping pull request event"
        );
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    info!(
        target_branch = %event.target_branch,
        repository = %event.repository,
        number = event.number,
        action = %event.action,
        "Relaying pull request event"
    );

    let (headers, body) = webhook.into_parts();
    Ok(relay_response(headers, body))
}

/// Headers that describe the inbound connection rather than the delivery.
const CONNECTION_HEADERS: [HeaderName; 8] = [
    header::HOST,
    header::CONNECTION,
    header::TRANSFER_ENCODING,
    header::CONTENT_LENGTH,
    header::TE,
    header::TRAILER,
    header::UPGRADE,
    header::PROXY_AUTHORIZATION,
];

/// Echo `headers` and `body` back with status 200.
fn relay_response(mut headers: HeaderMap, body: Bytes) -> Response {
    strip_connection_headers(&mut headers);

    let mut response = Response::new(Body::from(body));
    *response.headers_mut() = headers;
    response
}

/// Remove hop-by-hop headers, including any listed in `Connection`.
fn strip_connection_headers(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed.iter().chain(CONNECTION_HEADERS.iter()) {
        headers.remove(name);
    }
    for name in ["keep-alive", "proxy-connection"] {
        headers.remove(name);
    }
}

/// GET /health
///
/// Returns service health status with version, timestamp and provider.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        provider: state.client.provider().to_string(),
    })
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckResponse {
    /// Always "healthy" while the process is serving
    pub status: String,

    /// Service version
    pub version: String,

    /// Current timestamp (RFC 3339)
    pub timestamp: String,

    /// Configured source-control provider
    pub provider: String,
}

#[cfg(test)]
#[path = "handlers_tests.rs"]
mod tests;
