//! Error handling and HTTP error conversion
//!
//! Per-request failures are fail-closed: every error maps to
//! `500 Internal Server Error` with an empty body so that an upstream
//! dispatcher never forwards a delivery the relay could not classify.
//! Details are only written to the log.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use branch_filter_core::ParseError;
use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Failures while handling a single webhook delivery
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Failed to read request body: {0}")]
    BodyRead(#[source] axum::Error),

    #[error("Failed to parse webhook: {0}")]
    Parse(#[from] ParseError),
}

impl RelayError {
    /// Short machine-readable name used as a log field
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::BodyRead(_) => "body_read",
            RelayError::Parse(e) => e.kind(),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        tracing::error!(kind = self.kind(), status = %status, "Webhook rejected: {}", self);

        status.into_response()
    }
}
