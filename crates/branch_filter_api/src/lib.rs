//! Branch Filter HTTP relay
//!
//! This crate exposes the branch filter over HTTP. A source-control provider
//! posts pull request webhooks to it; the handler echoes the original headers
//! and body back only when the pull request targets an allowed branch. The
//! caller is expected to be a dispatcher that forwards the event onward only
//! on a non-empty successful response.
//!
//! # Architecture
//!
//! This crate exists in the HTTP layer and handles:
//! - Configuration loading from the environment
//! - Routing and server configuration
//! - Request tracing
//! - Mapping per-request failures to HTTP status codes
//!
//! All filtering decisions are made by `branch_filter_core`.
//! The dependency flows: HTTP API → Business Logic, never the reverse.

use std::sync::Arc;

use branch_filter_core::{AllowList, ConfigurationResult, WebhookClient};

pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;

// Re-export key types for convenience
pub use config::{LogFormat, RelayConfig};
pub use errors::RelayError;
pub use server::{RelayServer, ServerConfig};

/// Default listen port
pub const DEFAULT_PORT: u16 = 8080;

/// Default path the webhook handler is mounted at
pub const DEFAULT_WEBHOOK_PATH: &str = "/";

/// Path of the health check endpoint
pub const HEALTH_PATH: &str = "/health";

/// Default upper bound for buffered request bodies (25 MiB, GitHub's payload cap)
pub const DEFAULT_MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Application state shared across handlers
///
/// Built once at startup and never mutated. Cloning only bumps reference counts.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Branches pull requests may target
    pub allow_list: Arc<AllowList>,

    /// Provider client used to parse deliveries
    pub client: Arc<WebhookClient>,

    /// Maximum number of body bytes read per request
    pub max_body_bytes: usize,
}

impl AppState {
    /// Create new application state
    pub fn new(allow_list: AllowList, client: WebhookClient) -> Self {
        Self {
            allow_list: Arc::new(allow_list),
            client: Arc::new(client),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    /// Override the body size limit
    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    /// Build the allow-list and provider client described by `config`.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` if the allow-list is empty or the
    /// provider endpoint is malformed.
    pub fn from_config(config: &RelayConfig) -> ConfigurationResult<Self> {
        let allow_list = AllowList::try_new(&config.allowed_branches)?;
        let client = WebhookClient::resolve(config.provider, &config.endpoint)?;

        Ok(Self::new(allow_list, client).with_max_body_bytes(config.max_body_bytes))
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
