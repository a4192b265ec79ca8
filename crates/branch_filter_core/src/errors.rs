//! Error types for the branch filter.
//!
//! Configuration errors are fatal and only occur at startup. Parse errors are
//! local to a single webhook request and never cross request boundaries.

use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Startup configuration errors.
///
/// Any of these aborts startup before the relay begins listening.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("Allowed branch list is empty; at least one branch must be allowed")]
    EmptyAllowList,

    #[error("Invalid provider endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("Invalid configuration: {key} - {reason}")]
    InvalidSetting { key: String, reason: String },
}

/// Result type alias for configuration operations.
pub type ConfigurationResult<T> = Result<T, ConfigurationError>;

/// Failures raised by a provider parser while decoding a webhook delivery.
#[derive(Error, Debug)]
pub enum WebhookParseError {
    /// A header the provider always sends is absent.
    #[error("Missing required header: {name}")]
    MissingHeader { name: String },

    /// The event header names an event the provider parser does not know.
    #[error("Unknown {provider} webhook event: {event}")]
    UnknownEvent { provider: String, event: String },

    /// The request body is encoded in a way this provider never uses.
    #[error("Unsupported content type: {content_type}")]
    UnsupportedContentType { content_type: String },

    /// The body is not valid JSON or does not have the expected structure.
    #[error("Malformed webhook payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    /// The payload parsed but a field the relay relies on is empty.
    #[error("Webhook payload is missing field: {field}")]
    MissingField { field: String },

    /// A secret was supplied and the delivery's signature did not match it.
    #[error("Webhook signature does not match")]
    SignatureMismatch,
}

/// Classified outcome of reducing a request to a pull request event.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The provider parser rejected the request.
    #[error(transparent)]
    Webhook(#[from] WebhookParseError),

    /// The delivery was recognized but carried no event (e.g. a ping).
    #[error("Parsed webhook contained no event")]
    NoEvent,

    /// The delivery was a valid event of a kind other than pull request.
    #[error("Unsupported webhook event kind: {kind}")]
    UnsupportedEvent { kind: String },
}

impl ParseError {
    /// Short, stable name of the failure class for structured logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ParseError::Webhook(_) => "webhook",
            ParseError::NoEvent => "no_event",
            ParseError::UnsupportedEvent { .. } => "unsupported_event",
        }
    }
}
