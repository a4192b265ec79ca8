//! Webhook parsing capability and the pull request adapter.

use tracing::debug;

use crate::{
    NoSecret, ParseError, PullRequestEvent, SecretResolver, WebhookEvent, WebhookParseError,
    WebhookRequest,
};

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;

/// Decodes raw webhook deliveries from one provider into normalized events.
///
/// Implementations must be pure: the same request always yields the same
/// result and the request is only borrowed.
pub trait WebhookParser: Send + Sync {
    /// Parse `request`.
    ///
    /// Returns `Ok(None)` for deliveries that are recognized but carry no event,
    /// such as pings sent when a webhook is first configured.
    ///
    /// # Errors
    ///
    /// Returns [`WebhookParseError`] when the request is missing the provider's
    /// event header, names an unknown event, is malformed, or fails signature
    /// verification against a secret supplied by `secrets`.
    fn parse(
        &self,
        request: &WebhookRequest,
        secrets: &dyn SecretResolver,
    ) -> Result<Option<WebhookEvent>, WebhookParseError>;
}

/// Reduce `request` to a pull request event.
///
/// Signature verification is disabled ([`NoSecret`]). Every outcome other than
/// a pull request event is an error, so callers can fail closed.
///
/// # Errors
///
/// - [`ParseError::Webhook`] when the provider parser rejects the request
/// - [`ParseError::NoEvent`] when the delivery carries no event
/// - [`ParseError::UnsupportedEvent`] for any event that is not a pull request
pub fn parse_pull_request<P>(
    parser: &P,
    request: &WebhookRequest,
) -> Result<PullRequestEvent, ParseError>
where
    P: WebhookParser + ?Sized,
{
    match parser.parse(request, &NoSecret)? {
        Some(WebhookEvent::PullRequest(event)) => {
            debug!(
                action = %event.action,
                number = event.number,
                source_branch = %event.source_branch,
                target_branch = %event.target_branch,
                "Parsed pull request event"
            );
            Ok(event)
        }
        Some(WebhookEvent::Other { kind }) => Err(ParseError::UnsupportedEvent { kind }),
        None => Err(ParseError::NoEvent),
    }
}
