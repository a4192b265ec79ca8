use super::*;
use std::error::Error as StdError;

#[test]
fn test_empty_allow_list_error() {
    let error = ConfigurationError::EmptyAllowList;

    assert_eq!(
        error.to_string(),
        "Allowed branch list is empty; at least one branch must be allowed"
    );
    assert!(error.source().is_none());
}

#[test]
fn test_invalid_endpoint_error() {
    let error = ConfigurationError::InvalidEndpoint {
        endpoint: "not a url".to_string(),
        reason: "relative URL without a base".to_string(),
    };

    assert_eq!(
        error.to_string(),
        "Invalid provider endpoint 'not a url': relative URL without a base"
    );
}

#[test]
fn test_parse_error_kinds() {
    let webhook = ParseError::from(WebhookParseError::SignatureMismatch);
    assert_eq!(webhook.kind(), "webhook");
    assert_eq!(ParseError::NoEvent.kind(), "no_event");
    assert_eq!(
        ParseError::UnsupportedEvent {
            kind: "push".to_string()
        }
        .kind(),
        "unsupported_event"
    );
}

#[test]
fn test_parse_error_wraps_webhook_error_transparently() {
    let error = ParseError::from(WebhookParseError::MissingHeader {
        name: "X-GitHub-Event".to_string(),
    });

    assert_eq!(error.to_string(), "Missing required header: X-GitHub-Event");
}

#[test]
fn test_malformed_payload_keeps_source() {
    let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let error = WebhookParseError::from(json_error);

    assert!(error.to_string().starts_with("Malformed webhook payload"));
    assert!(error.source().is_some());
}
