//! Raw webhook request snapshot.

use bytes::Bytes;
use http::{header, HeaderMap};
use std::borrow::Cow;

use crate::WebhookParseError;

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Form field that carries the JSON payload in form-encoded deliveries.
const FORM_PAYLOAD_FIELD: &str = "payload";

/// Headers and body of one inbound webhook delivery.
///
/// The body is read from the network once and stored as [`Bytes`], so the
/// parser and the relay writer see the exact same buffer. Parsing only ever
/// borrows the snapshot.
#[derive(Debug, Clone)]
pub struct WebhookRequest {
    headers: HeaderMap,
    body: Bytes,
}

impl WebhookRequest {
    pub fn new(headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            headers,
            body: body.into(),
        }
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// First value of `name` as a string, if present and valid visible ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Like [`header`](Self::header) but a missing value is an error.
    pub fn required_header(&self, name: &str) -> Result<&str, WebhookParseError> {
        self.header(name)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| WebhookParseError::MissingHeader {
                name: name.to_string(),
            })
    }

    /// Media type of the body without parameters, lowercased.
    pub fn content_type(&self) -> Option<String> {
        self.header(header::CONTENT_TYPE.as_str()).map(|value| {
            value
                .split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase()
        })
    }

    /// JSON document carried by the request.
    ///
    /// Bodies are treated as JSON unless they are form-encoded. Form-encoded
    /// bodies are only accepted when `allow_form` is set, in which case the
    /// JSON is taken from the `payload` field.
    pub fn json_payload(&self, allow_form: bool) -> Result<Cow<'_, [u8]>, WebhookParseError> {
        let content_type = self.content_type();
        if content_type.as_deref() != Some(FORM_CONTENT_TYPE) {
            return Ok(Cow::Borrowed(&self.body));
        }

        if !allow_form {
            return Err(WebhookParseError::UnsupportedContentType {
                content_type: FORM_CONTENT_TYPE.to_string(),
            });
        }

        url::form_urlencoded::parse(&self.body)
            .find(|(key, _)| key == FORM_PAYLOAD_FIELD)
            .map(|(_, value)| Cow::Owned(value.into_owned().into_bytes()))
            .ok_or_else(|| WebhookParseError::MissingField {
                field: FORM_PAYLOAD_FIELD.to_string(),
            })
    }

    /// Split the snapshot back into its headers and body.
    pub fn into_parts(self) -> (HeaderMap, Bytes) {
        (self.headers, self.body)
    }
}
