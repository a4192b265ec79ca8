//! Gogs webhook parser.

use url::Url;

use super::gitea::{parse_family, Flavor};
use crate::{SecretResolver, WebhookEvent, WebhookParseError, WebhookParser, WebhookRequest};

const GOGS: Flavor = Flavor {
    provider: "gogs",
    event_header: "X-Gogs-Event",
    signature_header: "X-Gogs-Signature",
};

/// Parser for self-hosted Gogs instances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GogsParser {
    endpoint: Option<Url>,
}

impl GogsParser {
    pub fn new(endpoint: Option<Url>) -> Self {
        Self { endpoint }
    }

    pub fn endpoint(&self) -> Option<&Url> {
        self.endpoint.as_ref()
    }
}

impl WebhookParser for GogsParser {
    fn parse(
        &self,
        request: &WebhookRequest,
        secrets: &dyn SecretResolver,
    ) -> Result<Option<WebhookEvent>, WebhookParseError> {
        parse_family(GOGS, request, secrets)
    }
}
