//! Bitbucket Cloud webhook parser.

use serde::Deserialize;
use url::Url;

use super::{decode, require, unknown_event};
use crate::signature::{authenticate, verify_hmac_sha256};
use crate::{
    PullRequestAction, PullRequestEvent, SecretResolver, WebhookEvent, WebhookParseError,
    WebhookParser, WebhookRequest,
};

#[cfg(test)]
#[path = "bitbucket_tests.rs"]
mod tests;

const EVENT_HEADER: &str = "X-Event-Key";
const SIGNATURE_HEADER: &str = "X-Hub-Signature";

/// Event key prefixes for non-pull-request events.
const OTHER_PREFIXES: &[&str] = &["repo:", "issue:", "project:"];

/// Parser for bitbucket.org deliveries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitbucketParser {
    endpoint: Option<Url>,
}

impl BitbucketParser {
    pub fn new(endpoint: Option<Url>) -> Self {
        Self { endpoint }
    }

    pub fn endpoint(&self) -> Option<&Url> {
        self.endpoint.as_ref()
    }
}

impl WebhookParser for BitbucketParser {
    fn parse(
        &self,
        request: &WebhookRequest,
        secrets: &dyn SecretResolver,
    ) -> Result<Option<WebhookEvent>, WebhookParseError> {
        let event_key = request.required_header(EVENT_HEADER)?;

        let event = match pull_request_action(event_key) {
            Some(action) => {
                let payload: PullRequestPayload = decode(&request.json_payload(false)?)?;
                Some(WebhookEvent::PullRequest(payload.into_event(action)?))
            }
            // Comments, approvals and change requests on pull requests.
            None if event_key.starts_with("pullrequest:") => Some(WebhookEvent::other(event_key)),
            None if OTHER_PREFIXES.iter().any(|p| event_key.starts_with(p)) => {
                Some(WebhookEvent::other(event_key))
            }
            None => return Err(unknown_event("bitbucket", event_key)),
        };

        authenticate(event, secrets, |secret| {
            let signature = request.required_header(SIGNATURE_HEADER)?;
            verify_hmac_sha256(secret, request.body(), signature)
        })
    }
}

/// Action for event keys that describe a pull request lifecycle change.
fn pull_request_action(event_key: &str) -> Option<PullRequestAction> {
    match event_key {
        "pullrequest:created" => Some(PullRequestAction::Open),
        "pullrequest:updated" => Some(PullRequestAction::Sync),
        "pullrequest:fulfilled" => Some(PullRequestAction::Merge),
        "pullrequest:rejected" => Some(PullRequestAction::Close),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct PullRequestPayload {
    pullrequest: PullRequest,
    #[serde(default)]
    repository: Repository,
    #[serde(default)]
    actor: Actor,
}

#[derive(Debug, Deserialize)]
struct PullRequest {
    #[serde(default)]
    id: u64,
    #[serde(default)]
    title: String,
    source: Endpoint,
    destination: Endpoint,
}

#[derive(Debug, Deserialize)]
struct Endpoint {
    branch: Branch,
}

#[derive(Debug, Deserialize)]
struct Branch {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct Repository {
    #[serde(default)]
    full_name: String,
}

#[derive(Debug, Default, Deserialize)]
struct Actor {
    #[serde(default)]
    nickname: String,
}

impl PullRequestPayload {
    fn into_event(self, action: PullRequestAction) -> Result<PullRequestEvent, WebhookParseError> {
        let pr = self.pullrequest;

        Ok(PullRequestEvent {
            action,
            number: pr.id,
            title: pr.title,
            source_branch: pr.source.branch.name,
            target_branch: require(
                pr.destination.branch.name,
                "pullrequest.destination.branch.name",
            )?,
            repository: self.repository.full_name,
            sender: self.actor.nickname,
        })
    }
}
