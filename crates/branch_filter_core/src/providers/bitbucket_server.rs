//! Bitbucket Server (Data Center) webhook parser.

use serde::Deserialize;
use url::Url;

use super::{decode, require, unknown_event};
use crate::signature::{authenticate, verify_hmac_sha256};
use crate::{
    PullRequestAction, PullRequestEvent, SecretResolver, WebhookEvent, WebhookParseError,
    WebhookParser, WebhookRequest,
};

#[cfg(test)]
#[path = "bitbucket_server_tests.rs"]
mod tests;

const EVENT_HEADER: &str = "X-Event-Key";
const SIGNATURE_HEADER: &str = "X-Hub-Signature";

const PING_EVENT: &str = "diagnostics:ping";

/// Event key prefixes for non-pull-request events.
const OTHER_PREFIXES: &[&str] = &["repo:", "mirror:", "project:"];

/// Parser for self-hosted Bitbucket Server and Data Center.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitbucketServerParser {
    endpoint: Option<Url>,
}

impl BitbucketServerParser {
    pub fn new(endpoint: Option<Url>) -> Self {
        Self { endpoint }
    }

    pub fn endpoint(&self) -> Option<&Url> {
        self.endpoint.as_ref()
    }
}

impl WebhookParser for BitbucketServerParser {
    fn parse(
        &self,
        request: &WebhookRequest,
        secrets: &dyn SecretResolver,
    ) -> Result<Option<WebhookEvent>, WebhookParseError> {
        let event_key = request.required_header(EVENT_HEADER)?;

        let event = if event_key == PING_EVENT {
            None
        } else if let Some(action) = pull_request_action(event_key) {
            let payload: PullRequestPayload = decode(&request.json_payload(false)?)?;
            Some(WebhookEvent::PullRequest(payload.into_event(action)?))
        } else if event_key.starts_with("pr:")
            || OTHER_PREFIXES.iter().any(|p| event_key.starts_with(p))
        {
            // Includes comments and reviewer changes on pull requests.
            Some(WebhookEvent::other(event_key))
        } else {
            return Err(unknown_event("bitbucket-server", event_key));
        };

        authenticate(event, secrets, |secret| {
            let signature = request.required_header(SIGNATURE_HEADER)?;
            verify_hmac_sha256(secret, request.body(), signature)
        })
    }
}

fn pull_request_action(event_key: &str) -> Option<PullRequestAction> {
    match event_key {
        "pr:opened" => Some(PullRequestAction::Open),
        "pr:from_ref_updated" => Some(PullRequestAction::Sync),
        "pr:modified" => Some(PullRequestAction::Update),
        "pr:merged" => Some(PullRequestAction::Merge),
        "pr:declined" | "pr:deleted" => Some(PullRequestAction::Close),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PullRequestPayload {
    pull_request: PullRequest,
    #[serde(default)]
    actor: Actor,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PullRequest {
    #[serde(default)]
    id: u64,
    #[serde(default)]
    title: String,
    from_ref: Ref,
    to_ref: Ref,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ref {
    /// Fully qualified ref, e.g. `refs/heads/main`.
    #[serde(default)]
    id: String,
    /// Short branch name, e.g. `main`.
    #[serde(default)]
    display_id: String,
    #[serde(default)]
    repository: Option<Repository>,
}

#[derive(Debug, Deserialize)]
struct Repository {
    #[serde(default)]
    slug: String,
    #[serde(default)]
    project: Option<Project>,
}

#[derive(Debug, Deserialize)]
struct Project {
    #[serde(default)]
    key: String,
}

#[derive(Debug, Default, Deserialize)]
struct Actor {
    #[serde(default)]
    name: String,
}

impl Ref {
    fn branch_name(&self) -> String {
        if !self.display_id.is_empty() {
            return self.display_id.clone();
        }
        self.id
            .strip_prefix("refs/heads/")
            .unwrap_or(&self.id)
            .to_string()
    }

    fn repository_name(&self) -> String {
        match &self.repository {
            Some(Repository {
                slug,
                project: Some(project),
            }) => format!("{}/{}", project.key, slug),
            Some(repository) => repository.slug.clone(),
            None => String::new(),
        }
    }
}

impl PullRequestPayload {
    fn into_event(self, action: PullRequestAction) -> Result<PullRequestEvent, WebhookParseError> {
        let pr = self.pull_request;

        Ok(PullRequestEvent {
            action,
            number: pr.id,
            title: pr.title,
            source_branch: pr.from_ref.branch_name(),
            target_branch: require(pr.to_ref.branch_name(), "pullRequest.toRef.displayId")?,
            repository: pr.to_ref.repository_name(),
            sender: self.actor.name,
        })
    }
}
