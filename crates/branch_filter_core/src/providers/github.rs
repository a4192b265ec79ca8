//! GitHub webhook parser.

use serde::Deserialize;
use url::Url;

use super::{decode, require, unknown_event, AccountRef, RepositoryRef};
use crate::signature::{authenticate, verify_hmac_sha256};
use crate::{
    PullRequestAction, PullRequestEvent, SecretResolver, WebhookEvent, WebhookParseError,
    WebhookParser, WebhookRequest,
};

#[cfg(test)]
#[path = "github_tests.rs"]
mod tests;

const EVENT_HEADER: &str = "X-GitHub-Event";
const SIGNATURE_HEADER: &str = "X-Hub-Signature-256";

/// Recognized GitHub events that are not about pull requests.
const OTHER_EVENTS: &[&str] = &[
    "check_run",
    "check_suite",
    "create",
    "delete",
    "deployment",
    "deployment_status",
    "fork",
    "installation",
    "installation_repositories",
    "issue_comment",
    "issues",
    "label",
    "member",
    "pull_request_review",
    "pull_request_review_comment",
    "pull_request_review_thread",
    "push",
    "release",
    "repository",
    "star",
    "status",
    "watch",
    "workflow_job",
    "workflow_run",
];

/// Parser for github.com and GitHub Enterprise deliveries.
///
/// Accepts both `application/json` and form-encoded (`payload=`) bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubParser {
    endpoint: Option<Url>,
}

impl GithubParser {
    pub fn new(endpoint: Option<Url>) -> Self {
        Self { endpoint }
    }

    pub fn endpoint(&self) -> Option<&Url> {
        self.endpoint.as_ref()
    }
}

impl WebhookParser for GithubParser {
    fn parse(
        &self,
        request: &WebhookRequest,
        secrets: &dyn SecretResolver,
    ) -> Result<Option<WebhookEvent>, WebhookParseError> {
        let event_name = request.required_header(EVENT_HEADER)?;

        let event = match event_name {
            "ping" => None,
            "pull_request" => {
                let payload: PullRequestPayload = decode(&request.json_payload(true)?)?;
                Some(WebhookEvent::PullRequest(payload.into_event()?))
            }
            other if OTHER_EVENTS.contains(&other) => Some(WebhookEvent::other(other)),
            other => return Err(unknown_event("github", other)),
        };

        authenticate(event, secrets, |secret| {
            let signature = request.required_header(SIGNATURE_HEADER)?;
            verify_hmac_sha256(secret, request.body(), signature)
        })
    }
}

#[derive(Debug, Deserialize)]
struct PullRequestPayload {
    #[serde(default)]
    action: String,
    #[serde(default)]
    number: u64,
    pull_request: PullRequest,
    #[serde(default)]
    repository: RepositoryRef,
    #[serde(default)]
    sender: AccountRef,
}

#[derive(Debug, Deserialize)]
struct PullRequest {
    #[serde(default)]
    title: String,
    #[serde(default)]
    merged: bool,
    base: BranchRef,
    head: BranchRef,
}

#[derive(Debug, Deserialize)]
struct BranchRef {
    #[serde(rename = "ref")]
    name: String,
}

impl PullRequestPayload {
    fn into_event(self) -> Result<PullRequestEvent, WebhookParseError> {
        Ok(PullRequestEvent {
            action: map_action(&self.action, self.pull_request.merged),
            number: self.number,
            title: self.pull_request.title,
            source_branch: self.pull_request.head.name,
            target_branch: require(self.pull_request.base.name, "pull_request.base.ref")?,
            repository: self.repository.full_name,
            sender: self.sender.login,
        })
    }
}

fn map_action(action: &str, merged: bool) -> PullRequestAction {
    match action {
        "opened" => PullRequestAction::Open,
        "reopened" => PullRequestAction::Reopen,
        "closed" if merged => PullRequestAction::Merge,
        "closed" => PullRequestAction::Close,
        "synchronize" => PullRequestAction::Sync,
        "edited" => PullRequestAction::Update,
        "labeled" => PullRequestAction::Label,
        "unlabeled" => PullRequestAction::Unlabel,
        _ => PullRequestAction::Unknown,
    }
}
