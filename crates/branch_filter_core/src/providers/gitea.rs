//! Gitea webhook parser.
//!
//! Gitea grew out of Gogs and both send GitHub-like payloads. The payload
//! handling here is shared with the Gogs parser; the two differ only in
//! header names and in where the branch names live.

use serde::Deserialize;
use url::Url;

use super::{decode, require, unknown_event, AccountRef, RepositoryRef};
use crate::signature::{authenticate, verify_hmac_sha256};
use crate::{
    PullRequestAction, PullRequestEvent, SecretResolver, WebhookEvent, WebhookParseError,
    WebhookParser, WebhookRequest,
};

#[cfg(test)]
#[path = "gitea_tests.rs"]
mod tests;

/// Recognized non-pull-request events for the Gitea family.
pub(crate) const OTHER_EVENTS: &[&str] = &[
    "create",
    "delete",
    "fork",
    "issue_comment",
    "issues",
    "pull_request_approved",
    "pull_request_comment",
    "pull_request_rejected",
    "push",
    "release",
    "repository",
];

/// Header names used by one member of the Gitea family.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Flavor {
    pub provider: &'static str,
    pub event_header: &'static str,
    pub signature_header: &'static str,
}

const GITEA: Flavor = Flavor {
    provider: "gitea",
    event_header: "X-Gitea-Event",
    signature_header: "X-Gitea-Signature",
};

/// Parser for self-hosted Gitea instances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GiteaParser {
    endpoint: Option<Url>,
}

impl GiteaParser {
    pub fn new(endpoint: Option<Url>) -> Self {
        Self { endpoint }
    }

    pub fn endpoint(&self) -> Option<&Url> {
        self.endpoint.as_ref()
    }
}

impl WebhookParser for GiteaParser {
    fn parse(
        &self,
        request: &WebhookRequest,
        secrets: &dyn SecretResolver,
    ) -> Result<Option<WebhookEvent>, WebhookParseError> {
        parse_family(GITEA, request, secrets)
    }
}

/// Parse a delivery from a Gitea-family provider.
pub(crate) fn parse_family(
    flavor: Flavor,
    request: &WebhookRequest,
    secrets: &dyn SecretResolver,
) -> Result<Option<WebhookEvent>, WebhookParseError> {
    let event_name = request.required_header(flavor.event_header)?;

    let event = match event_name {
        "ping" => None,
        "pull_request" => {
            let payload: PullRequestPayload = decode(&request.json_payload(true)?)?;
            Some(WebhookEvent::PullRequest(payload.into_event()?))
        }
        other if OTHER_EVENTS.contains(&other) => Some(WebhookEvent::other(other)),
        other => return Err(unknown_event(flavor.provider, other)),
    };

    authenticate(event, secrets, |secret| {
        let signature = request.required_header(flavor.signature_header)?;
        verify_hmac_sha256(secret, request.body(), signature)
    })
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

/// Gitea nests branches under `base`/`head`; Gogs uses flat
/// `base_branch`/`head_branch` fields.
#[derive(Debug, Deserialize)]
struct PullRequest {
    #[serde(default)]
    title: String,
    #[serde(default)]
    merged: bool,
    #[serde(default)]
    base: Option<BranchRef>,
    #[serde(default)]
    head: Option<BranchRef>,
    #[serde(default)]
    base_branch: Option<String>,
    #[serde(default)]
    head_branch: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BranchRef {
    #[serde(rename = "ref", default)]
    name: String,
}

impl PullRequestPayload {
    fn into_event(self) -> Result<PullRequestEvent, WebhookParseError> {
        let pr = self.pull_request;
        let target = branch(pr.base, pr.base_branch);
        let source = branch(pr.head, pr.head_branch);

        Ok(PullRequestEvent {
            action: map_action(&self.action, pr.merged),
            number: self.number,
            title: pr.title,
            source_branch: source,
            target_branch: require(target, "pull_request.base.ref")?,
            repository: self.repository.full_name,
            sender: self.sender.login,
        })
    }
}

fn branch(nested: Option<BranchRef>, flat: Option<String>) -> String {
    nested
        .map(|b| b.name)
        .filter(|name| !name.is_empty())
        .or(flat)
        .unwrap_or_default()
}

fn map_action(action: &str, merged: bool) -> PullRequestAction {
    match action {
        "opened" => PullRequestAction::Open,
        "reopened" => PullRequestAction::Reopen,
        "closed" if merged => PullRequestAction::Merge,
        "closed" => PullRequestAction::Close,
        "synchronized" => PullRequestAction::Sync,
        "edited" => PullRequestAction::Update,
        "label_updated" => PullRequestAction::Label,
        "label_cleared" => PullRequestAction::Unlabel,
        _ => PullRequestAction::Unknown,
    }
}
