//! GitLab webhook parser.

use serde::Deserialize;
use url::Url;

use super::{decode, require, unknown_event};
use crate::signature::{authenticate, verify_token};
use crate::{
    PullRequestAction, PullRequestEvent, SecretResolver, WebhookEvent, WebhookParseError,
    WebhookParser, WebhookRequest,
};

#[cfg(test)]
#[path = "gitlab_tests.rs"]
mod tests;

const EVENT_HEADER: &str = "X-Gitlab-Event";
const TOKEN_HEADER: &str = "X-Gitlab-Token";

const MERGE_REQUEST_HOOK: &str = "Merge Request Hook";
const SYSTEM_HOOK: &str = "System Hook";

/// Recognized GitLab events that are not about merge requests.
const OTHER_EVENTS: &[&str] = &[
    "Push Hook",
    "Tag Push Hook",
    "Issue Hook",
    "Confidential Issue Hook",
    "Note Hook",
    "Confidential Note Hook",
    "Pipeline Hook",
    "Job Hook",
    "Wiki Page Hook",
    "Deployment Hook",
    "Release Hook",
];

/// Parser for gitlab.com and self-managed GitLab.
///
/// Merge requests are GitLab's pull requests. Deliveries are always JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitlabParser {
    endpoint: Option<Url>,
}

impl GitlabParser {
    pub fn new(endpoint: Option<Url>) -> Self {
        Self { endpoint }
    }

    pub fn endpoint(&self) -> Option<&Url> {
        self.endpoint.as_ref()
    }
}

impl WebhookParser for GitlabParser {
    fn parse(
        &self,
        request: &WebhookRequest,
        secrets: &dyn SecretResolver,
    ) -> Result<Option<WebhookEvent>, WebhookParseError> {
        let event_name = request.required_header(EVENT_HEADER)?;

        let event = match event_name {
            SYSTEM_HOOK => None,
            MERGE_REQUEST_HOOK => {
                let payload: MergeRequestPayload = decode(&request.json_payload(false)?)?;
                Some(WebhookEvent::PullRequest(payload.into_event()?))
            }
            other if OTHER_EVENTS.contains(&other) => Some(WebhookEvent::other(other)),
            other => return Err(unknown_event("gitlab", other)),
        };

        authenticate(event, secrets, |secret| {
            verify_token(secret, request.required_header(TOKEN_HEADER)?)
        })
    }
}

#[derive(Debug, Deserialize)]
struct MergeRequestPayload {
    object_attributes: MergeRequest,
    #[serde(default)]
    project: Project,
    #[serde(default)]
    user: User,
}

#[derive(Debug, Deserialize)]
struct MergeRequest {
    #[serde(default)]
    iid: u64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    action: String,
    /// Present on `update` actions that pushed new commits.
    #[serde(default)]
    oldrev: Option<String>,
    #[serde(default)]
    source_branch: String,
    #[serde(default)]
    target_branch: String,
}

#[derive(Debug, Default, Deserialize)]
struct Project {
    #[serde(default)]
    path_with_namespace: String,
}

#[derive(Debug, Default, Deserialize)]
struct User {
    #[serde(default)]
    username: String,
}

impl MergeRequestPayload {
    fn into_event(self) -> Result<PullRequestEvent, WebhookParseError> {
        let mr = self.object_attributes;

        Ok(PullRequestEvent {
            action: map_action(&mr.action, mr.oldrev.is_some()),
            number: mr.iid,
            title: mr.title,
            source_branch: mr.source_branch,
            target_branch: require(mr.target_branch, "object_attributes.target_branch")?,
            repository: self.project.path_with_namespace,
            sender: self.user.username,
        })
    }
}

fn map_action(action: &str, has_new_commits: bool) -> PullRequestAction {
    match action {
        "open" => PullRequestAction::Open,
        "reopen" => PullRequestAction::Reopen,
        "close" => PullRequestAction::Close,
        "merge" => PullRequestAction::Merge,
        "update" if has_new_commits => PullRequestAction::Sync,
        "update" => PullRequestAction::Update,
        _ => PullRequestAction::Unknown,
    }
}
