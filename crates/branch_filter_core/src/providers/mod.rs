//! Per-provider webhook parsers.
//!
//! Each parser knows its provider's event header, payload layout and signature
//! scheme, and reduces pull request payloads to a [`PullRequestEvent`].
//!
//! | Provider         | Event header      | Signature header      |
//! |------------------|-------------------|-----------------------|
//! | GitHub           | `X-GitHub-Event`  | `X-Hub-Signature-256` |
//! | GitLab           | `X-Gitlab-Event`  | `X-Gitlab-Token`      |
//! | Bitbucket Cloud  | `X-Event-Key`     | `X-Hub-Signature`     |
//! | Bitbucket Server | `X-Event-Key`     | `X-Hub-Signature`     |
//! | Gitea            | `X-Gitea-Event`   | `X-Gitea-Signature`   |
//! | Gogs             | `X-Gogs-Event`    | `X-Gogs-Signature`    |
//!
//! [`PullRequestEvent`]: crate::PullRequestEvent

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::WebhookParseError;

pub mod bitbucket;
pub mod bitbucket_server;
pub mod gitea;
pub mod github;
pub mod gitlab;
pub mod gogs;

pub use bitbucket::BitbucketParser;
pub use bitbucket_server::BitbucketServerParser;
pub use gitea::GiteaParser;
pub use github::GithubParser;
pub use gitlab::GitlabParser;
pub use gogs::GogsParser;

/// Repository reference shared by the GitHub-style payloads.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RepositoryRef {
    #[serde(default)]
    pub full_name: String,
}

/// Account reference shared by the GitHub-style payloads.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct AccountRef {
    #[serde(default)]
    pub login: String,
}

/// Deserialize a provider payload.
pub(crate) fn decode<T: DeserializeOwned>(payload: &[u8]) -> Result<T, WebhookParseError> {
    Ok(serde_json::from_slice(payload)?)
}

/// Reject empty values for fields the relay depends on.
pub(crate) fn require(value: String, field: &str) -> Result<String, WebhookParseError> {
    if value.is_empty() {
        return Err(WebhookParseError::MissingField {
            field: field.to_string(),
        });
    }
    Ok(value)
}

/// Error for an event name the provider parser does not recognize.
pub(crate) fn unknown_event(provider: &str, event: &str) -> WebhookParseError {
    WebhookParseError::UnknownEvent {
        provider: provider.to_string(),
        event: event.to_string(),
    }
}
