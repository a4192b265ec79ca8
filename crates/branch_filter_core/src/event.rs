//! Normalized webhook events.
//!
//! Every provider parser reduces its payloads to these types so the filtering
//! logic never needs to know which provider sent the delivery.

use std::fmt;

/// Result of parsing a webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    /// A pull request lifecycle event.
    PullRequest(PullRequestEvent),

    /// A recognized event that is not about a pull request (push, tag, comment, ...).
    Other {
        /// Provider event name, e.g. `push` or `Note Hook`.
        kind: String,
    },
}

impl WebhookEvent {
    /// Build an `Other` event from the provider's event name.
    pub fn other(kind: impl Into<String>) -> Self {
        Self::Other { kind: kind.into() }
    }

    /// Name of the event kind, used in logs and error messages.
    pub fn kind(&self) -> &str {
        match self {
            WebhookEvent::PullRequest(_) => "pull_request",
            WebhookEvent::Other { kind } => kind,
        }
    }
}

/// Provider-independent view of a pull request event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullRequestEvent {
    pub action: PullRequestAction,

    /// Pull request number (GitHub, Gitea, Gogs), IID (GitLab) or ID (Bitbucket).
    pub number: u64,

    pub title: String,

    /// Branch the changes come from.
    pub source_branch: String,

    /// Branch the pull request merges into. This is the branch the relay filters on.
    pub target_branch: String,

    /// Full repository name, e.g. `octo-org/service`.
    pub repository: String,

    /// Login of the user that triggered the event.
    pub sender: String,
}

/// What happened to the pull request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PullRequestAction {
    Open,
    Close,
    Reopen,
    /// New commits were pushed to the source branch.
    Sync,
    Merge,
    /// Title, description or target branch changed.
    Update,
    Label,
    Unlabel,
    #[default]
    Unknown,
}

impl PullRequestAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Close => "close",
            Self::Reopen => "reopen",
            Self::Sync => "sync",
            Self::Merge => "merge",
            Self::Update => "update",
            Self::Label => "label",
            Self::Unlabel => "unlabel",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for PullRequestAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
