//! Source-control provider selection.
//!
//! The provider is chosen once at startup from configuration and turned into
//! a [`WebhookClient`] that parses every delivery for the rest of the process.

use std::fmt;
use tracing::info;
use url::Url;

use crate::providers::{
    BitbucketParser, BitbucketServerParser, GiteaParser, GithubParser, GitlabParser, GogsParser,
};
use crate::{
    ConfigurationError, ConfigurationResult, SecretResolver, WebhookEvent, WebhookParseError,
    WebhookParser, WebhookRequest,
};

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;

/// Supported source-control providers.
///
/// # Examples
///
/// ```
/// use branch_filter_core::GitProvider;
///
/// assert_eq!(GitProvider::from_name("GitLab"), GitProvider::GitLab);
/// assert_eq!(GitProvider::from_name("bitbucket-server"), GitProvider::BitbucketServer);
/// // Unrecognized names fall back to GitHub
/// assert_eq!(GitProvider::from_name("sourcehut"), GitProvider::GitHub);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum GitProvider {
    #[default]
    GitHub,
    GitLab,
    /// Bitbucket Cloud
    Bitbucket,
    /// Bitbucket Server / Data Center (formerly Stash)
    BitbucketServer,
    Gitea,
    Gogs,
}

impl GitProvider {
    /// Map a configured provider name to a provider.
    ///
    /// Matching is case-insensitive. Unrecognized names, including the empty
    /// string, select GitHub.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "bitbucket" | "bitbucket-cloud" | "bitbucketcloud" => Self::Bitbucket,
            "bitbucketserver" | "bitbucket-server" => Self::BitbucketServer,
            "gitea" => Self::Gitea,
            "gitlab" => Self::GitLab,
            "gogs" => Self::Gogs,
            _ => Self::GitHub,
        }
    }

    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GitHub => "github",
            Self::GitLab => "gitlab",
            Self::Bitbucket => "bitbucket",
            Self::BitbucketServer => "bitbucket-server",
            Self::Gitea => "gitea",
            Self::Gogs => "gogs",
        }
    }

    /// Public endpoint used when no custom endpoint is configured.
    ///
    /// Self-hosted only providers have none.
    pub fn default_endpoint(&self) -> Option<&'static str> {
        match self {
            Self::GitHub => Some("https://api.github.com/"),
            Self::GitLab => Some("https://gitlab.com/"),
            Self::Bitbucket => Some("https://api.bitbucket.org/"),
            Self::BitbucketServer | Self::Gitea | Self::Gogs => None,
        }
    }
}

impl fmt::Display for GitProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider-specific webhook client.
///
/// One variant per supported provider. Parsing dispatches to the variant's
/// parser; no network calls are made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookClient {
    GitHub(GithubParser),
    GitLab(GitlabParser),
    Bitbucket(BitbucketParser),
    BitbucketServer(BitbucketServerParser),
    Gitea(GiteaParser),
    Gogs(GogsParser),
}

impl WebhookClient {
    /// Build the client for `provider`.
    ///
    /// A non-empty `endpoint` points the client at a self-hosted instance.
    /// An empty one selects the provider's public endpoint, if it has one.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidEndpoint` if `endpoint` is not an
    /// absolute `http` or `https` URL.
    pub fn resolve(provider: GitProvider, endpoint: &str) -> ConfigurationResult<Self> {
        let endpoint = if endpoint.is_empty() {
            provider
                .default_endpoint()
                .map(parse_endpoint)
                .transpose()?
        } else {
            Some(parse_endpoint(endpoint)?)
        };

        info!(
            provider = %provider,
            endpoint = endpoint.as_ref().map(Url::as_str).unwrap_or("<none>"),
            "Resolved webhook client"
        );

        let client = match provider {
            GitProvider::GitHub => Self::GitHub(GithubParser::new(endpoint)),
            GitProvider::GitLab => Self::GitLab(GitlabParser::new(endpoint)),
            GitProvider::Bitbucket => Self::Bitbucket(BitbucketParser::new(endpoint)),
            GitProvider::BitbucketServer => {
                Self::BitbucketServer(BitbucketServerParser::new(endpoint))
            }
            GitProvider::Gitea => Self::Gitea(GiteaParser::new(endpoint)),
            GitProvider::Gogs => Self::Gogs(GogsParser::new(endpoint)),
        };

        Ok(client)
    }

    pub fn provider(&self) -> GitProvider {
        match self {
            Self::GitHub(_) => GitProvider::GitHub,
            Self::GitLab(_) => GitProvider::GitLab,
            Self::Bitbucket(_) => GitProvider::Bitbucket,
            Self::BitbucketServer(_) => GitProvider::BitbucketServer,
            Self::Gitea(_) => GitProvider::Gitea,
            Self::Gogs(_) => GitProvider::Gogs,
        }
    }

    /// Base URL of the provider instance, if known.
    pub fn endpoint(&self) -> Option<&Url> {
        match self {
            Self::GitHub(p) => p.endpoint(),
            Self::GitLab(p) => p.endpoint(),
            Self::Bitbucket(p) => p.endpoint(),
            Self::BitbucketServer(p) => p.endpoint(),
            Self::Gitea(p) => p.endpoint(),
            Self::Gogs(p) => p.endpoint(),
        }
    }
}

impl WebhookParser for WebhookClient {
    fn parse(
        &self,
        request: &WebhookRequest,
        secrets: &dyn SecretResolver,
    ) -> Result<Option<WebhookEvent>, WebhookParseError> {
        match self {
            Self::GitHub(p) => p.parse(request, secrets),
            Self::GitLab(p) => p.parse(request, secrets),
            Self::Bitbucket(p) => p.parse(request, secrets),
            Self::BitbucketServer(p) => p.parse(request, secrets),
            Self::Gitea(p) => p.parse(request, secrets),
            Self::Gogs(p) => p.parse(request, secrets),
        }
    }
}

/// Parse and normalize a provider base URL.
fn parse_endpoint(raw: &str) -> ConfigurationResult<Url> {
    let invalid = |reason: String| ConfigurationError::InvalidEndpoint {
        endpoint: raw.to_string(),
        reason,
    };

    let mut url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }

    // Keep the last path segment when joining relative API paths.
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}
