//! # Branch Filter Core
//!
//! Provider-agnostic webhook filtering logic for the branch filter relay.
//!
//! ## Overview
//!
//! The relay receives pull request webhooks from a source-control provider
//! and only lets them through when the pull request targets an allowed branch.
//! This crate holds everything that decision needs:
//!
//! - [`GitProvider`] and [`WebhookClient`] - provider selection, resolved once at startup
//! - [`AllowList`] - the immutable set of allowed target branches
//! - [`WebhookParser`] - the capability every provider client implements
//! - [`parse_pull_request`] - reduces a raw request to a [`PullRequestEvent`]
//!   or a classified [`ParseError`]
//!
//! There is no HTTP server in this crate. The `branch_filter_api` crate wires
//! these types into an axum handler.
//!
//! ## Examples
//!
//! ```
//! use branch_filter_core::{parse_pull_request, AllowList, GitProvider, WebhookClient, WebhookRequest};
//! use http::HeaderMap;
//!
//! let allow_list = AllowList::try_new("main:release").unwrap();
//! let client = WebhookClient::resolve(GitProvider::GitHub, "").unwrap();
//!
//! let mut headers = HeaderMap::new();
//! headers.insert("x-github-event", "pull_request".parse().unwrap());
//! let body = r#"{"action":"opened","number":1,"pull_request":{"base":{"ref":"main"},"head":{"ref":"feature"}}}"#;
//!
//! let request = WebhookRequest::new(headers, body);
//! let event = parse_pull_request(&client, &request).unwrap();
//! assert!(allow_list.contains(&event.target_branch));
//! ```

pub mod allow_list;
pub mod errors;
pub mod event;
pub mod parser;
pub mod provider;
pub mod providers;
pub mod request;
pub mod signature;

pub use allow_list::AllowList;
pub use errors::{ConfigurationError, ConfigurationResult, ParseError, WebhookParseError};
pub use event::{PullRequestAction, PullRequestEvent, WebhookEvent};
pub use parser::{parse_pull_request, WebhookParser};
pub use provider::{GitProvider, WebhookClient};
pub use request::WebhookRequest;
pub use signature::{NoSecret, SecretResolver};
