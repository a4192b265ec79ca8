//! Tests for handlers module

use super::*;
use axum::{body::Body, http::Request};
use branch_filter_core::{AllowList, GitProvider, WebhookClient};
use serde_json::json;
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tower::ServiceExt;
use tracing_test::traced_test;

use crate::routes::create_router;

/// Helper function to create a test app state
fn test_app_state(provider: GitProvider) -> AppState {
    AppState::new(
        AllowList::try_new("main:release/1.0").unwrap(),
        WebhookClient::resolve(provider, "").unwrap(),
    )
}

fn github_pull_request(target: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "action": "opened",
        "number": 42,
        "pull_request": {
            "title": "Add feature",
            "base": { "ref": target },
            "head": { "ref": "feature/x" }
        },
        "repository": { "full_name": "octo/repo" },
        "sender": { "login": "octocat" }
    }))
    .unwrap()
}

fn github_post(event: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/")
        .header("content-type", "application/json")
        .header("x-github-event", event)
        .header("x-github-delivery", "72d3162e-cc78-11e3-81ab-4c9367dc0958")
        .body(Body::from(body))
        .unwrap()
}

async fn body_bytes(response: Response) -> Bytes {
    to_bytes(response.into_body(), usize::MAX).await.unwrap()
}

/// Serve the relay on an ephemeral local port.
async fn spawn_relay(state: AppState) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = create_router(state, "/");
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Write a raw HTTP/1.1 request and read the response until the server closes.
async fn send_raw(addr: SocketAddr, request: &[u8]) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request).await.unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    String::from_utf8(response).unwrap()
}

// ============================================================================
// Health Check Tests
// ============================================================================

#[tokio::test]
async fn test_health_check_returns_json() {
    let response = health_check(State(test_app_state(GitProvider::GitLab))).await;

    assert_eq!(response.0.status, "healthy");
    assert_eq!(response.0.version, env!("CARGO_PKG_VERSION"));
    assert_eq!(response.0.provider, "gitlab");
}

#[tokio::test]
async fn test_health_check_timestamp_format() {
    let response = health_check(State(test_app_state(GitProvider::GitHub))).await;

    let parsed = chrono::DateTime::parse_from_rfc3339(&response.0.timestamp);
    assert!(parsed.is_ok(), "Timestamp should be valid RFC 3339");
}

#[tokio::test]
async fn test_health_route() {
    let app = create_router(test_app_state(GitProvider::GitHub), "/");

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let health: HealthCheckResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.provider, "github");
}

// ============================================================================
// Webhook Relay Tests
// ============================================================================

/// A pull request into an allowed branch is echoed back unchanged.
#[traced_test]
#[tokio::test]
async fn test_allowed_branch_is_relayed() {
    let app = create_router(test_app_state(GitProvider::GitHub), "/");
    let body = github_pull_request("main");

    let response = app.oneshot(github_post("pull_request", body.clone())).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-github-event").unwrap(),
        "pull_request"
    );
    assert_eq!(
        response.headers().get("x-github-delivery").unwrap(),
        "72d3162e-cc78-11e3-81ab-4c9367dc0958"
    );
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );
    assert_eq!(body_bytes(response).await.as_ref(), body.as_slice());
    assert!(logs_contain("Relaying pull request event"));
}

/// Repeated headers keep every value in order.
#[tokio::test]
async fn test_relay_preserves_multi_valued_headers() {
    let app = create_router(test_app_state(GitProvider::GitHub), "/");
    let request = Request::builder()
        .method(Method::POST)
        .uri("/")
        .header("x-github-event", "pull_request")
        .header("x-forwarded-for", "10.0.0.1")
        .header("x-forwarded-for", "10.0.0.2")
        .body(Body::from(github_pull_request("release/1.0")))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let forwarded: Vec<_> = response
        .headers()
        .get_all("x-forwarded-for")
        .iter()
        .map(|v| v.to_str().unwrap())
        .collect();
    assert_eq!(forwarded, vec!["10.0.0.1", "10.0.0.2"]);
}

/// Bodies are relayed byte for byte, including formatting the parser ignores.
#[tokio::test]
async fn test_relay_body_is_byte_identical() {
    let app = create_router(test_app_state(GitProvider::GitHub), "/");
    let body = b"{ \"pull_request\" : { \"base\": {\"ref\":\"main\"}, \"head\": {\"ref\":\"x\"} },\n  \"extra\": [1, 2.50, null] }\n".to_vec();

    let response = app.oneshot(github_post("pull_request", body.clone())).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await.as_ref(), body.as_slice());
}

#[traced_test]
#[tokio::test]
async fn test_disallowed_branch_is_dropped() {
    let app = create_router(test_app_state(GitProvider::GitHub), "/");

    let response = app
        .oneshot(github_post("pull_request", github_pull_request("develop")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(response.headers().get("x-github-event").is_none());
    assert!(body_bytes(response).await.is_empty());
    assert!(logs_contain("Target branch not allowed"));
}

/// Branch matching is exact and case-sensitive.
#[tokio::test]
async fn test_branch_match_is_case_sensitive() {
    let app = create_router(test_app_state(GitProvider::GitHub), "/");

    let response = app
        .oneshot(github_post("pull_request", github_pull_request("Main")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

/// Deliveries to sub-paths of the default root path are relayed.
#[tokio::test]
async fn test_sub_path_delivery_is_relayed() {
    let app = create_router(test_app_state(GitProvider::GitHub), "/");
    let body = github_pull_request("main");
    let request = Request::builder()
        .method(Method::POST)
        .uri("/hooks/github")
        .header("x-github-event", "pull_request")
        .body(Body::from(body.clone()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await.as_ref(), body.as_slice());
}

/// Connection-level headers are not echoed; end-to-end headers are.
#[tokio::test]
async fn test_relay_drops_connection_headers() {
    let app = create_router(test_app_state(GitProvider::GitHub), "/");
    let request = Request::builder()
        .method(Method::POST)
        .uri("/")
        .header("host", "relay.internal")
        .header("connection", "keep-alive, x-hop")
        .header("keep-alive", "timeout=5")
        .header("x-hop", "1")
        .header("transfer-encoding", "chunked")
        .header("te", "trailers")
        .header("upgrade", "h2c")
        .header("x-github-event", "pull_request")
        .header("user-agent", "GitHub-Hookshot/abc123")
        .body(Body::from(github_pull_request("main")))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    for name in [
        "host",
        "connection",
        "keep-alive",
        "x-hop",
        "transfer-encoding",
        "te",
        "upgrade",
    ] {
        assert!(headers.get(name).is_none(), "{} should not be echoed", name);
    }
    assert_eq!(headers.get("x-github-event").unwrap(), "pull_request");
    assert_eq!(headers.get("user-agent").unwrap(), "GitHub-Hookshot/abc123");
}

/// A chunked delivery is answered with a complete 200 and the original body.
#[tokio::test]
async fn test_chunked_delivery_is_relayed_over_http() {
    let addr = spawn_relay(test_app_state(GitProvider::GitHub)).await;
    let body = String::from_utf8(github_pull_request("main")).unwrap();
    let request = format!(
        "POST / HTTP/1.1\r\n\
         Host: localhost\r\n\
         X-GitHub-Event: pull_request\r\n\
         Content-Type: application/json\r\n\
         Transfer-Encoding: chunked\r\n\
         Connection: close\r\n\
         \r\n\
         {:x}\r\n{}\r\n0\r\n\r\n",
        body.len(),
        body
    );

    let response = send_raw(addr, request.as_bytes()).await;

    assert!(
        response.starts_with("HTTP/1.1 200 OK\r\n"),
        "unexpected response: {:?}",
        response
    );
    let (head, echoed) = response.split_once("\r\n\r\n").unwrap();
    let head = head.to_ascii_lowercase();
    assert!(head.contains("\r\nx-github-event: pull_request"));
    assert!(!head.contains("\r\nhost:"));
    assert!(!head.contains("transfer-encoding: chunked"));
    assert_eq!(echoed, body);
}

/// A filtered chunked delivery still gets a proper 204.
#[tokio::test]
async fn test_chunked_delivery_to_other_branch_is_dropped_over_http() {
    let addr = spawn_relay(test_app_state(GitProvider::GitHub)).await;
    let body = String::from_utf8(github_pull_request("develop")).unwrap();
    let request = format!(
        "POST /hooks/github HTTP/1.1\r\n\
         Host: localhost\r\n\
         X-GitHub-Event: pull_request\r\n\
         Transfer-Encoding: chunked\r\n\
         Connection: close\r\n\
         \r\n\
         {:x}\r\n{}\r\n0\r\n\r\n",
        body.len(),
        body
    );

    let response = send_raw(addr, request.as_bytes()).await;

    assert!(response.starts_with("HTTP/1.1 204 No Content\r\n"));
}

// ============================================================================
// Fail-closed Tests
// ============================================================================

#[tokio::test]
async fn test_non_pull_request_event_fails() {
    let app = create_router(test_app_state(GitProvider::GitHub), "/");
    let body = serde_json::to_vec(&json!({ "ref": "refs/heads/main" })).unwrap();

    let response = app.oneshot(github_post("push", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_bytes(response).await.is_empty());
}

/// Pings carry no event and are rejected like any other non pull request.
#[tokio::test]
async fn test_ping_fails() {
    let app = create_router(test_app_state(GitProvider::GitHub), "/");
    let body = serde_json::to_vec(&json!({ "zen": "Keep it logically awesome." })).unwrap();

    let response = app.oneshot(github_post("ping", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_malformed_json_fails() {
    let app = create_router(test_app_state(GitProvider::GitHub), "/");

    let response = app
        .oneshot(github_post("pull_request", b"{not json".to_vec()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn test_missing_event_header_fails() {
    let app = create_router(test_app_state(GitProvider::GitHub), "/");
    let request = Request::builder()
        .method(Method::POST)
        .uri("/")
        .body(Body::from(github_pull_request("main")))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

/// Bodies over the configured limit cannot be read.
#[traced_test]
#[tokio::test]
async fn test_oversized_body_fails() {
    let state = test_app_state(GitProvider::GitHub).with_max_body_bytes(16);
    let app = create_router(state, "/");

    let response = app
        .oneshot(github_post("pull_request", github_pull_request("main")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(logs_contain("body_read"));
}

// ============================================================================
// Method Handling Tests
// ============================================================================

#[tokio::test]
async fn test_get_is_ignored() {
    let app = create_router(test_app_state(GitProvider::GitHub), "/");
    let request = Request::builder()
        .method(Method::GET)
        .uri("/")
        .header("x-github-event", "pull_request")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("x-github-event").is_none());
    assert!(body_bytes(response).await.is_empty());
}

/// Non-POST requests are ignored even when they carry a valid delivery.
#[tokio::test]
async fn test_put_with_valid_payload_is_ignored() {
    let app = create_router(test_app_state(GitProvider::GitHub), "/");
    let request = Request::builder()
        .method(Method::PUT)
        .uri("/")
        .header("x-github-event", "pull_request")
        .body(Body::from(github_pull_request("main")))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_bytes(response).await.is_empty());
}

// ============================================================================
// Other Provider Tests
// ============================================================================

#[tokio::test]
async fn test_gitlab_merge_request_is_relayed() {
    let app = create_router(test_app_state(GitProvider::GitLab), "/");
    let body = serde_json::to_vec(&json!({
        "object_kind": "merge_request",
        "user": { "username": "root" },
        "project": { "path_with_namespace": "group/project" },
        "object_attributes": {
            "iid": 3,
            "action": "open",
            "source_branch": "topic",
            "target_branch": "release/1.0"
        }
    }))
    .unwrap();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/")
        .header("content-type", "application/json")
        .header("x-gitlab-event", "Merge Request Hook")
        .body(Body::from(body.clone()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-gitlab-event").unwrap(),
        "Merge Request Hook"
    );
    assert_eq!(body_bytes(response).await.as_ref(), body.as_slice());
}

#[tokio::test]
async fn test_bitbucket_pull_request_into_other_branch_is_dropped() {
    let app = create_router(test_app_state(GitProvider::Bitbucket), "/");
    let body = serde_json::to_vec(&json!({
        "actor": { "nickname": "bb-user" },
        "repository": { "full_name": "workspace/repo" },
        "pullrequest": {
            "id": 5,
            "title": "Feature",
            "source": { "branch": { "name": "feature" } },
            "destination": { "branch": { "name": "staging" } }
        }
    }))
    .unwrap();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/")
        .header("content-type", "application/json")
        .header("x-event-key", "pullrequest:created")
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

/// A GitHub delivery sent to a GitLab relay is missing the GitLab event header.
#[tokio::test]
async fn test_wrong_provider_fails() {
    let app = create_router(test_app_state(GitProvider::GitLab), "/");

    let response = app
        .oneshot(github_post("pull_request", github_pull_request("main")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
