//! Integration tests for 401-triggered token refresh.

mod support;

use std::sync::Arc;
use std::time::Duration;

use community_core::{ApiErrorKind, ApiRequest, AuthState};
use futures_util::future::join_all;
use serde_json::{Value, json};
use support::{can_bind_localhost, client, fail, ok, session_with_token};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PROTECTED: &str = "/api/posts/1";
const REFRESH: &str = "/api/auth/refresh";

async fn mount_protected(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(PROTECTED))
        .and(header("authorization", "Bearer old-token"))
        .respond_with(fail(401, "expired", Some("TOKEN_EXPIRED")))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(PROTECTED))
        .and(header("authorization", "Bearer new-token"))
        .respond_with(ok(json!({ "postId": 1, "title": "hello" })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_concurrent_401s_share_one_refresh() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;
    mount_protected(&server).await;
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(
            ok(json!({ "accessToken": "new-token" })).set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let session = session_with_token("old-token");
    let api = client(&server, &session);

    let requests = (0..5).map(|_| api.send(ApiRequest::get(PROTECTED)));
    let results = join_all(requests).await;

    for result in results {
        let data = result.unwrap();
        assert_eq!(data["postId"], 1);
    }
    assert_eq!(api.refreshes_started(), 1);
    assert_eq!(session.access_token().as_deref(), Some("new-token"));
}

#[tokio::test]
async fn test_request_is_retried_at_most_once() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PROTECTED))
        .respond_with(fail(401, "still unauthorized", None))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(ok(json!({ "accessToken": "new-token" })))
        .expect(1)
        .mount(&server)
        .await;

    let session = session_with_token("old-token");
    let api = client(&server, &session);

    let err = api.send(ApiRequest::get(PROTECTED)).await.unwrap_err();
    assert_eq!(err.kind, ApiErrorKind::Status);
    assert_eq!(err.status, Some(401));
    assert_eq!(err.message, "still unauthorized");
}

#[tokio::test]
async fn test_refresh_failure_expires_session_without_replay() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PROTECTED))
        .respond_with(fail(401, "expired", None))
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(
            fail(401, "refresh token expired", None).set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let session = session_with_token("old-token");
    let auth = session.subscribe();
    let api = client(&server, &session);

    let results = join_all((0..3).map(|_| api.send(ApiRequest::get(PROTECTED)))).await;
    for result in results {
        assert_eq!(result.unwrap_err().kind, ApiErrorKind::SessionExpired);
    }

    assert!(session.access_token().is_none());
    assert!(session.user().is_none());
    assert_eq!(*auth.borrow(), AuthState::Expired);
}

#[tokio::test]
async fn test_refresh_without_token_counts_as_failure() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PROTECTED))
        .respond_with(fail(401, "expired", None))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(ok(json!({})))
        .mount(&server)
        .await;

    let session = session_with_token("old-token");
    let api = client(&server, &session);

    let err = api.send(ApiRequest::get(PROTECTED)).await.unwrap_err();
    assert_eq!(err.kind, ApiErrorKind::SessionExpired);
    assert_eq!(session.auth_state(), AuthState::Expired);
}

#[tokio::test]
async fn test_refresh_reads_top_level_token() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;
    mount_protected(&server).await;
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "accessToken": "new-token" })),
        )
        .mount(&server)
        .await;

    let session = session_with_token("old-token");
    let api = client(&server, &session);

    let data: Value = api.request(ApiRequest::get(PROTECTED)).await.unwrap();
    assert_eq!(data["title"], "hello");
}

#[tokio::test]
async fn test_stale_token_is_replayed_without_refresh() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;
    // The 401 is delayed so the token can change while the request is in flight.
    Mock::given(method("GET"))
        .and(path(PROTECTED))
        .and(header("authorization", "Bearer old-token"))
        .respond_with(fail(401, "expired", None).set_delay(Duration::from_millis(200)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(PROTECTED))
        .and(header("authorization", "Bearer new-token"))
        .respond_with(ok(json!({ "postId": 1 })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(ok(json!({ "accessToken": "unexpected" })))
        .expect(0)
        .mount(&server)
        .await;

    let session = session_with_token("old-token");
    let api = client(&server, &session);

    let in_flight = tokio::spawn({
        let api = api.clone();
        async move { api.send(ApiRequest::get(PROTECTED)).await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    session.set_access_token(Some("new-token".to_string()));

    let data = in_flight.await.unwrap().unwrap();
    assert_eq!(data["postId"], 1);
    assert_eq!(api.refreshes_started(), 0);
}

#[tokio::test]
async fn test_public_endpoint_401_does_not_refresh() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(fail(401, "bad credentials", None))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(ok(json!({ "accessToken": "new-token" })))
        .expect(0)
        .mount(&server)
        .await;

    let session = Arc::new(community_core::SessionStore::in_memory());
    let api = client(&server, &session);

    let err = api
        .send(ApiRequest::post("/api/auth/login"))
        .await
        .unwrap_err();
    assert_eq!(err.status, Some(401));
}
