//! Shared helpers for community-core integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use community_core::{ApiClient, SessionStore};
use serde_json::{Value, json};
use url::Url;
use wiremock::{MockServer, Request, ResponseTemplate};

pub fn can_bind_localhost() -> bool {
    std::net::TcpListener::bind("127.0.0.1:0").is_ok()
}

/// Client against `server` sharing `session`.
pub fn client(server: &MockServer, session: &Arc<SessionStore>) -> ApiClient {
    let base = Url::parse(&server.uri()).unwrap();
    ApiClient::builder(base, Arc::clone(session)).build().unwrap()
}

/// Session signed in with `token`.
pub fn session_with_token(token: &str) -> Arc<SessionStore> {
    let session = SessionStore::in_memory();
    session.set_access_token(Some(token.to_string()));
    Arc::new(session)
}

/// `200` with a `{success: true, data}` envelope.
pub fn ok(data: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "success": true, "data": data }))
}

/// Failure envelope with a message and optional code.
pub fn fail(status: u16, message: &str, code: Option<&str>) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(json!({
        "success": false,
        "message": message,
        "code": code,
    }))
}

pub fn authorization(request: &Request) -> Option<String> {
    request
        .headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

pub fn user_json(id: u64, nickname: &str) -> Value {
    json!({
        "userId": id,
        "email": format!("{nickname}@example.com"),
        "nickname": nickname,
        "profileImageUrl": null,
    })
}
