//! Endpoint paths and the header decoration applied to every request.

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};

pub const LOGIN: &str = "/api/auth/login";
pub const SIGNUP: &str = "/api/auth/signup";
pub const LOGOUT: &str = "/api/auth/logout";
pub const REFRESH: &str = "/api/auth/refresh";
pub const ME: &str = "/api/users/me";
pub const AVAILABILITY: &str = "/api/users/availability";
pub const PASSWORD: &str = "/api/users/me/password";
pub const POSTS: &str = "/api/posts";
pub const COMMENTS: &str = "/api/comments";
pub const PRESIGNED_URL: &str = "/api/uploads/presigned-url";

/// Endpoints that must never carry an `Authorization` header.
pub const PUBLIC_ENDPOINTS: [&str; 5] = [LOGIN, SIGNUP, REFRESH, AVAILABILITY, PRESIGNED_URL];

/// Header echoing the CSRF cookie.
pub const CSRF_HEADER: HeaderName = HeaderName::from_static("x-xsrf-token");

pub fn post(post_id: u64) -> String {
    format!("{POSTS}/{post_id}")
}

pub fn post_likes(post_id: u64) -> String {
    format!("{POSTS}/{post_id}/likes")
}

pub fn post_comments(post_id: u64) -> String {
    format!("{POSTS}/{post_id}/comments")
}

pub fn comment(comment_id: u64) -> String {
    format!("{COMMENTS}/{comment_id}")
}

/// Returns true unless the endpoint starts with one of the public paths.
///
/// An empty endpoint is treated as requiring auth.
pub fn is_auth_required(endpoint: &str) -> bool {
    if endpoint.is_empty() {
        return true;
    }
    !PUBLIC_ENDPOINTS
        .iter()
        .any(|public| endpoint.starts_with(public))
}

/// Builds the `Authorization` and `X-XSRF-TOKEN` headers for a request.
///
/// The bearer token is only attached to endpoints that require auth; the
/// CSRF header is attached whenever a token is known.
pub fn auth_headers(
    endpoint: &str,
    csrf_token: Option<&str>,
    access_token: Option<&str>,
) -> HeaderMap {
    let mut headers = HeaderMap::new();

    if let Some(token) = access_token.filter(|t| !t.is_empty())
        && is_auth_required(endpoint)
    {
        match HeaderValue::from_str(&format!("Bearer {token}")) {
            Ok(mut value) => {
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            }
            Err(_) => tracing::warn!("access token contains invalid header characters; not sent"),
        }
    }

    if let Some(csrf) = csrf_token.filter(|t| !t.is_empty()) {
        match HeaderValue::from_str(csrf) {
            Ok(value) => {
                headers.insert(CSRF_HEADER, value);
            }
            Err(_) => tracing::warn!("CSRF cookie contains invalid header characters; not sent"),
        }
    }

    headers
}
