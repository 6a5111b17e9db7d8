//! HTTP client for the community API.
//!
//! Every request is decorated with the bearer token (auth-required endpoints
//! only) and the CSRF header, the `{success, data}` envelope is unwrapped,
//! and non-2xx responses become [`ApiError`]s. A 401 from an auth-required
//! endpoint triggers one shared token refresh, after which the request is
//! replayed once.

pub mod endpoints;
pub mod refresh;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use community_types::Envelope;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use self::refresh::{RefreshOutcome, RefreshQueue};
use crate::config::Config;
use crate::error::{ApiError, ApiErrorKind, ApiResult};
use crate::session::{AuthState, SessionStore};

/// Standard User-Agent header for community API requests.
pub const USER_AGENT: &str = concat!("community/", env!("CARGO_PKG_VERSION"));

/// A request against the community API.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    endpoint: String,
    params: Vec<(String, String)>,
    body: Option<Value>,
    headers: HeaderMap,
    default_error: Option<String>,
    /// Set on the replay after a refresh; a request is replayed at most once.
    retried: bool,
}

impl ApiRequest {
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            params: Vec::new(),
            body: None,
            headers: HeaderMap::new(),
            default_error: None,
            retried: false,
        }
    }

    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(Method::GET, endpoint)
    }

    pub fn post(endpoint: impl Into<String>) -> Self {
        Self::new(Method::POST, endpoint)
    }

    pub fn put(endpoint: impl Into<String>) -> Self {
        Self::new(Method::PUT, endpoint)
    }

    pub fn patch(endpoint: impl Into<String>) -> Self {
        Self::new(Method::PATCH, endpoint)
    }

    pub fn delete(endpoint: impl Into<String>) -> Self {
        Self::new(Method::DELETE, endpoint)
    }

    /// Adds a query parameter. Empty values are skipped.
    #[must_use]
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        let value = value.to_string();
        if !value.is_empty() {
            self.params.push((key.to_string(), value));
        }
        self
    }

    /// Adds a query parameter when a value is present.
    #[must_use]
    pub fn query_opt(self, key: &str, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    /// Sets a JSON body.
    ///
    /// # Errors
    /// Returns a parse error if the body cannot be serialized.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> ApiResult<Self> {
        let value = serde_json::to_value(body).map_err(|err| {
            ApiError::new(
                ApiErrorKind::Parse,
                format!("Could not encode the request: {err}"),
            )
        })?;
        self.body = Some(value);
        Ok(self)
    }

    /// Adds a header. Auth and CSRF headers set by the client take precedence.
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Message used when a failure response carries none.
    #[must_use]
    pub fn default_error(mut self, message: impl Into<String>) -> Self {
        self.default_error = Some(message.into());
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn is_retry(&self) -> bool {
        self.retried
    }

    fn into_retry(mut self) -> Self {
        self.retried = true;
        self
    }
}

struct ClientInner {
    http: reqwest::Client,
    /// Client without cookies, for third-party upload targets.
    plain_http: reqwest::Client,
    base_url: String,
    session: Arc<SessionStore>,
    refresh: RefreshQueue,
}

/// Builder for [`ApiClient`].
pub struct ApiClientBuilder {
    base_url: Url,
    session: Arc<SessionStore>,
    timeout: Option<Duration>,
}

impl ApiClientBuilder {
    #[must_use]
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn build(self) -> Result<ApiClient> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(default_headers)
            .cookie_provider(Arc::clone(&self.session));
        let mut plain_http = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = self.timeout {
            http = http.timeout(timeout);
            plain_http = plain_http.timeout(timeout);
        }

        let base_url = self.base_url.as_str().trim_end_matches('/').to_string();

        Ok(ApiClient {
            inner: Arc::new(ClientInner {
                http: http.build().context("Failed to build HTTP client")?,
                plain_http: plain_http
                    .build()
                    .context("Failed to build upload HTTP client")?,
                base_url,
                session: self.session,
                refresh: RefreshQueue::new(),
            }),
        })
    }
}

/// Community API client. Cheap to clone; clones share the session and
/// refresh queue.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

impl ApiClient {
    pub fn builder(base_url: Url, session: Arc<SessionStore>) -> ApiClientBuilder {
        ApiClientBuilder {
            base_url,
            session,
            timeout: None,
        }
    }

    /// Builds a client from configuration.
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid or the client cannot be built.
    pub fn from_config(config: &Config, session: Arc<SessionStore>) -> Result<Self> {
        Self::builder(config.effective_base_url()?, session)
            .timeout(config.request_timeout())
            .build()
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.inner.session
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Number of token refreshes this client has started.
    pub fn refreshes_started(&self) -> u64 {
        self.inner.refresh.refreshes_started()
    }

    pub(crate) fn plain_http(&self) -> &reqwest::Client {
        &self.inner.plain_http
    }

    /// Sends a request and deserializes the unwrapped `data` payload.
    ///
    /// # Errors
    /// Returns an [`ApiError`] for transport, decode and status failures.
    pub async fn request<T: DeserializeOwned>(&self, request: ApiRequest) -> ApiResult<T> {
        let data = self.send(request).await?;
        serde_json::from_value(data).map_err(|err| {
            ApiError::new(
                ApiErrorKind::Parse,
                format!("Unexpected response from the server: {err}"),
            )
        })
    }

    /// Sends a request and returns the unwrapped `data` payload.
    ///
    /// # Errors
    /// Returns an [`ApiError`] for transport, decode and status failures.
    pub async fn send(&self, request: ApiRequest) -> ApiResult<Value> {
        let sent_token = self.inner.session.access_token();

        let body = match self.inner.execute(&request, sent_token.as_deref()).await {
            Err(err) if should_refresh(&request, &err) => {
                let token = self.token_for_retry(sent_token.as_deref()).await?;
                let retry = request.into_retry();
                self.inner.execute(&retry, Some(&token)).await?
            }
            result => result?,
        };
        Ok(Envelope::unwrap_data(body))
    }

    /// Refreshes the access token, sharing any refresh already in flight.
    ///
    /// # Errors
    /// Returns `SessionExpired` if the refresh failed (the session is cleared).
    pub async fn refresh(&self) -> RefreshOutcome {
        let subscription = self.inner.refresh.subscribe();
        if subscription.is_leader() {
            // The refresh runs on its own task so a dropped leader cannot
            // strand the other subscribers.
            let inner = Arc::clone(&self.inner);
            tokio::spawn(async move {
                let guard = inner.refresh.guard();
                let outcome = inner.perform_refresh().await;
                guard.finish(&outcome);
            });
        }
        subscription.wait().await
    }

    /// Token to replay a 401'd request with.
    ///
    /// If the session token changed while the request was in flight, another
    /// refresh already happened and the current token is used directly. An
    /// expired session fails without starting another refresh.
    async fn token_for_retry(&self, sent_token: Option<&str>) -> RefreshOutcome {
        if self.inner.session.auth_state() == AuthState::Expired {
            return Err(ApiError::session_expired());
        }
        if let Some(current) = self.inner.session.access_token()
            && sent_token != Some(current.as_str())
        {
            tracing::debug!("token changed while request was in flight; replaying");
            return Ok(current);
        }
        self.refresh().await
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .field("session", &self.inner.session)
            .finish_non_exhaustive()
    }
}

fn should_refresh(request: &ApiRequest, err: &ApiError) -> bool {
    err.is_status(401) && !request.retried && endpoints::is_auth_required(&request.endpoint)
}

impl ClientInner {
    /// Sends one attempt and returns the raw (still enveloped) body.
    async fn execute(&self, request: &ApiRequest, access_token: Option<&str>) -> ApiResult<Value> {
        let url = format!("{}{}", self.base_url, request.endpoint);
        let mut builder = self.http.request(request.method.clone(), &url);

        if !request.params.is_empty() {
            builder = builder.query(&request.params);
        }

        let mut headers = request.headers.clone();
        headers.extend(endpoints::auth_headers(
            &request.endpoint,
            self.session.csrf_token().as_deref(),
            access_token,
        ));
        builder = builder.headers(headers);

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        tracing::debug!(
            method = %request.method,
            endpoint = %request.endpoint,
            retry = request.retried,
            "sending request"
        );

        let response = builder.send().await.map_err(ApiError::from)?;
        let status = response.status();
        let body = read_json_body(response).await;

        if status.is_success() {
            tracing::debug!(
                status = status.as_u16(),
                endpoint = %request.endpoint,
                "request succeeded"
            );
            return Ok(body?.unwrap_or(Value::Null));
        }

        tracing::debug!(status = status.as_u16(), endpoint = %request.endpoint, "request failed");
        Err(ApiError::from_response(
            status.as_u16(),
            body.ok().flatten(),
            request.default_error.as_deref(),
        ))
    }

    async fn perform_refresh(&self) -> RefreshOutcome {
        tracing::info!("access token rejected; refreshing session");

        let request =
            ApiRequest::post(endpoints::REFRESH).default_error("Could not refresh the session.");
        let token = self
            .execute(&request, None)
            .await
            .and_then(|body| extract_access_token(&body));

        match token {
            Ok(token) => {
                self.session.set_access_token(Some(token.clone()));
                tracing::info!("session refreshed");
                Ok(token)
            }
            Err(err) => {
                tracing::warn!(error = %err, "session refresh failed; clearing session");
                self.session.expire();
                Err(ApiError::session_expired())
            }
        }
    }
}

/// Reads a JSON body, `None` for empty, 204/205 or non-JSON responses.
async fn read_json_body(response: reqwest::Response) -> ApiResult<Option<Value>> {
    let status = response.status();
    if matches!(status, StatusCode::NO_CONTENT | StatusCode::RESET_CONTENT) {
        return Ok(None);
    }

    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.contains("application/json"));
    if !is_json {
        return Ok(None);
    }

    let bytes = response.bytes().await.map_err(ApiError::from)?;
    if bytes.is_empty() {
        return Ok(None);
    }

    serde_json::from_slice(&bytes).map(Some).map_err(|err| {
        ApiError::parse(
            status.as_u16(),
            format!("Could not read the server response: {err}"),
        )
    })
}

/// Access token from a refresh/login body: `data.accessToken`, else `accessToken`.
pub(crate) fn extract_access_token(body: &Value) -> ApiResult<String> {
    let token_at = |pointer: &str| {
        body.pointer(pointer)
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
    };
    token_at("/data/accessToken")
        .or_else(|| token_at("/accessToken"))
        .map(str::to_string)
        .ok_or_else(|| {
            ApiError::new(
                ApiErrorKind::Parse,
                "The server response did not include an access token.",
            )
        })
}
