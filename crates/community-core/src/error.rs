//! Typed errors surfaced by the HTTP client and API services.

use std::fmt;

use community_types::Envelope;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fallback message when neither the server nor the caller supplied one.
pub const GENERIC_FAILURE: &str = "The request could not be completed.";

/// Error categories, used by callers to branch on failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    /// Connection failure, timeout or other transport error
    Network,
    /// Response body could not be decoded
    Parse,
    /// Non-2xx response from the backend
    Status,
    /// The access token could not be refreshed; the session was cleared
    SessionExpired,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiErrorKind::Network => write!(f, "network"),
            ApiErrorKind::Parse => write!(f, "parse"),
            ApiErrorKind::Status => write!(f, "status"),
            ApiErrorKind::SessionExpired => write!(f, "session_expired"),
        }
    }
}

/// Structured error carrying the HTTP status and server code for UI branching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    /// One-line summary suitable for display
    pub message: String,
    /// HTTP status of the failed response
    pub status: Option<u16>,
    /// Server-provided error code (e.g. `USER_NOT_FOUND`)
    pub code: Option<String>,
    /// Raw error body, when there was one
    pub data: Option<Value>,
}

impl ApiError {
    /// Creates an error of the given kind with no status.
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            code: None,
            data: None,
        }
    }

    /// Creates a transport error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Network, message)
    }

    /// Creates a decode error for a response with the given status.
    pub fn parse(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            ..Self::new(ApiErrorKind::Parse, message)
        }
    }

    /// Creates the error returned once a refresh failed and the session was cleared.
    pub fn session_expired() -> Self {
        Self {
            status: Some(401),
            ..Self::new(
                ApiErrorKind::SessionExpired,
                "Your session has expired. Please log in again.",
            )
        }
    }

    /// Creates a status error from a non-2xx response body.
    ///
    /// The message is the server's `message`, else `default_message`, else a
    /// generic failure.
    pub fn from_response(status: u16, body: Option<Value>, default_message: Option<&str>) -> Self {
        let message = body
            .as_ref()
            .and_then(Envelope::message_of)
            .or(default_message)
            .unwrap_or(GENERIC_FAILURE)
            .to_string();
        let code = body
            .as_ref()
            .and_then(Envelope::code_of)
            .map(str::to_string);

        Self {
            kind: ApiErrorKind::Status,
            message,
            status: Some(status),
            code,
            data: body,
        }
    }

    /// Returns a copy with a different display message, keeping status and code.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn is_status(&self, status: u16) -> bool {
        self.kind == ApiErrorKind::Status && self.status == Some(status)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.is_status(401) || self.kind == ApiErrorKind::SessionExpired
    }

    pub fn is_forbidden(&self) -> bool {
        self.is_status(403)
    }

    pub fn is_not_found(&self) -> bool {
        self.is_status(404)
    }

    pub fn has_code(&self, code: &str) -> bool {
        self.code.as_deref() == Some(code)
    }

    /// Classifies the error into a user-facing category.
    pub fn category(&self) -> ErrorCategory {
        match (self.kind, self.status) {
            (ApiErrorKind::SessionExpired, _) | (ApiErrorKind::Status, Some(401)) => {
                ErrorCategory::LoginRequired
            }
            (ApiErrorKind::Status, Some(403)) => ErrorCategory::PermissionDenied,
            (ApiErrorKind::Status, Some(404)) => ErrorCategory::NotFound,
            (ApiErrorKind::Status, Some(400 | 422)) => ErrorCategory::Validation,
            _ => ErrorCategory::Failure,
        }
    }

    /// Message suitable for showing to the user.
    ///
    /// Session and permission errors use fixed wording; everything else keeps
    /// the server (or operation) message.
    pub fn user_message(&self) -> String {
        match self.category() {
            ErrorCategory::LoginRequired if self.kind == ApiErrorKind::SessionExpired => {
                self.message.clone()
            }
            ErrorCategory::LoginRequired => "You need to log in first.".to_string(),
            ErrorCategory::PermissionDenied if self.message == GENERIC_FAILURE => {
                "You do not have permission to do that.".to_string()
            }
            ErrorCategory::NotFound if self.message == GENERIC_FAILURE => {
                "The requested item could not be found.".to_string()
            }
            _ => self.message.clone(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) if self.kind == ApiErrorKind::Status => {
                write!(f, "{} (HTTP {status})", self.message)
            }
            _ => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::network(format!("Request timed out: {err}"));
        }
        if err.is_decode() {
            let status = err.status().map_or(0, |s| s.as_u16());
            return Self::parse(status, format!("Could not read the server response: {err}"));
        }
        Self::network(format!("Could not reach the server: {err}"))
    }
}

/// User-facing error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    LoginRequired,
    PermissionDenied,
    NotFound,
    Validation,
    Failure,
}

/// Result type for API operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
