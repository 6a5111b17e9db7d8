//! Core community client library (config, session, HTTP client, API services).

pub mod api;
pub mod config;
pub mod error;
pub mod format;
pub mod http;
pub mod logging;
pub mod media;
pub mod session;
pub mod validation;

pub use error::{ApiError, ApiErrorKind, ApiResult};
pub use http::{ApiClient, ApiRequest};
pub use session::{AuthState, SessionStore};
