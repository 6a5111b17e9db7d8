//! Community API services.
//!
//! Thin async functions over [`ApiClient`](crate::ApiClient), one module per
//! backend resource. Each sets the operation's fallback error message and
//! applies the operation-specific error wording.

pub mod auth;
pub mod comments;
pub mod likes;
pub mod posts;
pub mod uploads;
pub mod users;

pub use posts::PostFeed;
