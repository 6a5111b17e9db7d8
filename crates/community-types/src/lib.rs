//! Wire types shared by the community client crates.
//!
//! Every payload the backend returns is wrapped in an [`Envelope`]. The
//! entities here mirror the JSON the backend emits (camelCase, with the
//! `userId` / `postId` / `commentId` aliases it uses for identifiers).

mod comment;
mod envelope;
mod page;
mod post;
mod user;

pub use comment::{Comment, CommentBody};
pub use envelope::Envelope;
pub use page::Page;
pub use post::{LikeStatus, Post, PostBody, PostSort};
pub use user::{
    AuthTokens, Author, Availability, AvailabilityQuery, Credentials, PasswordChange,
    PresignedUpload, ProfileUpdate, SignupRequest, User,
};
