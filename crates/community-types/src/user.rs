use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The signed-in user as returned by `/api/users/me`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(alias = "userId")]
    pub id: u64,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub nickname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
}

/// Author summary embedded in posts and comments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    #[serde(default, alias = "userId")]
    pub id: u64,
    #[serde(default)]
    pub nickname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
}

/// Login request body.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Signup request body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub nickname: String,
    pub profile_image_url: Option<String>,
}

/// Token payload of login, signup and refresh responses.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokens {
    pub access_token: String,
}

/// Profile edit body for `PATCH /api/users/me`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub nickname: String,
    pub profile_image_url: Option<String>,
}

/// Body for `POST /api/users/me/password`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    pub new_password: String,
}

/// Which field an availability check asks about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvailabilityQuery {
    Email(String),
    Nickname(String),
}

impl AvailabilityQuery {
    /// Query parameter pair sent to `/api/users/availability`.
    pub fn param(&self) -> (&'static str, &str) {
        match self {
            Self::Email(value) => ("email", value),
            Self::Nickname(value) => ("nickname", value),
        }
    }
}

/// Result of `/api/users/availability`.
///
/// The backend only fills the flag for the field that was asked about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    #[serde(default)]
    pub email_available: Option<bool>,
    #[serde(default)]
    pub nickname_available: Option<bool>,
}

impl Availability {
    /// Returns the flag matching the query, `None` if the backend omitted it.
    pub fn is_available(&self, query: &AvailabilityQuery) -> Option<bool> {
        match query {
            AvailabilityQuery::Email(_) => self.email_available,
            AvailabilityQuery::Nickname(_) => self.nickname_available,
        }
    }
}

/// Presigned upload target returned by `/api/uploads/presigned-url`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignedUpload {
    pub upload_url: String,
    /// Headers the storage backend expects, lower-cased names to values.
    #[serde(default)]
    pub headers: BTreeMap<String, Vec<String>>,
}

impl PresignedUpload {
    /// First value of a signed header, if present.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// The public URL of the uploaded object (upload URL without its query).
    pub fn public_url(&self) -> &str {
        self.upload_url
            .split_once('?')
            .map_or(self.upload_url.as_str(), |(base, _)| base)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_user_accepts_user_id_alias() {
        let user: User = serde_json::from_value(json!({
            "userId": 7,
            "email": "a@b.com",
            "nickname": "alice",
            "profileImageUrl": "https://cdn/x.png"
        }))
        .unwrap();
        assert_eq!(user.id, 7);
        assert_eq!(user.profile_image_url.as_deref(), Some("https://cdn/x.png"));
    }

    #[test]
    fn test_availability_flag_for_query() {
        let avail: Availability =
            serde_json::from_value(json!({ "nicknameAvailable": false })).unwrap();
        assert_eq!(
            avail.is_available(&AvailabilityQuery::Nickname("bob".into())),
            Some(false)
        );
        assert_eq!(
            avail.is_available(&AvailabilityQuery::Email("a@b.com".into())),
            None
        );
    }

    #[test]
    fn test_presigned_public_url_strips_query() {
        let upload: PresignedUpload = serde_json::from_value(json!({
            "uploadUrl": "https://bucket.s3/img/1.png?X-Amz-Signature=abc",
            "headers": { "cache-control": ["max-age=31536000"] }
        }))
        .unwrap();
        assert_eq!(upload.public_url(), "https://bucket.s3/img/1.png");
        assert_eq!(upload.header("Cache-Control"), Some("max-age=31536000"));
    }

    #[test]
    fn test_signup_request_serializes_camel_case() {
        let body = serde_json::to_value(SignupRequest {
            email: "a@b.com".into(),
            password: "pw".into(),
            nickname: "alice".into(),
            profile_image_url: None,
        })
        .unwrap();
        assert_eq!(body["profileImageUrl"], serde_json::Value::Null);
        assert_eq!(body["nickname"], "alice");
    }
}
