//! Client-side form validation.
//!
//! Every validator trims its input first. Forms collect per-field errors and
//! only produce a request body when all fields are valid.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use community_types::{
    CommentBody, Credentials, PasswordChange, PostBody, ProfileUpdate, SignupRequest,
};
use regex::Regex;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9-]+(?:\.[a-zA-Z0-9-]+)*$")
        .unwrap_or_else(|err| panic!("email pattern is invalid: {err}"))
});

static NICKNAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9가-힣]{2,10}$")
        .unwrap_or_else(|err| panic!("nickname pattern is invalid: {err}"))
});

/// Special characters accepted (and one of which is required) in passwords.
pub const PASSWORD_SPECIALS: &str = r"!@#$%^&*()_+{}[]:;<>,.?~\/-";

pub const PASSWORD_MIN_CHARS: usize = 8;
pub const PASSWORD_MAX_CHARS: usize = 20;
pub const POST_TITLE_MAX_CHARS: usize = 26;

/// A single field validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    EmailRequired,
    EmailInvalid,
    PasswordRequired,
    PasswordWeak,
    ConfirmationRequired,
    ConfirmationMismatch,
    NicknameRequired,
    NicknameInvalid,
    TitleRequired,
    TitleTooLong,
    ContentRequired,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            ValidationError::EmailRequired => "Please enter your email.",
            ValidationError::EmailInvalid => {
                "Please enter a valid email address (e.g. example@example.com)."
            }
            ValidationError::PasswordRequired => "Please enter your password.",
            ValidationError::PasswordWeak => {
                "Passwords must be 8-20 characters and include an uppercase letter, \
                 a lowercase letter, a digit and a special character."
            }
            ValidationError::ConfirmationRequired => "Please enter your password again.",
            ValidationError::ConfirmationMismatch => "Passwords do not match.",
            ValidationError::NicknameRequired => "Please enter a nickname.",
            ValidationError::NicknameInvalid => {
                "Nicknames must be 2-10 characters with no spaces or symbols."
            }
            ValidationError::TitleRequired => "Please enter a title.",
            ValidationError::TitleTooLong => "Titles can be at most 26 characters.",
            ValidationError::ContentRequired => "Please enter some content.",
        };
        f.write_str(message)
    }
}

impl std::error::Error for ValidationError {}

/// Field name to error, for a whole form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<&'static str, ValidationError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the result of validating `field`.
    pub fn check<T>(
        &mut self,
        field: &'static str,
        result: Result<T, ValidationError>,
    ) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.0.insert(field, err);
                None
            }
        }
    }

    pub fn get(&self, field: &str) -> Option<ValidationError> {
        self.0.get(field).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, ValidationError)> + '_ {
        self.0.iter().map(|(field, err)| (*field, *err))
    }

    fn into_result<T>(self, value: Option<T>) -> Result<T, FieldErrors> {
        match value {
            Some(value) if self.is_empty() => Ok(value),
            _ => Err(self),
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (field, err)) in self.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{field}: {err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

/// Validates an email address. Returns the trimmed address.
pub fn validate_email(value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmailRequired);
    }
    if !EMAIL_PATTERN.is_match(trimmed) {
        return Err(ValidationError::EmailInvalid);
    }
    Ok(trimmed.to_string())
}

/// Validates password strength. Returns the trimmed password.
pub fn validate_password(value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::PasswordRequired);
    }

    let length = trimmed.chars().count();
    let strong = (PASSWORD_MIN_CHARS..=PASSWORD_MAX_CHARS).contains(&length)
        && !trimmed.contains(['\n', '\r'])
        && trimmed.chars().any(|c| c.is_ascii_lowercase())
        && trimmed.chars().any(|c| c.is_ascii_uppercase())
        && trimmed.chars().any(|c| c.is_ascii_digit())
        && trimmed.chars().any(|c| PASSWORD_SPECIALS.contains(c));
    if !strong {
        return Err(ValidationError::PasswordWeak);
    }
    Ok(trimmed.to_string())
}

/// Checks the confirmation against the original password, both trimmed.
pub fn validate_confirmation(value: &str, password: &str) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::ConfirmationRequired);
    }
    if trimmed != password.trim() {
        return Err(ValidationError::ConfirmationMismatch);
    }
    Ok(())
}

/// Validates a nickname. Returns the trimmed nickname.
pub fn validate_nickname(value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::NicknameRequired);
    }
    if !NICKNAME_PATTERN.is_match(trimmed) {
        return Err(ValidationError::NicknameInvalid);
    }
    Ok(trimmed.to_string())
}

pub fn validate_title(value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::TitleRequired);
    }
    if trimmed.chars().count() > POST_TITLE_MAX_CHARS {
        return Err(ValidationError::TitleTooLong);
    }
    Ok(trimmed.to_string())
}

pub fn validate_content(value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::ContentRequired);
    }
    Ok(trimmed.to_string())
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    /// # Errors
    /// Returns the per-field errors if any field is invalid.
    pub fn validate(&self) -> Result<Credentials, FieldErrors> {
        let mut errors = FieldErrors::new();
        let email = errors.check("email", validate_email(&self.email));
        let password = errors.check("password", validate_password(&self.password));
        let credentials = email
            .zip(password)
            .map(|(email, password)| Credentials { email, password });
        errors.into_result(credentials)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    pub nickname: String,
}

impl SignupForm {
    /// Builds the signup body; the profile image URL is filled in after upload.
    ///
    /// # Errors
    /// Returns the per-field errors if any field is invalid.
    pub fn validate(&self) -> Result<SignupRequest, FieldErrors> {
        let mut errors = FieldErrors::new();
        let email = errors.check("email", validate_email(&self.email));
        let password = errors.check("password", validate_password(&self.password));
        errors.check(
            "password_confirm",
            validate_confirmation(&self.password_confirm, &self.password),
        );
        let nickname = errors.check("nickname", validate_nickname(&self.nickname));

        let request = match (email, password, nickname) {
            (Some(email), Some(password), Some(nickname)) => Some(SignupRequest {
                email,
                password,
                nickname,
                profile_image_url: None,
            }),
            _ => None,
        };
        errors.into_result(request)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProfileForm {
    pub nickname: String,
    pub profile_image_url: Option<String>,
}

impl ProfileForm {
    /// # Errors
    /// Returns the per-field errors if the nickname is invalid.
    pub fn validate(&self) -> Result<ProfileUpdate, FieldErrors> {
        let mut errors = FieldErrors::new();
        let update = errors
            .check("nickname", validate_nickname(&self.nickname))
            .map(|nickname| ProfileUpdate {
                nickname,
                profile_image_url: self.profile_image_url.clone(),
            });
        errors.into_result(update)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PasswordForm {
    pub password: String,
    pub password_confirm: String,
}

impl PasswordForm {
    /// # Errors
    /// Returns the per-field errors if any field is invalid.
    pub fn validate(&self) -> Result<PasswordChange, FieldErrors> {
        let mut errors = FieldErrors::new();
        let password = errors.check("password", validate_password(&self.password));
        errors.check(
            "password_confirm",
            validate_confirmation(&self.password_confirm, &self.password),
        );
        let change = password.map(|new_password| PasswordChange { new_password });
        errors.into_result(change)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PostDraft {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
}

impl PostDraft {
    /// # Errors
    /// Returns the per-field errors if the title or content is invalid.
    pub fn validate(&self) -> Result<PostBody, FieldErrors> {
        let mut errors = FieldErrors::new();
        let title = errors.check("title", validate_title(&self.title));
        let content = errors.check("content", validate_content(&self.content));
        let tag_names = self
            .tags
            .iter()
            .map(|tag| tag.trim())
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect();
        let body = title.zip(content).map(|(title, content)| PostBody {
            title,
            content,
            tag_names,
        });
        errors.into_result(body)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CommentDraft {
    pub content: String,
}

impl CommentDraft {
    /// # Errors
    /// Returns the per-field errors if the content is empty.
    pub fn validate(&self) -> Result<CommentBody, FieldErrors> {
        let mut errors = FieldErrors::new();
        let body = errors
            .check("content", validate_content(&self.content))
            .map(|content| CommentBody { content });
        errors.into_result(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email() {
        assert_eq!(validate_email(""), Err(ValidationError::EmailRequired));
        assert_eq!(validate_email("   "), Err(ValidationError::EmailRequired));
        assert_eq!(validate_email("no-at-sign"), Err(ValidationError::EmailInvalid));
        assert_eq!(validate_email("a@b..c"), Err(ValidationError::EmailInvalid));
        assert_eq!(validate_email(" user@example.com ").unwrap(), "user@example.com");
        assert!(validate_email("first.last+tag@sub.example.co.kr").is_ok());
    }

    #[test]
    fn test_password() {
        assert_eq!(validate_password(""), Err(ValidationError::PasswordRequired));
        assert_eq!(validate_password("Ab1!"), Err(ValidationError::PasswordWeak));
        assert_eq!(validate_password("abcdefg1!"), Err(ValidationError::PasswordWeak));
        assert_eq!(validate_password("ABCDEFG1!"), Err(ValidationError::PasswordWeak));
        assert_eq!(validate_password("Abcdefgh!"), Err(ValidationError::PasswordWeak));
        assert_eq!(validate_password("Abcdefgh1"), Err(ValidationError::PasswordWeak));
        assert_eq!(
            validate_password("Abcdefgh1!Abcdefgh1!x"),
            Err(ValidationError::PasswordWeak)
        );
        assert_eq!(validate_password(" Passw0rd! ").unwrap(), "Passw0rd!");
        assert!(validate_password(r"Passw0rd\").is_ok());
    }

    #[test]
    fn test_confirmation() {
        assert_eq!(
            validate_confirmation("", "Passw0rd!"),
            Err(ValidationError::ConfirmationRequired)
        );
        assert_eq!(
            validate_confirmation("Passw0rd?", "Passw0rd!"),
            Err(ValidationError::ConfirmationMismatch)
        );
        assert!(validate_confirmation(" Passw0rd! ", "Passw0rd!").is_ok());
    }

    #[test]
    fn test_nickname() {
        assert_eq!(validate_nickname(""), Err(ValidationError::NicknameRequired));
        assert_eq!(validate_nickname("a"), Err(ValidationError::NicknameInvalid));
        assert_eq!(
            validate_nickname("elevenchars"),
            Err(ValidationError::NicknameInvalid)
        );
        assert_eq!(validate_nickname("has space"), Err(ValidationError::NicknameInvalid));
        assert_eq!(validate_nickname("bad!"), Err(ValidationError::NicknameInvalid));
        assert!(validate_nickname("tenchars10").is_ok());
        assert!(validate_nickname("개발자").is_ok());
    }

    #[test]
    fn test_title_and_content() {
        assert_eq!(validate_title(" "), Err(ValidationError::TitleRequired));
        assert_eq!(
            validate_title(&"x".repeat(27)),
            Err(ValidationError::TitleTooLong)
        );
        assert!(validate_title(&"가".repeat(26)).is_ok());
        assert_eq!(validate_content("\n\t"), Err(ValidationError::ContentRequired));
    }

    #[test]
    fn test_login_form_collects_every_error() {
        let errors = LoginForm::default().validate().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get("email"), Some(ValidationError::EmailRequired));
        assert_eq!(errors.get("password"), Some(ValidationError::PasswordRequired));
    }

    #[test]
    fn test_signup_form() {
        let form = SignupForm {
            email: "new@example.com".into(),
            password: "Passw0rd!".into(),
            password_confirm: "Passw0rd!".into(),
            nickname: "newbie".into(),
        };
        let request = form.validate().unwrap();
        assert_eq!(request.nickname, "newbie");
        assert!(request.profile_image_url.is_none());

        let mismatched = SignupForm {
            password_confirm: "different".into(),
            ..form
        };
        let errors = mismatched.validate().unwrap_err();
        assert_eq!(
            errors.get("password_confirm"),
            Some(ValidationError::ConfirmationMismatch)
        );
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_password_form_mismatch() {
        let form = PasswordForm {
            password: "Passw0rd!".into(),
            password_confirm: "Passw0rd".into(),
        };
        assert!(form.validate().is_err());
    }

    #[test]
    fn test_post_draft_trims_and_drops_blank_tags() {
        let draft = PostDraft {
            title: "  Hello  ".into(),
            content: "body".into(),
            tags: vec![" rust ".into(), String::new()],
        };
        let body = draft.validate().unwrap();
        assert_eq!(body.title, "Hello");
        assert_eq!(body.tag_names, vec!["rust".to_string()]);
    }

    #[test]
    fn test_field_errors_display() {
        let errors = CommentDraft::default().validate().unwrap_err();
        assert_eq!(errors.to_string(), "content: Please enter some content.");
    }
}
