//! Login, signup and logout.

use community_types::{AuthTokens, Credentials, SignupRequest, User};

use super::users;
use crate::error::{ApiError, ApiResult};
use crate::http::{ApiClient, ApiRequest, endpoints};

pub const LOGIN_NOT_FOUND: &str = "Please check your email and password.";
pub const LOGIN_INVALID: &str = "The email or password is not valid.";

/// Logs in, stores the token and caches the current user.
///
/// # Errors
/// Unknown accounts and invalid credentials get dedicated messages.
pub async fn login(client: &ApiClient, credentials: &Credentials) -> ApiResult<User> {
    let request = ApiRequest::post(endpoints::LOGIN)
        .json(credentials)?
        .default_error("Login failed.");
    let tokens: AuthTokens = client.request(request).await.map_err(login_error)?;

    client.session().login(None, tokens.access_token);
    tracing::info!("logged in");

    let user = users::fetch_me(client).await?;
    client.session().set_user(user.clone());
    Ok(user)
}

fn login_error(err: ApiError) -> ApiError {
    if err.is_not_found() || err.has_code("USER_NOT_FOUND") {
        err.with_message(LOGIN_NOT_FOUND)
    } else if err.is_status(422) {
        err.with_message(LOGIN_INVALID)
    } else {
        err
    }
}

/// Creates an account, then signs in with the returned token.
///
/// # Errors
/// Returns the backend error; nothing is stored on failure.
pub async fn signup(client: &ApiClient, request: &SignupRequest) -> ApiResult<User> {
    let request = ApiRequest::post(endpoints::SIGNUP)
        .json(request)?
        .default_error("Signup failed.");
    let tokens: AuthTokens = client.request(request).await?;

    client.session().login(None, tokens.access_token);
    tracing::info!("signed up");

    let user = users::fetch_me(client).await?;
    client.session().set_user(user.clone());
    Ok(user)
}

/// Logs out. The local session is cleared even if the call fails.
///
/// # Errors
/// Returns the backend error after clearing the session.
pub async fn logout(client: &ApiClient) -> ApiResult<()> {
    let result = client
        .send(ApiRequest::post(endpoints::LOGOUT).default_error("Logout failed."))
        .await;
    client.session().clear();
    tracing::info!("logged out");
    result.map(|_| ())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_login_error_wording() {
        let not_found = login_error(ApiError::from_response(404, None, None));
        assert_eq!(not_found.message, LOGIN_NOT_FOUND);
        assert_eq!(not_found.status, Some(404));

        let coded = login_error(ApiError::from_response(
            400,
            Some(json!({ "success": false, "code": "USER_NOT_FOUND" })),
            None,
        ));
        assert_eq!(coded.message, LOGIN_NOT_FOUND);

        let invalid = login_error(ApiError::from_response(422, None, None));
        assert_eq!(invalid.message, LOGIN_INVALID);

        let other = login_error(ApiError::from_response(500, None, Some("Login failed.")));
        assert_eq!(other.message, "Login failed.");
    }
}
