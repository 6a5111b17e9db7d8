//! Current user, availability checks and account management.

use community_types::{Availability, AvailabilityQuery, PasswordChange, ProfileUpdate, User};

use crate::error::{ApiError, ApiErrorKind, ApiResult};
use crate::http::{ApiClient, ApiRequest, endpoints};

pub async fn fetch_me(client: &ApiClient) -> ApiResult<User> {
    client
        .request(ApiRequest::get(endpoints::ME).default_error("Could not load your profile."))
        .await
}

/// Asks whether an email or nickname is still free.
///
/// # Errors
/// Returns a parse error if the response does not answer the question.
pub async fn check_availability(client: &ApiClient, query: &AvailabilityQuery) -> ApiResult<bool> {
    let (key, value) = query.param();
    let request = ApiRequest::get(endpoints::AVAILABILITY)
        .query(key, value)
        .default_error("Could not check availability. Please try again later.");
    let availability: Option<Availability> = client.request(request).await?;

    availability
        .and_then(|availability| availability.is_available(query))
        .ok_or_else(|| {
            ApiError::new(
                ApiErrorKind::Parse,
                "The server did not return availability data.",
            )
        })
}

/// Updates nickname and profile image, refreshing the cached user.
pub async fn update_profile(client: &ApiClient, update: &ProfileUpdate) -> ApiResult<User> {
    let request = ApiRequest::patch(endpoints::ME)
        .json(update)?
        .default_error("Could not update your profile.");
    let data = client.send(request).await?;

    // No user in the response: fetch it.
    let user = match serde_json::from_value::<User>(data) {
        Ok(user) if user.id != 0 => user,
        _ => fetch_me(client).await?,
    };
    client.session().set_user(user.clone());
    Ok(user)
}

pub async fn change_password(client: &ApiClient, change: &PasswordChange) -> ApiResult<()> {
    let request = ApiRequest::post(endpoints::PASSWORD)
        .json(change)?
        .default_error("Could not change your password.");
    client.send(request).await.map(|_| ())
}

/// Deletes the account and clears the local session.
pub async fn delete_me(client: &ApiClient) -> ApiResult<()> {
    client
        .send(ApiRequest::delete(endpoints::ME).default_error("Could not delete your account."))
        .await?;
    client.session().clear();
    tracing::info!("account deleted");
    Ok(())
}
