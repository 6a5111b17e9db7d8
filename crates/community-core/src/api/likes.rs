//! Post likes, with an optimistic toggle.

use community_types::{LikeStatus, Post};

use crate::error::ApiResult;
use crate::http::{ApiClient, ApiRequest, endpoints};

pub async fn like(client: &ApiClient, post_id: u64) -> ApiResult<LikeStatus> {
    let request =
        ApiRequest::post(endpoints::post_likes(post_id)).default_error("Could not like the post.");
    Ok(status_from(client.send(request).await?))
}

pub async fn unlike(client: &ApiClient, post_id: u64) -> ApiResult<LikeStatus> {
    let request = ApiRequest::delete(endpoints::post_likes(post_id))
        .default_error("Could not remove the like.");
    Ok(status_from(client.send(request).await?))
}

/// The like endpoints may answer with no body.
fn status_from(data: serde_json::Value) -> LikeStatus {
    serde_json::from_value(data).unwrap_or_default()
}

/// Flips the like on `post` before the request and rolls it back on failure.
///
/// On success any like state echoed by the server wins over the local guess.
///
/// # Errors
/// Returns the request failure; `post` is restored first.
pub async fn toggle(client: &ApiClient, post: &mut Post) -> ApiResult<()> {
    let previous = (post.liked, post.like_count);
    let was_liked = post.liked;
    post.toggle_like();

    let result = if was_liked {
        unlike(client, post.id).await
    } else {
        like(client, post.id).await
    };

    match result {
        Ok(status) => {
            post.apply_like_status(status);
            Ok(())
        }
        Err(err) => {
            (post.liked, post.like_count) = previous;
            tracing::debug!(post_id = post.id, error = %err, "like toggle rolled back");
            Err(err)
        }
    }
}
