//! Comments on posts.

use community_types::{Comment, CommentBody, Page};

use super::posts::forbidden_as;
use crate::error::ApiResult;
use crate::http::{ApiClient, ApiRequest, endpoints};

pub const NO_PERMISSION_EDIT: &str = "You do not have permission to edit this comment.";
pub const NO_PERMISSION_DELETE: &str = "You do not have permission to delete this comment.";

/// One page (1-based) of a post's comments.
pub async fn list(
    client: &ApiClient,
    post_id: u64,
    page: u32,
    size: Option<u32>,
) -> ApiResult<Page<Comment>> {
    let request = ApiRequest::get(endpoints::post_comments(post_id))
        .query("page", page)
        .query_opt("size", size)
        .default_error("Could not load comments.");
    let page: Option<Page<Comment>> = client.request(request).await?;
    Ok(page.unwrap_or_default())
}

/// Adds a comment. The returned comment may only carry its id.
pub async fn create(client: &ApiClient, post_id: u64, body: &CommentBody) -> ApiResult<Comment> {
    let request = ApiRequest::post(endpoints::post_comments(post_id))
        .json(body)?
        .default_error("Could not add the comment.");
    let data = client.send(request).await?;
    Ok(serde_json::from_value(data).unwrap_or_default())
}

pub async fn update(client: &ApiClient, comment_id: u64, body: &CommentBody) -> ApiResult<()> {
    let request = ApiRequest::put(endpoints::comment(comment_id))
        .json(body)?
        .default_error("Could not update the comment.");
    client
        .send(request)
        .await
        .map(|_| ())
        .map_err(|err| forbidden_as(err, NO_PERMISSION_EDIT))
}

pub async fn delete(client: &ApiClient, comment_id: u64) -> ApiResult<()> {
    let request = ApiRequest::delete(endpoints::comment(comment_id))
        .default_error("Could not delete the comment.");
    client
        .send(request)
        .await
        .map(|_| ())
        .map_err(|err| forbidden_as(err, NO_PERMISSION_DELETE))
}
