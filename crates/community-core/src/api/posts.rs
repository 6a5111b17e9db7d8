//! Post listing, detail and CRUD.

use community_types::{Page, Post, PostBody, PostSort};

use crate::error::{ApiError, ApiResult};
use crate::http::{ApiClient, ApiRequest, endpoints};

pub const NO_PERMISSION_EDIT: &str = "You do not have permission to edit this post.";
pub const NO_PERMISSION_DELETE: &str = "You do not have permission to delete this post.";

/// Query for one page of the post list.
#[derive(Debug, Clone, Default)]
pub struct PostQuery {
    /// 1-based page number
    pub page: u32,
    pub size: u32,
    pub sort: PostSort,
    pub keyword: Option<String>,
}

pub async fn list(client: &ApiClient, query: &PostQuery) -> ApiResult<Page<Post>> {
    let request = ApiRequest::get(endpoints::POSTS)
        .query("page", query.page)
        .query("size", query.size)
        .query("sort", query.sort.as_param())
        .query_opt("keyword", query.keyword.as_deref())
        .default_error("Could not load posts.");
    let page: Option<Page<Post>> = client.request(request).await?;
    Ok(page.unwrap_or_default())
}

pub async fn get(client: &ApiClient, post_id: u64) -> ApiResult<Post> {
    client
        .request(
            ApiRequest::get(endpoints::post(post_id)).default_error("Could not load the post."),
        )
        .await
}

/// Creates a post. The returned post may only carry its id.
pub async fn create(client: &ApiClient, body: &PostBody) -> ApiResult<Post> {
    let request = ApiRequest::post(endpoints::POSTS)
        .json(body)?
        .default_error("Could not create the post.");
    client.request(request).await
}

pub async fn update(client: &ApiClient, post_id: u64, body: &PostBody) -> ApiResult<()> {
    let request = ApiRequest::put(endpoints::post(post_id))
        .json(body)?
        .default_error("Could not update the post.");
    client
        .send(request)
        .await
        .map(|_| ())
        .map_err(|err| forbidden_as(err, NO_PERMISSION_EDIT))
}

pub async fn delete(client: &ApiClient, post_id: u64) -> ApiResult<()> {
    let request =
        ApiRequest::delete(endpoints::post(post_id)).default_error("Could not delete the post.");
    client
        .send(request)
        .await
        .map(|_| ())
        .map_err(|err| forbidden_as(err, NO_PERMISSION_DELETE))
}

pub(super) fn forbidden_as(err: ApiError, message: &str) -> ApiError {
    if err.is_forbidden() {
        err.with_message(message)
    } else {
        err
    }
}

/// Infinite-scroll pager over the post list.
///
/// Starts at page 1 and follows [`Page::next_page`] until the last page.
/// Changing the sort or keyword means starting a new feed.
pub struct PostFeed {
    client: ApiClient,
    sort: PostSort,
    size: u32,
    keyword: Option<String>,
    next: Option<u32>,
    fetched: u32,
}

impl PostFeed {
    pub fn new(client: ApiClient, sort: PostSort, size: u32) -> Self {
        Self {
            client,
            sort,
            size,
            keyword: None,
            next: Some(1),
            fetched: 0,
        }
    }

    #[must_use]
    pub fn with_keyword(mut self, keyword: Option<String>) -> Self {
        self.keyword = keyword.filter(|k| !k.trim().is_empty());
        self
    }

    pub fn has_more(&self) -> bool {
        self.next.is_some()
    }

    pub fn pages_fetched(&self) -> u32 {
        self.fetched
    }

    /// Loads the next page, `None` once the feed is exhausted.
    ///
    /// # Errors
    /// A failed page can be retried; the feed position is unchanged.
    pub async fn next_page(&mut self) -> ApiResult<Option<Vec<Post>>> {
        let Some(page) = self.next else {
            return Ok(None);
        };

        let query = PostQuery {
            page,
            size: self.size,
            sort: self.sort,
            keyword: self.keyword.clone(),
        };
        let result = list(&self.client, &query).await?;

        self.fetched += 1;
        self.next = result.next_page(self.fetched);
        tracing::debug!(page, next = ?self.next, items = result.content.len(), "post page loaded");
        Ok(Some(result.content))
    }

    /// Loads every remaining page.
    ///
    /// # Errors
    /// Returns the first page failure.
    pub async fn collect_all(&mut self) -> ApiResult<Vec<Post>> {
        let mut posts = Vec::new();
        while let Some(page) = self.next_page().await? {
            posts.extend(page);
        }
        Ok(posts)
    }
}
