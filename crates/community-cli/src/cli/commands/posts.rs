//! Post command handlers.

use anyhow::Result;
use community_core::api::posts::{self, PostFeed, PostQuery};
use community_core::api::{comments, likes};
use community_core::validation::PostDraft;
use community_types::PostSort;

use super::require_login;
use crate::cli::{App, render};

pub async fn list(
    app: &App,
    sort: PostSort,
    page: u32,
    size: u32,
    keyword: Option<String>,
) -> Result<()> {
    let query = PostQuery {
        page,
        size,
        sort,
        keyword,
    };
    let result = posts::list(&app.client, &query).await?;
    if result.content.is_empty() {
        println!("No posts found.");
        return Ok(());
    }
    for post in &result.content {
        println!("{}", render::post_line(post));
    }
    let total = result.total_pages();
    println!("page {}/{total}", result.page.unwrap_or(page));
    Ok(())
}

pub async fn list_all(
    app: &App,
    sort: PostSort,
    size: u32,
    keyword: Option<String>,
) -> Result<()> {
    let mut feed = PostFeed::new(app.client.clone(), sort, size).with_keyword(keyword);
    let mut count = 0usize;
    while let Some(page) = feed.next_page().await? {
        for post in &page {
            println!("{}", render::post_line(post));
        }
        count += page.len();
    }
    if count == 0 {
        println!("No posts found.");
    }
    Ok(())
}

pub async fn show(app: &App, id: u64, comments_page: u32) -> Result<()> {
    let post = posts::get(&app.client, id).await?;
    println!("{}", render::post_detail(&post));

    let size = Some(app.config.comment_page_size);
    let page = comments::list(&app.client, id, comments_page, size).await?;
    println!();
    println!("{}", render::comment_page(&page, comments_page));
    Ok(())
}

pub async fn create(app: &App, title: String, content: String, tags: Vec<String>) -> Result<()> {
    require_login(app)?;
    let body = PostDraft {
        title,
        content,
        tags,
    }
    .validate()?;
    let post = posts::create(&app.client, &body).await?;
    println!("Created post #{}.", post.id);
    Ok(())
}

pub async fn edit(
    app: &App,
    id: u64,
    title: Option<String>,
    content: Option<String>,
    tags: Option<Vec<String>>,
) -> Result<()> {
    require_login(app)?;
    let current = posts::get(&app.client, id).await?;
    let body = PostDraft {
        title: title.unwrap_or(current.title),
        content: content.unwrap_or(current.content),
        tags: tags.unwrap_or(current.tags),
    }
    .validate()?;
    posts::update(&app.client, id, &body).await?;
    println!("Updated post #{id}.");
    Ok(())
}

pub async fn delete(app: &App, id: u64) -> Result<()> {
    require_login(app)?;
    posts::delete(&app.client, id).await?;
    println!("Deleted post #{id}.");
    Ok(())
}

pub async fn like(app: &App, id: u64) -> Result<()> {
    require_login(app)?;
    let status = likes::like(&app.client, id).await?;
    match status.like_count {
        Some(count) => println!("Liked post #{id} ({count} likes)."),
        None => println!("Liked post #{id}."),
    }
    Ok(())
}

pub async fn unlike(app: &App, id: u64) -> Result<()> {
    require_login(app)?;
    let status = likes::unlike(&app.client, id).await?;
    match status.like_count {
        Some(count) => println!("Removed like from post #{id} ({count} likes)."),
        None => println!("Removed like from post #{id}."),
    }
    Ok(())
}
