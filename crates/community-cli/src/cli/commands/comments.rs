//! Comment command handlers.

use anyhow::Result;
use community_core::api::comments;
use community_core::validation::CommentDraft;

use super::require_login;
use crate::cli::{App, render};

pub async fn list(app: &App, post_id: u64, page: u32) -> Result<()> {
    let size = Some(app.config.comment_page_size);
    let result = comments::list(&app.client, post_id, page, size).await?;
    println!("{}", render::comment_page(&result, page));
    Ok(())
}

pub async fn add(app: &App, post_id: u64, content: String) -> Result<()> {
    require_login(app)?;
    let body = CommentDraft { content }.validate()?;
    let comment = comments::create(&app.client, post_id, &body).await?;
    if comment.id == 0 {
        println!("Commented on post #{post_id}.");
    } else {
        println!("Added comment [{}] to post #{post_id}.", comment.id);
    }
    Ok(())
}

pub async fn edit(app: &App, id: u64, content: String) -> Result<()> {
    require_login(app)?;
    let body = CommentDraft { content }.validate()?;
    comments::update(&app.client, id, &body).await?;
    println!("Updated comment [{id}].");
    Ok(())
}

pub async fn delete(app: &App, id: u64) -> Result<()> {
    require_login(app)?;
    comments::delete(&app.client, id).await?;
    println!("Deleted comment [{id}].");
    Ok(())
}
