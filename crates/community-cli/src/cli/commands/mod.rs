//! CLI command handlers.

pub mod auth;
pub mod comments;
pub mod config;
pub mod posts;
pub mod profile;

use anyhow::{Result, bail};
use community_core::api::uploads;
use community_core::media::ImageFile;

use super::App;

/// Fails early when there is no stored session.
fn require_login(app: &App) -> Result<()> {
    if !app.session().is_authenticated() {
        bail!("You are not logged in. Run `community login` first.");
    }
    Ok(())
}

/// Reads and uploads an image, returning its public URL.
async fn upload_image(app: &App, path: &str) -> Result<String> {
    let image = ImageFile::load(path).await?;
    println!("Uploading {}...", image.file_name);
    Ok(uploads::upload_image(&app.client, &image).await?)
}
