//! Profile command handlers.

use anyhow::{Result, bail};
use community_core::api::users;
use community_core::validation::{PasswordForm, ProfileForm};
use community_types::AvailabilityQuery;

use super::{require_login, upload_image};
use crate::cli::{App, render};

pub async fn edit(app: &App, nickname: Option<String>, image: Option<String>) -> Result<()> {
    require_login(app)?;
    if nickname.is_none() && image.is_none() {
        bail!("Nothing to change. Pass --nickname and/or --image.");
    }

    let current = match app.session().user() {
        Some(user) => user,
        None => users::fetch_me(&app.client).await?,
    };
    let mut update = ProfileForm {
        nickname: nickname.unwrap_or_else(|| current.nickname.clone()),
        profile_image_url: current.profile_image_url,
    }
    .validate()?;

    if update.nickname != current.nickname {
        let query = AvailabilityQuery::Nickname(update.nickname.clone());
        if !users::check_availability(&app.client, &query).await? {
            bail!("The nickname {} is already in use.", update.nickname);
        }
    }

    if let Some(path) = &image {
        update.profile_image_url = Some(upload_image(app, path).await?);
    }

    let user = users::update_profile(&app.client, &update).await?;
    println!("Profile updated.");
    println!("{}", render::user(&user));
    Ok(())
}

pub async fn password(app: &App, password: String, confirm: String) -> Result<()> {
    require_login(app)?;
    let change = PasswordForm {
        password,
        password_confirm: confirm,
    }
    .validate()?;
    users::change_password(&app.client, &change).await?;
    println!("Password changed.");
    Ok(())
}

pub async fn delete(app: &App, yes: bool) -> Result<()> {
    require_login(app)?;
    if !yes {
        bail!("Deleting your account cannot be undone. Re-run with --yes to confirm.");
    }
    users::delete_me(&app.client).await?;
    println!("Account deleted.");
    Ok(())
}
