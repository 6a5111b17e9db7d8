//! Login, signup, logout and whoami.

use anyhow::{Result, bail};
use community_core::api::{auth, users};
use community_core::validation::{LoginForm, SignupForm};
use community_types::AvailabilityQuery;

use super::upload_image;
use crate::cli::{App, render};

pub async fn login(app: &App, email: String, password: String) -> Result<()> {
    let credentials = LoginForm { email, password }.validate()?;
    let user = auth::login(&app.client, &credentials).await?;
    println!("Logged in as {}.", user.nickname);
    Ok(())
}

pub struct SignupArgs {
    pub email: String,
    pub nickname: String,
    pub password: String,
    pub confirm: String,
    pub image: Option<String>,
}

pub async fn signup(app: &App, args: SignupArgs) -> Result<()> {
    let form = SignupForm {
        email: args.email,
        password: args.password,
        password_confirm: args.confirm,
        nickname: args.nickname,
    };
    let mut request = form.validate()?;

    let email = AvailabilityQuery::Email(request.email.clone());
    if !users::check_availability(&app.client, &email).await? {
        bail!("The email {} is already in use.", request.email);
    }
    let nickname = AvailabilityQuery::Nickname(request.nickname.clone());
    if !users::check_availability(&app.client, &nickname).await? {
        bail!("The nickname {} is already in use.", request.nickname);
    }

    if let Some(path) = &args.image {
        request.profile_image_url = Some(upload_image(app, path).await?);
    }

    let user = auth::signup(&app.client, &request).await?;
    println!("Welcome, {}! You are now logged in.", user.nickname);
    Ok(())
}

pub async fn logout(app: &App) -> Result<()> {
    if !app.session().is_authenticated() {
        println!("Not logged in.");
        return Ok(());
    }
    if let Err(err) = auth::logout(&app.client).await {
        tracing::warn!(error = %err, "logout request failed");
    }
    println!("Logged out.");
    Ok(())
}

pub async fn whoami(app: &App) -> Result<()> {
    if !app.session().is_authenticated() {
        println!("Not logged in.");
        return Ok(());
    }
    let user = users::fetch_me(&app.client).await?;
    app.session().set_user(user.clone());
    println!("{}", render::user(&user));
    Ok(())
}
