//! CLI entry and dispatch.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use community_core::config::{self, Config};
use community_core::{ApiClient, SessionStore, logging};
use community_types::PostSort;

mod commands;
mod render;

#[derive(Parser)]
#[command(name = "community")]
#[command(version)]
#[command(about = "Command line client for the community board")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Backend base URL (overrides config and COMMUNITY_BASE_URL)
    #[arg(long, global = true, value_name = "URL")]
    base_url: Option<String>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Log in with email and password
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "COMMUNITY_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account and log in
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long)]
        nickname: String,
        #[arg(long, env = "COMMUNITY_PASSWORD", hide_env_values = true)]
        password: String,
        /// Password confirmation (defaults to --password)
        #[arg(long)]
        confirm: Option<String>,
        /// Profile image to upload
        #[arg(long, value_name = "PATH")]
        image: Option<String>,
    },

    /// Log out and forget the local session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Browse and manage posts
    Posts {
        #[command(subcommand)]
        command: PostCommands,
    },

    /// Browse and manage comments
    Comments {
        #[command(subcommand)]
        command: CommentCommands,
    },

    /// Manage your profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum PostCommands {
    /// List posts
    List {
        /// Sort order: new, views, likes or comments
        #[arg(long, default_value = "new")]
        sort: PostSort,
        /// Page to show (1-based)
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Page size (defaults to config page_size)
        #[arg(long)]
        size: Option<u32>,
        /// Search keyword
        #[arg(long)]
        keyword: Option<String>,
        /// Load every page
        #[arg(long, conflicts_with = "page")]
        all: bool,
    },
    /// Show a post and its first page of comments
    Show {
        #[arg(value_name = "POST_ID")]
        id: u64,
        /// Comment page to show
        #[arg(long, default_value_t = 1)]
        comments_page: u32,
    },
    /// Write a new post
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
        /// Tag (repeatable)
        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,
    },
    /// Edit a post; omitted fields keep their current value
    Edit {
        #[arg(value_name = "POST_ID")]
        id: u64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        /// Replace the tags (repeatable)
        #[arg(long = "tag", value_name = "TAG")]
        tags: Option<Vec<String>>,
    },
    /// Delete a post
    Delete {
        #[arg(value_name = "POST_ID")]
        id: u64,
    },
    /// Like a post
    Like {
        #[arg(value_name = "POST_ID")]
        id: u64,
    },
    /// Remove your like from a post
    Unlike {
        #[arg(value_name = "POST_ID")]
        id: u64,
    },
}

#[derive(clap::Subcommand)]
enum CommentCommands {
    /// List a post's comments
    List {
        #[arg(value_name = "POST_ID")]
        post_id: u64,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Comment on a post
    Add {
        #[arg(value_name = "POST_ID")]
        post_id: u64,
        #[arg(long)]
        content: String,
    },
    /// Edit a comment
    Edit {
        #[arg(value_name = "COMMENT_ID")]
        id: u64,
        #[arg(long)]
        content: String,
    },
    /// Delete a comment
    Delete {
        #[arg(value_name = "COMMENT_ID")]
        id: u64,
    },
}

#[derive(clap::Subcommand)]
enum ProfileCommands {
    /// Change nickname and/or profile image
    Edit {
        #[arg(long)]
        nickname: Option<String>,
        /// New profile image
        #[arg(long, value_name = "PATH")]
        image: Option<String>,
    },
    /// Change your password
    Password {
        #[arg(long, env = "COMMUNITY_NEW_PASSWORD", hide_env_values = true)]
        password: String,
        /// Password confirmation (defaults to --password)
        #[arg(long)]
        confirm: Option<String>,
    },
    /// Delete your account
    Delete {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
    /// Save the backend base URL to the config file
    SetBaseUrl {
        #[arg(value_name = "URL")]
        url: String,
    },
}

/// Loaded configuration plus an API client bound to the stored session.
pub struct App {
    pub config: Config,
    pub client: ApiClient,
}

impl App {
    fn new(config: Config, base_url: Option<&str>) -> Result<Self> {
        let session = if config.persist_session {
            SessionStore::persistent(config::paths::session_path())
        } else {
            SessionStore::in_memory()
        };
        if let Err(err) = session.hydrate() {
            tracing::warn!(error = %format!("{err:#}"), "ignoring unreadable session file");
        }

        let url = match base_url {
            Some(flag) => config::resolve_base_url(Some(flag), None)?,
            None => config.effective_base_url()?,
        };
        let client = ApiClient::builder(url, Arc::new(session))
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self { config, client })
    }

    pub fn session(&self) -> &SessionStore {
        self.client.session()
    }
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    let Cli { command, base_url } = cli;

    // Config commands must work even when the config file is broken.
    let command = match command {
        Commands::Config { command } => return config_command(command),
        command => command,
    };

    let config = Config::load().context("load config")?;
    let _log_guard = logging::init(&config.log).context("initialize logging")?;
    let app = App::new(config, base_url.as_deref())?;

    match command {
        Commands::Login { email, password } => commands::auth::login(&app, email, password).await,
        Commands::Signup {
            email,
            nickname,
            password,
            confirm,
            image,
        } => {
            commands::auth::signup(
                &app,
                commands::auth::SignupArgs {
                    email,
                    nickname,
                    confirm: confirm.unwrap_or_else(|| password.clone()),
                    password,
                    image,
                },
            )
            .await
        }
        Commands::Logout => commands::auth::logout(&app).await,
        Commands::Whoami => commands::auth::whoami(&app).await,

        Commands::Posts { command } => match command {
            PostCommands::List {
                sort,
                page,
                size,
                keyword,
                all,
            } => {
                let size = size.unwrap_or(app.config.page_size);
                if all {
                    commands::posts::list_all(&app, sort, size, keyword).await
                } else {
                    commands::posts::list(&app, sort, page, size, keyword).await
                }
            }
            PostCommands::Show { id, comments_page } => {
                commands::posts::show(&app, id, comments_page).await
            }
            PostCommands::Create {
                title,
                content,
                tags,
            } => commands::posts::create(&app, title, content, tags).await,
            PostCommands::Edit {
                id,
                title,
                content,
                tags,
            } => commands::posts::edit(&app, id, title, content, tags).await,
            PostCommands::Delete { id } => commands::posts::delete(&app, id).await,
            PostCommands::Like { id } => commands::posts::like(&app, id).await,
            PostCommands::Unlike { id } => commands::posts::unlike(&app, id).await,
        },

        Commands::Comments { command } => match command {
            CommentCommands::List { post_id, page } => {
                commands::comments::list(&app, post_id, page).await
            }
            CommentCommands::Add { post_id, content } => {
                commands::comments::add(&app, post_id, content).await
            }
            CommentCommands::Edit { id, content } => {
                commands::comments::edit(&app, id, content).await
            }
            CommentCommands::Delete { id } => commands::comments::delete(&app, id).await,
        },

        Commands::Profile { command } => match command {
            ProfileCommands::Edit { nickname, image } => {
                commands::profile::edit(&app, nickname, image).await
            }
            ProfileCommands::Password { password, confirm } => {
                let confirm = confirm.unwrap_or_else(|| password.clone());
                commands::profile::password(&app, password, confirm).await
            }
            ProfileCommands::Delete { yes } => commands::profile::delete(&app, yes).await,
        },

        Commands::Config { command } => config_command(command),
    }
}

fn config_command(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Path => {
            commands::config::path();
            Ok(())
        }
        ConfigCommands::Init => commands::config::init(),
        ConfigCommands::SetBaseUrl { url } => commands::config::set_base_url(&url),
    }
}
