//! CLI entry and dispatch.

use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use postpad_core::config;
use tracing_subscriber::EnvFilter;

mod commands;

/// Environment variable holding the log filter (e.g. `debug`).
const LOG_ENV: &str = "POSTPAD_LOG";

#[derive(Parser)]
#[command(name = "postpad")]
#[command(version = "0.1")]
#[command(about = "Notes client for the postpad service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Log in with email and password
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "POSTPAD_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and log in
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "POSTPAD_PASSWORD", hide_env_values = true)]
        password: String,
        /// Repeat the password (defaults to --password)
        #[arg(long)]
        confirm_password: Option<String>,
    },
    /// End the current session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Manage posts
    Posts {
        #[command(subcommand)]
        command: PostCommands,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum PostCommands {
    /// Lists your posts, newest first
    List,
    /// Creates a post
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
    },
    /// Edits a post; omitted fields keep their current value
    Edit {
        #[arg(value_name = "POST_ID")]
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
    },
    /// Deletes a post
    Delete {
        #[arg(value_name = "POST_ID")]
        id: String,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_tracing();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
    rt.block_on(async move { dispatch(cli).await })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    // A subscriber may already be set when embedded; keep the existing one.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

/// Loads config and wires the session store and remote client.
fn open_app() -> Result<commands::App> {
    let config = config::Config::load().context("load config")?;
    commands::App::open(&config)
}

async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Login { email, password } => {
            commands::auth::login(&open_app()?, &email, &password).await
        }
        Commands::Register {
            name,
            email,
            password,
            confirm_password,
        } => {
            let confirm = confirm_password.as_deref().unwrap_or(&password);
            commands::auth::register(&open_app()?, &name, &email, &password, confirm).await
        }
        Commands::Logout => commands::auth::logout(&open_app()?).await,
        Commands::Whoami => commands::auth::whoami(&open_app()?),

        Commands::Posts { command } => {
            let app = open_app()?;
            match command {
                PostCommands::List => commands::posts::list(&app).await,
                PostCommands::Create { title, content } => {
                    commands::posts::create(&app, &title, &content).await
                }
                PostCommands::Edit { id, title, content } => {
                    commands::posts::edit(&app, &id, title.as_deref(), content.as_deref()).await
                }
                PostCommands::Delete { id } => commands::posts::delete(&app, &id).await,
            }
        }

        // config commands work even with a broken config file
        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
        },
    }
}
