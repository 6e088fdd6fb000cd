//! Subscription auth CLI
//!
//! Thin shell over the credential manager:
//! - `login`   runs the browser consent flow (no-op if already signed in)
//! - `token`   prints a valid access token, refreshing if needed
//! - `status`  reports whether a usable credential exists
//! - `logout`  deletes the stored credential

mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use subscription_auth::{CredentialManager, FlowHooks, credentials::now_millis};

use crate::config::Config;

#[derive(Debug, Parser)]
#[command(
    name = "subscription-auth",
    about = "Sign in with a subscription account and hand out access tokens"
)]
struct Cli {
    /// Config file (defaults to $CONFIG_PATH, then ./subscription-auth.toml).
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
enum Command {
    /// Run the browser sign-in flow (no-op if already signed in).
    Login,
    /// Print a valid access token, refreshing it if needed.
    Token,
    /// Report whether a usable credential exists.
    Status,
    /// Delete the stored credential.
    Logout,
}

/// Logs go to stderr so `token` output stays pipeable.
fn init_tracing() {
    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let args = Cli::parse();

    let config_path = Config::resolve_path(args.config.as_deref());
    let config = Config::load_or_default(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    let settings = config
        .into_settings()
        .context("failed to resolve settings")?;

    info!(
        store = %settings.store_path.display(),
        token_url = %settings.token_url,
        command = ?args.command,
        "configuration loaded"
    );

    let manager =
        CredentialManager::from_settings(&settings).context("failed to build credential manager")?;

    match args.command {
        Command::Login => {
            let hooks = FlowHooks::new().on_success(|| eprintln!("Login successful."));
            manager
                .authenticate(&hooks)
                .await
                .context("authentication failed")?;
            eprintln!("Credentials stored at {}", settings.store_path.display());
        }
        Command::Token => match manager.access_token().await {
            Some(token) => println!("{token}"),
            None => {
                eprintln!("not authenticated; run `subscription-auth login`");
                std::process::exit(1);
            }
        },
        Command::Status => {
            if !manager.is_authenticated().await {
                println!("not authenticated");
                std::process::exit(1);
            }
            match manager.store().load().await {
                Some(credential) => {
                    let remaining = credential.expires_at.saturating_sub(now_millis()) / 1000;
                    println!("authenticated (access token expires in {remaining}s)");
                }
                None => println!("authenticated"),
            }
        }
        Command::Logout => {
            manager
                .clear_credentials()
                .await
                .context("failed to clear credentials")?;
            eprintln!("Logged out.");
        }
    }

    Ok(())
}
