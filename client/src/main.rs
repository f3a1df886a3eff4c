use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use taskboard_client::config::Config;
use taskboard_client::errors::{
    ApiFailure, ErrorHandler, ErrorRegistry, ErrorSnapshot, RegistryConfig,
};
use taskboard_client::http::ReqwestClient;
use taskboard_client::session::{Credentials, RouteAccess, SessionConfig, SessionManager};
use taskboard_client::store::FileStore;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "taskboard", version, about = "Taskboard session and error tooling")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the restored session
    Status,
    /// Exchange credentials for a token and persist it
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "TASKBOARD_PASSWORD")]
        password: String,
    },
    /// Forget the persisted token
    Logout,
    /// Print the authorization header for API calls
    Header,
    /// Decide whether a route may be shown with the current session
    Route { path: String },
    /// Show the notification a failed API call would produce
    Classify {
        #[arg(long)]
        status: Option<u16>,
        #[arg(long)]
        message: Option<String>,
        /// The request went out but no response came back
        #[arg(long)]
        no_response: bool,
    },
}

#[derive(Serialize)]
#[serde(tag = "access", rename_all = "snake_case")]
enum RouteReport {
    Pending,
    Redirect {
        to: &'static str,
        from: String,
    },
    Allow,
}

impl From<RouteAccess> for RouteReport {
    fn from(access: RouteAccess) -> Self {
        match access {
            RouteAccess::Pending => RouteReport::Pending,
            RouteAccess::Redirect { to, from } => RouteReport::Redirect { to, from },
            RouteAccess::Allow => RouteReport::Allow,
        }
    }
}

/// Run `failure` through a handler with no session attached, so a 401 only
/// describes the notification and never logs the user out.
async fn preview_failure(config: &Config, failure: &ApiFailure) -> ErrorSnapshot {
    let registry = Arc::new(ErrorRegistry::with_config(RegistryConfig::from(config)));
    ErrorHandler::new(registry.clone())
        .handle_api_error(failure, Some("cli"))
        .await;
    registry.snapshot().await
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskboard_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config::from_env();
    info!(
        "Loaded configuration: api_url={}, store={:?}",
        config.api_url, config.store_path
    );

    let store = FileStore::open(&config.store_path)
        .await
        .with_context(|| format!("failed to open store {:?}", config.store_path))?;
    let http = ReqwestClient::new(config.auth.request_timeout)?;

    let session = Arc::new(SessionManager::new(
        Arc::new(store),
        Arc::new(http),
        SessionConfig::from(&config),
    ));
    let snapshot = session.initialize().await;

    match cli.command {
        Command::Status => print_json(&snapshot)?,
        Command::Login { email, password } => {
            match session.login(&Credentials::new(email, password)).await {
                Ok(_) => print_json(&session.snapshot().await)?,
                Err(e) => {
                    warn!("Login failed: {}", e);
                    anyhow::bail!(e.user_message());
                }
            }
        }
        Command::Logout => {
            session.logout().await;
            print_json(&session.snapshot().await)?;
        }
        Command::Header => {
            let headers = session.auth_header().await;
            if headers.is_empty() {
                anyhow::bail!("not authenticated");
            }
            for (name, value) in headers.iter() {
                println!("{}: {}", name, value);
            }
        }
        Command::Route { path } => {
            print_json(&RouteReport::from(RouteAccess::evaluate(&snapshot, &path)))?;
        }
        Command::Classify {
            status,
            message,
            no_response,
        } => {
            let failure = ApiFailure {
                status,
                message,
                no_response,
                ..ApiFailure::default()
            };
            print_json(&preview_failure(&config, &failure).await)?;
        }
    }

    Ok(())
}
