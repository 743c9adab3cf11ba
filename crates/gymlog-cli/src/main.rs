//! gymlog - a terminal front end for the gym API.
//!
//! Sign in, browse exercises by muscle group, mark workouts as done and
//! review the history. The session survives between runs.

mod commands;
mod prompt;

use std::io;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use gymlog_core::{ApiClient, Config, SessionManager};

#[derive(Parser)]
#[command(name = "gymlog", version, about = "Track your gym workouts from the terminal")]
struct Cli {
    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in with email and password
    SignIn {
        #[arg(long)]
        email: Option<String>,
    },
    /// Create an account and sign in
    SignUp {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
    /// Sign out and forget the stored session
    SignOut,
    /// Show the signed-in user
    Whoami,
    /// Update your name and, optionally, your password
    Profile {
        #[arg(long)]
        name: Option<String>,
        /// Prompt for the current and a new password
        #[arg(long)]
        change_password: bool,
    },
    /// List muscle groups
    Groups,
    /// List exercises, for one group or all of them
    Exercises {
        #[arg(long)]
        group: Option<String>,
    },
    /// Show one exercise
    Exercise { id: i64 },
    /// Mark an exercise as done
    Done { id: i64 },
    /// Show your workout history
    History,
}

/// Initialize the tracing subscriber for logging.
/// The returned guard must live until exit so buffered file logs are flushed.
fn init_tracing(log_file: Option<&PathBuf>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    match log_file {
        Some(path) => {
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
            let file_name = path
                .file_name()
                .map(|n| n.to_os_string())
                .unwrap_or_else(|| "gymlog.log".into());
            let appender =
                tracing_appender::rolling::never(dir.unwrap_or_else(|| Path::new(".")), file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);

            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .with(filter)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(filter)
                .init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _log_guard = init_tracing(cli.log_file.as_ref());

    let mut config = Config::load()?;
    let base_url = config.api_base_url();
    debug!(base_url = %base_url, storage = ?config.storage, "Config loaded");

    let store = config.open_store()?;
    let session = SessionManager::new(ApiClient::new(&base_url)?, store);

    // A broken stored session is not fatal; the user can sign in again
    if let Err(e) = session.restore_session().await {
        eprintln!("Stored session could not be read ({}); please sign in again.", e);
    }
    let status = session.status().await;
    info!(?status, "Session restored");

    match cli.command {
        Command::SignIn { email } => commands::sign_in(&session, &mut config, email).await,
        Command::SignUp { name, email } => {
            commands::sign_up(&session, &mut config, name, email).await
        }
        Command::SignOut => commands::sign_out(&session).await,
        Command::Whoami => commands::whoami(&session).await,
        Command::Profile {
            name,
            change_password,
        } => commands::profile(&session, name, change_password).await,
        Command::Groups => commands::groups(&session).await,
        Command::Exercises { group } => commands::exercises(&session, group).await,
        Command::Exercise { id } => commands::exercise(&session, id).await,
        Command::Done { id } => commands::done(&session, id).await,
        Command::History => commands::history(&session).await,
    }
}
