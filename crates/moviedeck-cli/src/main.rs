//! moviedeck - browse a movie catalog from the terminal.
//!
//! Logs in against a local user list, then lists, searches and shows
//! movies from the catalog API. Every catalog call goes through the core's
//! request pipeline (busy tracking, bearer token, refresh-and-retry).

mod app;
mod console;
mod credentials;
mod render;

use std::io;
use std::path::Path;

use anyhow::Result;
use clap::{Parser, Subcommand};
use moviedeck_core::{ApiError, AuthError, Config};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::App;

#[derive(Parser)]
#[command(name = "moviedeck", version, about = "Browse the movie catalog from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in with an account from the user list
    Login {
        #[arg(short, long)]
        username: Option<String>,
    },
    /// End the current session
    Logout {
        /// Also forget the password remembered in the keychain
        #[arg(long)]
        forget: bool,
    },
    /// Show who is logged in
    Whoami,
    /// List popular movies
    Popular {
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },
    /// List top rated movies
    TopRated {
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },
    /// Search movies by title
    Search {
        query: String,
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },
    /// Show one movie
    Movie { id: String },
}

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr, filtered by `RUST_LOG` (default `warn`), and to a daily
/// log file in `log_dir` when it can be created.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let appender = log_dir.and_then(|dir| {
        RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix("moviedeck")
            .filename_suffix("log")
            .build(dir)
            .ok()
    });
    let (file_layer, guard) = match appender {
        Some(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

/// Errors the user has already been shown through a notification.
fn already_reported(err: &anyhow::Error) -> bool {
    if let Some(api) = err.downcast_ref::<ApiError>() {
        // A refresh failure was announced as an expired session
        return api.user_message().is_some() || matches!(api, ApiError::RefreshFailure(_));
    }
    matches!(err.downcast_ref::<AuthError>(), Some(AuthError::InvalidCredentials))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let mut config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config, using defaults: {}", e);
            Config::default()
        }
    };
    config.apply_env();

    let log_dir = config.data_dir().ok().map(|d| d.join("logs"));
    let log_guard = init_tracing(log_dir.as_deref());
    info!("moviedeck starting");

    let mut app = App::new(config)?;
    let indicator = console::spawn_busy_indicator(&app.tracker);

    let result = match cli.command {
        Command::Login { username } => app.login(username).await,
        Command::Logout { forget } => {
            app.logout(forget);
            Ok(())
        }
        Command::Whoami => {
            app.whoami();
            Ok(())
        }
        Command::Popular { page } => app.popular(page).await,
        Command::TopRated { page } => app.top_rated(page).await,
        Command::Search { query, page } => app.search(&query, page).await,
        Command::Movie { id } => app.movie(&id).await,
    };

    indicator.abort();

    if let Err(e) = result {
        info!(error = %e, "Command failed");
        if !already_reported(&e) {
            eprintln!("Error: {:#}", e);
        }
        // Flush the file log before exiting
        drop(log_guard);
        std::process::exit(1);
    }

    info!("moviedeck shutting down");
    drop(log_guard);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_reported() {
        assert!(already_reported(&ApiError::from_status(500, "").into()));
        assert!(already_reported(&ApiError::from_status(401, "revoked").into()));
        assert!(already_reported(
            &ApiError::RefreshFailure(AuthError::Backend("revoked".to_string())).into()
        ));
        assert!(already_reported(&AuthError::InvalidCredentials.into()));
        // 502 has no notification, so it still needs printing
        assert!(!already_reported(&ApiError::from_status(502, "").into()));
        assert!(!already_reported(&anyhow::anyhow!("Not logged in")));
    }

    #[test]
    fn test_cli_parses_commands() {
        let cli = Cli::try_parse_from(["moviedeck", "search", "heat", "--page", "2"]).unwrap();
        assert!(matches!(cli.command, Command::Search { ref query, page: 2 } if query == "heat"));

        let cli = Cli::try_parse_from(["moviedeck", "top-rated"]).unwrap();
        assert!(matches!(cli.command, Command::TopRated { page: 1 }));

        let cli = Cli::try_parse_from(["moviedeck", "logout", "--forget"]).unwrap();
        assert!(matches!(cli.command, Command::Logout { forget: true }));
    }
}
