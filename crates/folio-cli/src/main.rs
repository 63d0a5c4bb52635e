//! folio - portfolio content from the command line.
//!
//! Reads every section of the portfolio through a local cache that serves
//! fresh entries immediately and revalidates them in the background, and
//! lets the signed-in owner edit content, which invalidates the affected
//! cache entry.

mod app;
mod cli;
mod commands;
mod output;

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use folio_core::Config;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::App;
use cli::{Cli, Commands};
use commands::Output;

/// Log file name prefix; files rotate daily.
const LOG_FILE_PREFIX: &str = "folio.log";

/// Initialize the tracing subscriber for logging.
///
/// Console output goes to stderr and is filtered by RUST_LOG (default warn).
/// When a log directory is available the same events are also written to a
/// daily log file there. The returned guard flushes that file on drop.
fn init_tracing(log_dir: Option<PathBuf>) -> Option<WorkerGuard> {
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(filter());
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_filter(filter()))
        .with(file_layer)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let log_dir = Config::default().cache_dir().ok().map(|dir| dir.join("logs"));
    let _guard = init_tracing(log_dir);
    info!("folio starting");

    let mut app = App::new(cli.no_persist)?;
    let out = Output {
        lang: app.language(cli.lang),
        json: cli.json,
    };

    match cli.command {
        Commands::Show { resource } => commands::show(&app, resource, out).await?,
        Commands::Refresh { resource } => commands::refresh(&app, resource, out).await?,
        Commands::Status => commands::status(&app),
        Commands::Cache(command) => commands::cache(&app, command),
        Commands::Login { email, remember } => {
            app.login(email, remember).await?;
            println!("Signed in");
        }
        Commands::Logout { forget } => {
            app.logout(forget).await?;
            println!("Signed out");
        }
        Commands::Contact {
            name,
            email,
            message,
        } => commands::contact(&app, &name, &email, &message).await?,
        Commands::Admin(command) => commands::admin(&mut app, command).await?,
    }

    Ok(())
}
