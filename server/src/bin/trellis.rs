//! Trellis HTTP server
//!
//! Serves the routes of a JSON configuration file, or explains how a single
//! request would be routed.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use trellis_server::config::TrellisConfig;
use trellis_server::error::{TrellisError, TrellisResult};
use trellis_server::App;

#[derive(Parser, Debug)]
#[command(name = "trellis")]
#[command(version)]
#[command(about = "Radix-tree HTTP router and server", long_about = None)]
struct Cli {
    /// Log level or filter directive (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the configured routes
    Serve {
        /// Path to JSON configuration file
        #[arg(short, long)]
        config: PathBuf,

        /// Override HTTP server port
        #[arg(short, long)]
        port: Option<u16>,

        /// Override HTTP server hostname
        #[arg(long)]
        hostname: Option<String>,
    },
    /// Print how a request would be routed
    Route {
        /// Path to JSON configuration file
        #[arg(short, long)]
        config: PathBuf,

        /// Request method, e.g. GET
        method: String,

        /// Request target, e.g. /users/42?full=1
        path: String,
    },
}

#[tokio::main]
async fn main() -> TrellisResult<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level)?;

    match cli.command {
        Command::Serve {
            config,
            port,
            hostname,
        } => serve(&config, port, hostname).await,
        Command::Route {
            config,
            method,
            path,
        } => {
            let config = load_config(&config)?;
            let app = App::from_config(&config)?;
            println!("{}", app.resolve(&method, &path));
            Ok(())
        }
    }
}

async fn serve(path: &Path, port: Option<u16>, hostname: Option<String>) -> TrellisResult<()> {
    info!("🚀 Starting Trellis v{}", env!("CARGO_PKG_VERSION"));

    let mut config = load_config(path)?;

    // Apply CLI argument overrides
    if let Some(port) = port {
        info!("⚙️  Overriding port: {}", port);
        config.port = port;
    }
    if let Some(hostname) = hostname {
        info!("⚙️  Overriding hostname: {}", hostname);
        config.hostname = hostname;
    }

    config.validate()?;

    info!(
        "📡 Server will listen on http://{}:{}",
        config.hostname, config.port
    );
    info!("📊 Routes: {}", config.route_count());

    let app = App::from_config(&config)?;
    app.listen_with_shutdown(shutdown_signal()).await?;

    info!("👋 Trellis shut down successfully");
    Ok(())
}

fn load_config(path: &Path) -> TrellisResult<TrellisConfig> {
    let config = TrellisConfig::from_file(path)?;
    info!("📋 Configuration loaded from {}", path.display());
    Ok(config)
}

/// Initialize structured logging with configurable level
fn init_logging(level: &str) -> TrellisResult<()> {
    let env_filter = level.parse::<EnvFilter>().map_err(|e| {
        TrellisError::Config(format!("Invalid log level '{}': {}", level, e))
    })?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_ansi(true)
        .init();

    Ok(())
}

/// Resolves on SIGTERM, SIGINT or Ctrl+C
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use signal::unix::{signal as unix_signal, SignalKind};

        match (
            unix_signal(SignalKind::terminate()),
            unix_signal(SignalKind::interrupt()),
        ) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => info!("Received SIGTERM signal"),
                    _ = sigint.recv() => info!("Received SIGINT signal"),
                }
                return;
            }
            (Err(e), _) | (_, Err(e)) => {
                warn!("Failed to install signal handlers, falling back to Ctrl+C: {}", e);
            }
        }
    }

    if let Err(e) = signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl+C");
}
