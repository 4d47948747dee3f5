use anyhow::{Context, Result};
use clap::Parser;
use log_watcher::config::DEFAULT_CONFIG_FILE;
use log_watcher::{prepare_scanner, Config, CursorMode};
use std::path::PathBuf;
use tokio::io::{stdin, AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tokio_stream::wrappers::LinesStream;
use tokio_stream::StreamExt;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "log-watcher", version, about = "Tail log files and notify on matching lines")]
struct Args {
    /// Configuration file (defaults to ./log-watcher.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the polling interval in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Track files by line count instead of embedded timestamps
    #[arg(long)]
    line_count: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    config.log_settings();

    // Startup errors must surface before the stdin reader exists, or the
    // runtime would wait on it while shutting down.
    let mut scanner = prepare_scanner(&config)
        .await
        .context("Failed to start watching")?;

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    tokio::spawn(listen_for_quit(shutdown_tx));

    info!("Enter 'q' to stop watching");
    scanner.register().await;
    scanner.run(shutdown_rx).await;

    info!("Bye");
    // The stdin reader lives on a blocking thread that would hold the
    // runtime open until the next input line.
    std::process::exit(0)
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None if std::path::Path::new(DEFAULT_CONFIG_FILE).exists() => {
            Config::load(DEFAULT_CONFIG_FILE)
                .with_context(|| format!("Failed to load config from {}", DEFAULT_CONFIG_FILE))?
        }
        None => {
            warn!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
            Config::default()
        }
    };

    if let Some(interval_ms) = args.interval_ms {
        config.interval_ms = interval_ms;
    }
    if args.line_count {
        config.cursor = CursorMode::LineCount;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Broadcasts the stop signal on a `q` line or Ctrl-C.
async fn listen_for_quit(shutdown: broadcast::Sender<()>) {
    let mut lines = LinesStream::new(BufReader::new(stdin()).lines());

    loop {
        tokio::select! {
            line = lines.next() => match line {
                Some(Ok(line)) if line.trim().eq_ignore_ascii_case("q") => break,
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    warn!(error = %e, "Failed to read console input");
                    let _ = tokio::signal::ctrl_c().await;
                    break;
                }
                // Closed stdin, e.g. when running as a service.
                None => {
                    let _ = tokio::signal::ctrl_c().await;
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    info!("Stopping");
    let _ = shutdown.send(());
}
