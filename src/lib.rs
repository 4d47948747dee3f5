//! A log watcher that tails growing log files and raises desktop
//! notifications for lines matching configured patterns.
//!
//! Each watched file gets its encoding detected once from its raw bytes,
//! then is polled on a fixed interval. Only lines appended since the
//! previous poll are classified and forwarded to a [`Notifier`].
//!
//! # Example
//!
//! ```rust,no_run
//! use log_watcher::{watch_logs, Config};
//! use tokio::sync::broadcast;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("log-watcher.toml")?;
//!     let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
//!
//!     tokio::spawn(async move {
//!         let _ = tokio::signal::ctrl_c().await;
//!         let _ = shutdown_tx.send(());
//!     });
//!
//!     watch_logs(&config, shutdown_rx).await?;
//!     Ok(())
//! }
//! ```

pub mod classifier;
pub mod config;
pub mod cursor;
pub mod discovery;
pub mod encoding;
mod error;
pub mod gntp;
pub mod growl;
pub mod notifier;
pub mod scanner;
pub mod watched_file;

#[cfg(test)]
mod test_helpers;

// Public API exports
pub use classifier::{Classifier, Verdict};
pub use config::Config;
pub use cursor::{CursorMode, TailCursor};
pub use encoding::TextEncoding;
pub use error::{Error, Result};
pub use notifier::{Notifier, Transport};
pub use scanner::{ScanReport, Scanner};
pub use watched_file::WatchedFile;

use tokio::sync::broadcast;
use tracing::warn;

/// Compiles the patterns, discovers the targets and builds the configured
/// transport. Every startup failure surfaces here.
pub async fn prepare_scanner(config: &Config) -> Result<Scanner<Transport>> {
    let notifier = Transport::from_config(&config.notifier);
    let scanner = Scanner::from_config(config, notifier).await?;

    if scanner.files().is_empty() {
        warn!("No target files found");
    }

    Ok(scanner)
}

/// Watches the files named by `config` until `shutdown` fires.
///
/// Fails only on startup problems such as an invalid pattern. Once the scan
/// loop runs, read and notification failures are logged and skipped.
pub async fn watch_logs(config: &Config, shutdown: broadcast::Receiver<()>) -> Result<()> {
    let mut scanner = prepare_scanner(config).await?;

    scanner.register().await;
    scanner.run(shutdown).await;
    Ok(())
}
