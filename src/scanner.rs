//! The periodic scan loop: poll every watched file, classify the new lines
//! and forward them to the notifier.

use crate::classifier::{Classifier, Verdict};
use crate::config::Config;
use crate::discovery::discover_targets;
use crate::error::Result;
use crate::notifier::Notifier;
use crate::watched_file::WatchedFile;
use futures::future::join_all;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Notifications sent for one file's batch of new lines before the rest of
/// the batch is skipped.
pub const NOTIFY_LIMIT_PER_BATCH: usize = 25;

pub const NORMAL_TITLE: &str = "Log";
pub const ERROR_TITLE: &str = "Log Error!!";
pub const INFO_TITLE: &str = "LogWatcher Information";
pub const TOO_MANY_LINES_MESSAGE: &str =
    "[ATTENTION] Too many log lines! Skipped notifying a part of created log. Please read the log file directly.";

/// Where the scanner is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Scanning,
    Notifying,
    Quiescing,
}

/// What one scan cycle did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Files that produced at least one new line.
    pub files_updated: usize,
    pub lines_read: usize,
    /// Line notifications handed to the notifier, failed ones included.
    pub notifications: usize,
    pub failed_notifications: usize,
    /// Batches cut short by [`NOTIFY_LIMIT_PER_BATCH`].
    pub truncated_batches: usize,
}

/// Owns the watched files and drives the scan loop.
#[derive(Debug)]
pub struct Scanner<N> {
    files: Vec<WatchedFile>,
    classifier: Classifier,
    notifier: N,
    interval: Duration,
    state: ScanState,
}

impl<N: Notifier> Scanner<N> {
    pub fn new(
        files: Vec<WatchedFile>,
        classifier: Classifier,
        notifier: N,
        interval: Duration,
    ) -> Self {
        Self {
            files,
            classifier,
            notifier,
            interval,
            state: ScanState::Idle,
        }
    }

    /// Compiles the patterns, discovers the targets and opens them.
    ///
    /// Invalid patterns fail before any file is touched. A target that
    /// cannot be opened is skipped.
    pub async fn from_config(config: &Config, notifier: N) -> Result<Self> {
        let classifier = Classifier::new(&config.patterns)?;
        let targets = discover_targets(&config.dir_paths(), &config.file_paths()).await;

        let mut files = Vec::with_capacity(targets.len());
        for path in targets {
            match WatchedFile::open(&path, config.cursor).await {
                Ok(file) => files.push(file),
                Err(e) => warn!(path = %path.display(), error = %e, "Can't open target file"),
            }
        }

        Ok(Self::new(files, classifier, notifier, config.interval()))
    }

    pub fn files(&self) -> &[WatchedFile] {
        &self.files
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Registers with the notification service. A failure is logged and
    /// scanning can still go ahead.
    pub async fn register(&mut self) {
        if let Err(e) = self.notifier.register().await {
            warn!(error = %e, "Notifier registration failed");
        }
    }

    /// Runs scan cycles every interval until `shutdown` fires or its sender
    /// is dropped. The signal is only observed between cycles.
    pub async fn run(&mut self, mut shutdown: broadcast::Receiver<()>) {
        info!(files = self.files.len(), interval = ?self.interval, "Scanner started");

        loop {
            self.state = ScanState::Idle;
            tokio::select! {
                biased;
                _ = shutdown.recv() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }

            let report = self.scan_once().await;
            debug!(?report, "Scan cycle finished");
        }

        self.state = ScanState::Quiescing;
        info!("Scanner stopped");
    }

    /// Polls every file, then classifies and dispatches the new lines in
    /// registration order.
    pub async fn scan_once(&mut self) -> ScanReport {
        let Self {
            files,
            classifier,
            notifier,
            state,
            ..
        } = self;

        *state = ScanState::Scanning;
        // join_all keeps the input order, so dispatch stays in registration
        // order even though the reads overlap.
        let batches = join_all(files.iter_mut().map(|file| file.poll_new_lines())).await;

        *state = ScanState::Notifying;
        let mut report = ScanReport::default();
        for (file, lines) in files.iter().zip(batches) {
            if lines.is_empty() {
                continue;
            }

            info!(path = %file.path().display(), lines = lines.len(), "Updated");
            report.files_updated += 1;
            report.lines_read += lines.len();
            dispatch_batch(classifier, notifier, &lines, &mut report).await;
        }

        *state = ScanState::Idle;
        report
    }
}

/// Sends one notification per classified line of a single file's batch,
/// up to [`NOTIFY_LIMIT_PER_BATCH`].
async fn dispatch_batch<N: Notifier>(
    classifier: &Classifier,
    notifier: &mut N,
    lines: &[String],
    report: &mut ScanReport,
) {
    let mut notified = 0;

    for line in lines {
        if notified >= NOTIFY_LIMIT_PER_BATCH {
            if let Err(e) = notifier.notify(INFO_TITLE, TOO_MANY_LINES_MESSAGE, true).await {
                warn!(error = %e, "Failed to send notification");
            }
            report.truncated_batches += 1;
            break;
        }

        let (title, sticky) = match classifier.classify(line) {
            Verdict::Ignore => continue,
            Verdict::Normal => (NORMAL_TITLE, false),
            Verdict::Error => (ERROR_TITLE, true),
        };

        if let Err(e) = notifier.notify(title, line, sticky).await {
            warn!(error = %e, "Failed to send notification");
            report.failed_notifications += 1;
        }
        report.notifications += 1;
        notified += 1;
    }
}
