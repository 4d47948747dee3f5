//! One-time discovery of the files to watch.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

/// Resolves the configured directories and files into the ordered list of
/// log files to watch.
///
/// Directories contribute their immediate `*.log` entries (case-insensitive)
/// in name order; explicit files follow in configuration order. Paths that do
/// not exist are skipped, and a file reached twice is listed once.
pub async fn discover_targets(dirs: &[PathBuf], files: &[PathBuf]) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut targets = Vec::new();

    for dir in dirs {
        for path in log_files_in(dir).await {
            adopt(path, &mut seen, &mut targets);
        }
    }

    for file in files {
        match fs::metadata(file).await {
            Ok(metadata) if metadata.is_file() => adopt(file.clone(), &mut seen, &mut targets),
            Ok(_) => warn!(path = %file.display(), "Target is not a regular file, skipped"),
            Err(e) => warn!(path = %file.display(), error = %e, "Target file skipped"),
        }
    }

    targets
}

async fn log_files_in(dir: &Path) -> Vec<PathBuf> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            warn!(path = %dir.display(), error = %e, "Target directory skipped");
            return Vec::new();
        }
    };

    let mut found = Vec::new();
    loop {
        match entries.next_entry().await {
            Ok(Some(entry)) => {
                let path = entry.path();
                if !is_log_file_name(&path) {
                    continue;
                }
                if fs::metadata(&path).await.is_ok_and(|m| m.is_file()) {
                    found.push(path);
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "Failed while listing directory");
                break;
            }
        }
    }

    found.sort();
    found
}

/// `name.log` with a non-empty stem, any case.
fn is_log_file_name(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().to_ascii_lowercase())
        .is_some_and(|name| name.len() > ".log".len() && name.ends_with(".log"))
}

fn adopt(path: PathBuf, seen: &mut HashSet<PathBuf>, targets: &mut Vec<PathBuf>) {
    let path = std::path::absolute(&path).unwrap_or(path);
    if seen.insert(path.clone()) {
        info!(path = %path.display(), "Target file");
        targets.push(path);
    }
}
