//! Settings read once at startup from a TOML file.

use crate::cursor::CursorMode;
use crate::error::{Error, Result};
use crate::gntp::DEFAULT_PORT;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

pub const DEFAULT_CONFIG_FILE: &str = "log-watcher.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Milliseconds between two scans.
    pub interval_ms: u64,
    pub cursor: CursorMode,
    /// Directories whose `*.log` files are watched (not recursive).
    pub target_dirs: Vec<String>,
    pub target_files: Vec<String>,
    pub patterns: PatternConfig,
    pub notifier: NotifierConfig,
}

/// Regular expressions classifying lines. Empty strings are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PatternConfig {
    pub error_ignore_case: String,
    pub error: String,
    pub normal_ignore_case: String,
    pub normal: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    Command,
    Gntp,
    #[default]
    Log,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NotifierConfig {
    pub transport: TransportKind,
    /// Program run by the command transport.
    pub program: String,
    pub host: String,
    pub port: u16,
    pub application_name: String,
    pub notification_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            cursor: CursorMode::default(),
            target_dirs: Vec::new(),
            target_files: Vec::new(),
            patterns: PatternConfig::default(),
            notifier: NotifierConfig::default(),
        }
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            transport: TransportKind::default(),
            program: "growlnotify".to_string(),
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            application_name: "LogWatcher".to_string(),
            notification_name: "notify".to_string(),
        }
    }
}

impl Config {
    /// Reads and validates the configuration file at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.interval_ms == 0 {
            return Err(Error::config("interval_ms must be greater than zero"));
        }
        if self.notifier.transport == TransportKind::Command && self.notifier.program.is_empty() {
            return Err(Error::config(
                "notifier.program is required for the command transport",
            ));
        }
        if self.notifier.transport == TransportKind::Gntp && self.notifier.port == 0 {
            return Err(Error::config("notifier.port must not be zero"));
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn dir_paths(&self) -> Vec<PathBuf> {
        self.target_dirs.iter().map(|p| unquote(p)).collect()
    }

    pub fn file_paths(&self) -> Vec<PathBuf> {
        self.target_files.iter().map(|p| unquote(p)).collect()
    }

    /// Logs the effective settings.
    pub fn log_settings(&self) {
        info!(interval_ms = self.interval_ms, cursor = ?self.cursor, "Watching interval");
        info!(
            error_ignore_case = %self.patterns.error_ignore_case,
            error = %self.patterns.error,
            normal_ignore_case = %self.patterns.normal_ignore_case,
            normal = %self.patterns.normal,
            "Patterns"
        );
        info!(transport = ?self.notifier.transport, "Notifier");
    }
}

/// Legacy settings wrapped paths in double quotes.
fn unquote(path: &str) -> PathBuf {
    PathBuf::from(path.replace('"', "").trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.interval(), Duration::from_secs(1));
        assert_eq!(config.cursor, CursorMode::Timestamp);
        assert_eq!(config.notifier.transport, TransportKind::Log);
        assert_eq!(config.notifier.port, 23053);
    }

    #[test]
    fn test_full_file() {
        let config = Config::from_toml_str(
            r#"
            interval_ms = 250
            cursor = "line_count"
            target_dirs = ["/var/log/app"]
            target_files = ['"C:\logs\server.log"']

            [patterns]
            error_ignore_case = "error|fatal"
            normal = "WARN"

            [notifier]
            transport = "gntp"
            host = "10.0.0.5"
            port = 23054
            "#,
        )
        .unwrap();

        assert_eq!(config.interval_ms, 250);
        assert_eq!(config.cursor, CursorMode::LineCount);
        assert_eq!(config.dir_paths(), vec![PathBuf::from("/var/log/app")]);
        assert_eq!(
            config.file_paths(),
            vec![PathBuf::from(r"C:\logs\server.log")]
        );
        assert_eq!(config.patterns.error_ignore_case, "error|fatal");
        assert_eq!(config.patterns.error, "");
        assert_eq!(config.patterns.normal, "WARN");
        assert_eq!(config.notifier.transport, TransportKind::Gntp);
        assert_eq!(config.notifier.host, "10.0.0.5");
        assert_eq!(config.notifier.port, 23054);
        assert_eq!(config.notifier.application_name, "LogWatcher");
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        match Config::from_toml_str("interval_ms = 0") {
            Err(Error::Config { message }) => assert!(message.contains("interval_ms")),
            other => panic!("Expected Error::Config, got {:?}", other),
        }
    }

    #[test]
    fn test_command_transport_needs_program() {
        let result = Config::from_toml_str(
            r#"
            [notifier]
            transport = "command"
            program = ""
            "#,
        );
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(matches!(
            Config::from_toml_str("interval = 5"),
            Err(Error::ConfigParse(_))
        ));
        assert!(matches!(
            Config::from_toml_str("cursor = \"bytes\""),
            Err(Error::ConfigParse(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            Config::load("definitely/not/here.toml"),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log-watcher.toml");
        std::fs::write(&path, "interval_ms = 50\n").unwrap();

        assert_eq!(Config::load(&path).unwrap().interval_ms, 50);
    }
}
