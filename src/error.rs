//! Error types for the log watcher.

use thiserror::Error;

/// The main error type for log watcher operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O errors when reading files, spawning notifier programs or talking
    /// to a notification daemon.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid settings detected while building the watcher.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A configured pattern is not a valid regular expression.
    #[error("Invalid pattern for {name}: {source}")]
    Pattern {
        name: &'static str,
        #[source]
        source: regex::Error,
    },

    /// The configuration file could not be parsed.
    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The notifier rejected or failed to deliver a notification.
    #[error("Notification failed: {message}")]
    Notify { message: String },

    /// A notification daemon answered with something other than success.
    #[error("Unexpected notifier response: {message}")]
    Protocol { message: String },
}

impl Error {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
        }
    }
}

/// A convenient Result type for log watcher operations.
pub type Result<T> = std::result::Result<T, Error>;
