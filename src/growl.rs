//! Notifications through a growlnotify-style command line program.

use crate::error::Result;
use crate::notifier::Notifier;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Runs an external program once per notification.
///
/// Registration passes `/r:<notification> /a:<application> reg`; a
/// notification passes `/t:<title> /s:<sticky> /a:<application>
/// /n:<notification> <body>`. The program is spawned and not waited for.
#[derive(Debug, Clone)]
pub struct CommandNotifier {
    program: String,
    application_name: String,
    notification_name: String,
}

impl CommandNotifier {
    pub fn new(program: &str, application_name: &str, notification_name: &str) -> Self {
        Self {
            // Legacy settings quoted the program path.
            program: program.replace('"', ""),
            application_name: application_name.to_string(),
            notification_name: notification_name.to_string(),
        }
    }

    pub fn register_args(&self) -> Vec<String> {
        vec![
            format!("/r:{}", self.notification_name),
            format!("/a:{}", self.application_name),
            "reg".to_string(),
        ]
    }

    pub fn notify_args(&self, title: &str, body: &str, sticky: bool) -> Vec<String> {
        vec![
            format!("/t:{}", title),
            format!("/s:{}", sticky),
            format!("/a:{}", self.application_name),
            format!("/n:{}", self.notification_name),
            body.to_string(),
        ]
    }

    fn spawn(&self, args: Vec<String>) -> Result<()> {
        debug!(program = %self.program, ?args, "Spawning notifier");
        // Dropping the child detaches it; tokio reaps it in the background.
        Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        Ok(())
    }
}

impl Notifier for CommandNotifier {
    async fn register(&mut self) -> Result<()> {
        self.spawn(self.register_args())
    }

    async fn notify(&mut self, title: &str, body: &str, sticky: bool) -> Result<()> {
        self.spawn(self.notify_args(title, body, sticky))
    }
}
