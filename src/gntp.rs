//! Notifications over the Growl Notification Transport Protocol (GNTP/1.0).

use crate::error::{Error, Result};
use crate::notifier::Notifier;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::debug;

/// Default port of a GNTP listener.
pub const DEFAULT_PORT: u16 = 23053;

/// How long one request may take, connecting included.
pub const RESPONSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Sends plaintext (unencrypted, unauthenticated) GNTP requests, one TCP
/// connection per request.
#[derive(Debug, Clone)]
pub struct GntpNotifier {
    host: String,
    port: u16,
    application_name: String,
    notification_name: String,
    timeout: Duration,
}

impl GntpNotifier {
    pub fn new(host: &str, port: u16, application_name: &str, notification_name: &str) -> Self {
        Self {
            host: host.to_string(),
            port,
            application_name: application_name.to_string(),
            notification_name: notification_name.to_string(),
            timeout: RESPONSE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// REGISTER request announcing a single notification type.
    pub fn register_message(&self) -> String {
        let mut message = String::from("GNTP/1.0 REGISTER NONE\r\n");
        push_header(&mut message, "Application-Name", &self.application_name);
        push_header(&mut message, "Notifications-Count", "1");
        message.push_str("\r\n");
        push_header(&mut message, "Notification-Name", &self.notification_name);
        push_header(&mut message, "Notification-Display-Name", &self.notification_name);
        push_header(&mut message, "Notification-Enabled", "True");
        message.push_str("\r\n");
        message
    }

    pub fn notify_message(&self, title: &str, body: &str, sticky: bool) -> String {
        let mut message = String::from("GNTP/1.0 NOTIFY NONE\r\n");
        push_header(&mut message, "Application-Name", &self.application_name);
        push_header(&mut message, "Notification-Name", &self.notification_name);
        push_header(&mut message, "Notification-Title", title);
        push_header(&mut message, "Notification-Text", body);
        push_header(
            &mut message,
            "Notification-Sticky",
            if sticky { "True" } else { "False" },
        );
        message.push_str("\r\n");
        message
    }

    async fn send(&self, message: &str) -> Result<()> {
        tokio::time::timeout(self.timeout, self.exchange(message))
            .await
            .map_err(|_| Error::Notify {
                message: format!(
                    "no response from {}:{} within {:?}",
                    self.host, self.port, self.timeout
                ),
            })?
    }

    async fn exchange(&self, message: &str) -> Result<()> {
        let mut stream = TcpStream::connect((self.host.as_str(), self.port)).await?;
        stream.write_all(message.as_bytes()).await?;
        stream.flush().await?;

        let mut reader = BufReader::new(stream);
        let mut status = String::new();
        reader.read_line(&mut status).await?;

        let status = status.trim_end();
        debug!(host = %self.host, port = self.port, status, "GNTP response");
        if status.starts_with("GNTP/1.0 -OK") {
            Ok(())
        } else {
            Err(Error::Protocol {
                message: status.to_string(),
            })
        }
    }
}

/// Header values cannot span lines.
fn push_header(message: &mut String, name: &str, value: &str) {
    message.push_str(name);
    message.push_str(": ");
    message.extend(value.chars().map(|c| if c == '\r' || c == '\n' { ' ' } else { c }));
    message.push_str("\r\n");
}

impl Notifier for GntpNotifier {
    async fn register(&mut self) -> Result<()> {
        self.send(&self.register_message()).await
    }

    async fn notify(&mut self, title: &str, body: &str, sticky: bool) -> Result<()> {
        self.send(&self.notify_message(title, body, sticky)).await
    }
}
