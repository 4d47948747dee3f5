//! The notification capability the scanner depends on, and the transport
//! selected from configuration.

use crate::config::{NotifierConfig, TransportKind};
use crate::error::Result;
use crate::gntp::GntpNotifier;
use crate::growl::CommandNotifier;
use std::future::Future;
use tracing::{info, warn};

/// Something that can deliver desktop notifications.
///
/// Delivery is fire-and-forget: an `Ok` only means the notification was
/// handed over.
pub trait Notifier {
    /// Announces the application to the notification service. Called once
    /// before the first notification.
    fn register(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Sends one notification. Sticky notifications stay on screen until
    /// dismissed.
    fn notify(
        &mut self,
        title: &str,
        body: &str,
        sticky: bool,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Writes notifications to the log instead of a desktop service.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn register(&mut self) -> Result<()> {
        info!("Notifications will be written to the log");
        Ok(())
    }

    async fn notify(&mut self, title: &str, body: &str, sticky: bool) -> Result<()> {
        if sticky {
            warn!(title, "{}", body);
        } else {
            info!(title, "{}", body);
        }
        Ok(())
    }
}

/// The notifier transport chosen in the configuration.
#[derive(Debug)]
pub enum Transport {
    Command(CommandNotifier),
    Gntp(GntpNotifier),
    Log(LogNotifier),
}

impl Transport {
    pub fn from_config(config: &NotifierConfig) -> Self {
        match config.transport {
            TransportKind::Command => Transport::Command(CommandNotifier::new(
                &config.program,
                &config.application_name,
                &config.notification_name,
            )),
            TransportKind::Gntp => Transport::Gntp(GntpNotifier::new(
                &config.host,
                config.port,
                &config.application_name,
                &config.notification_name,
            )),
            TransportKind::Log => Transport::Log(LogNotifier),
        }
    }
}

impl Notifier for Transport {
    async fn register(&mut self) -> Result<()> {
        match self {
            Transport::Command(notifier) => notifier.register().await,
            Transport::Gntp(notifier) => notifier.register().await,
            Transport::Log(notifier) => notifier.register().await,
        }
    }

    async fn notify(&mut self, title: &str, body: &str, sticky: bool) -> Result<()> {
        match self {
            Transport::Command(notifier) => notifier.notify(title, body, sticky).await,
            Transport::Gntp(notifier) => notifier.notify(title, body, sticky).await,
            Transport::Log(notifier) => notifier.notify(title, body, sticky).await,
        }
    }
}
