//! User-facing notification and navigation channels.
//!
//! The handler calls exactly one [`Notifier`] method per handled error and
//! uses the [`Navigator`] only for the session-expiry redirect. UI shells plug
//! in their own implementations; [`ChannelSink`] forwards both as
//! [`UiEvent`]s over a tokio channel, and [`TracingNotifier`] just logs.

use crate::logging::{log_info, log_warn};
use std::time::Duration;
use tokio::sync::mpsc;

/// Toast channel.
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    /// Passive, informational toast.
    fn info(&self, message: &str);

    /// Passive warning toast.
    fn warning(&self, message: &str);

    /// Blocking alert that stays up for `duration`.
    fn error(&self, message: &str, duration: Duration);
}

/// Global "go to URL" capability.
#[cfg_attr(test, mockall::automock)]
pub trait Navigator: Send + Sync {
    fn navigate(&self, url: &str);
}

/// A toast as seen by the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Info { message: String },
    Warning { message: String },
    Error { message: String, duration: Duration },
}

impl Notification {
    pub fn message(&self) -> &str {
        match self {
            Self::Info { message } | Self::Warning { message } | Self::Error { message, .. } => {
                message
            }
        }
    }
}

/// Everything the pipeline asks the UI to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Toast(Notification),
    Navigate(String),
}

/// Forwards notifications and navigation requests to a UI event loop.
///
/// Sends never block; if the receiver is gone the event is dropped.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<UiEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<UiEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, event: UiEvent) {
        if self.tx.send(event).is_err() {
            log_warn!("UI event receiver dropped, notification discarded");
        }
    }
}

impl Notifier for ChannelSink {
    fn info(&self, message: &str) {
        self.send(UiEvent::Toast(Notification::Info {
            message: message.to_string(),
        }));
    }

    fn warning(&self, message: &str) {
        self.send(UiEvent::Toast(Notification::Warning {
            message: message.to_string(),
        }));
    }

    fn error(&self, message: &str, duration: Duration) {
        self.send(UiEvent::Toast(Notification::Error {
            message: message.to_string(),
            duration,
        }));
    }
}

impl Navigator for ChannelSink {
    fn navigate(&self, url: &str) {
        self.send(UiEvent::Navigate(url.to_string()));
    }
}

/// Headless fallback for services and tests without a UI.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn info(&self, message: &str) {
        log_info!(channel = "info", message = %message, "User notification");
    }

    fn warning(&self, message: &str) {
        log_info!(channel = "warning", message = %message, "User notification");
    }

    fn error(&self, message: &str, duration: Duration) {
        log_warn!(
            channel = "error",
            duration_ms = duration.as_millis(),
            message = %message,
            "User notification"
        );
    }
}

impl Navigator for TracingNotifier {
    fn navigate(&self, url: &str) {
        log_info!(url = %url, "Navigation requested");
    }
}
