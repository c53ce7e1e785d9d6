use crate::taxonomy::{ErrorRecord, RaisedError, Severity};
use serde::Serialize;

/// Icon shown next to a banner message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BannerIcon {
    Info,
    AlertTriangle,
    AlertCircle,
    XOctagon,
}

/// Colour scheme of a banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BannerTone {
    Blue,
    Yellow,
    Orange,
    Red,
}

impl BannerIcon {
    pub fn for_severity(severity: Severity) -> Self {
        match severity {
            Severity::Low => Self::Info,
            Severity::Medium => Self::AlertTriangle,
            Severity::High => Self::AlertCircle,
            Severity::Critical => Self::XOctagon,
        }
    }
}

impl BannerTone {
    pub fn for_severity(severity: Severity) -> Self {
        match severity {
            Severity::Low => Self::Blue,
            Severity::Medium => Self::Yellow,
            Severity::High => Self::Orange,
            Severity::Critical => Self::Red,
        }
    }
}

/// Inline alert banner.
///
/// Look is chosen from severity only; the text is always the user message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertBanner {
    pub message: String,
    pub severity: Severity,
    pub icon: BannerIcon,
    pub tone: BannerTone,
    pub dismissible: bool,
    visible: bool,
}

impl AlertBanner {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
            icon: BannerIcon::for_severity(severity),
            tone: BannerTone::for_severity(severity),
            dismissible: true,
            visible: true,
        }
    }

    pub fn from_record(record: &ErrorRecord) -> Self {
        Self::new(record.user_message(), record.severity())
    }

    /// Unclassified errors render the generic message at medium severity.
    pub fn from_raised(error: &RaisedError) -> Self {
        Self::new(error.user_message(), error.severity())
    }

    pub fn non_dismissible(mut self) -> Self {
        self.dismissible = false;
        self
    }

    pub fn dismiss(&mut self) {
        if self.dismissible {
            self.visible = false;
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Plain-text rendering, e.g. `[alert-triangle] Something went wrong`.
    pub fn render_text(&self) -> Option<String> {
        if !self.visible {
            return None;
        }
        let icon = match self.icon {
            BannerIcon::Info => "info",
            BannerIcon::AlertTriangle => "alert-triangle",
            BannerIcon::AlertCircle => "alert-circle",
            BannerIcon::XOctagon => "x-octagon",
        };
        Some(format!("[{icon}] {}", self.message))
    }
}
