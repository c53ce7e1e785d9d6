//! Closed category and severity sets.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What kind of failure an [`ErrorRecord`](super::ErrorRecord) describes.
///
/// Every record carries exactly one category. The category decides the default
/// user-facing message and whether a retry can ever be offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Sign-in required or session expired.
    Auth,
    /// The REST backend answered with an error.
    Api,
    /// Input rejected by the backend or by a schema check.
    Validation,
    /// No response reached the client.
    Network,
    /// Storage-level failure. Treated as systemic.
    Database,
    /// Signed in but not allowed.
    Permission,
    /// The requested row or page does not exist.
    NotFound,
    /// Client-side form validation with per-field messages.
    Form,
    /// Upload or document handling failed.
    File,
    /// A payment or donation could not be completed.
    Payment,
    /// Anything that could not be classified.
    Unknown,
}

impl Category {
    /// Every category, in declaration order.
    pub const ALL: [Category; 11] = [
        Category::Auth,
        Category::Api,
        Category::Validation,
        Category::Network,
        Category::Database,
        Category::Permission,
        Category::NotFound,
        Category::Form,
        Category::File,
        Category::Payment,
        Category::Unknown,
    ];

    /// Stable lowercase identifier, matching the persisted column value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Api => "api",
            Self::Validation => "validation",
            Self::Network => "network",
            Self::Database => "database",
            Self::Permission => "permission",
            Self::NotFound => "notfound",
            Self::Form => "form",
            Self::File => "file",
            Self::Payment => "payment",
            Self::Unknown => "unknown",
        }
    }

    /// The single default message shown to users for this category.
    pub fn default_user_message(self) -> &'static str {
        match self {
            Self::Auth => "Your session has expired or you are not signed in. Please sign in again.",
            Self::Api => "The server could not complete your request. Please try again.",
            Self::Validation => {
                "Some of the information provided is invalid. Please review it and try again."
            }
            Self::Network => {
                "Network connection issue. Please check your internet connection and try again."
            }
            Self::Database => "We could not load or save your data. Please try again later.",
            Self::Permission => "You do not have permission to perform this action.",
            Self::NotFound => "The requested resource could not be found.",
            Self::Form => "Please correct the highlighted fields and try again.",
            Self::File => {
                "There was a problem with the selected file. Please check it and try again."
            }
            Self::Payment => {
                "Your payment could not be processed. Please verify your payment details or contact support."
            }
            Self::Unknown => "Something went wrong. Please try again.",
        }
    }

    /// Error class name used when the raise site does not supply one.
    pub fn error_name(self) -> &'static str {
        match self {
            Self::Auth => "AuthError",
            Self::Api => "ApiError",
            Self::Validation => "ValidationError",
            Self::Network => "NetworkError",
            Self::Database => "DatabaseError",
            Self::Permission => "PermissionError",
            Self::NotFound => "NotFoundError",
            Self::Form => "FormError",
            Self::File => "FileError",
            Self::Payment => "PaymentError",
            Self::Unknown => "AppError",
        }
    }

    /// Whether re-invoking the failed operation can ever be expected to help.
    ///
    /// Payment, permission, not-found and database failures are never retryable.
    pub fn permits_retry(self) -> bool {
        !matches!(
            self,
            Self::Payment | Self::Permission | Self::NotFound | Self::Database
        )
    }

    /// Whether this category may carry [`Severity::Critical`].
    pub fn permits_critical(self) -> bool {
        matches!(self, Self::Payment | Self::Database)
    }

    /// Severity used by the category-specific constructors.
    pub(crate) fn profile_severity(self) -> Severity {
        match self {
            Self::Validation | Self::NotFound | Self::Form => Severity::Low,
            Self::Api | Self::Network | Self::Permission | Self::File | Self::Unknown => {
                Severity::Medium
            }
            Self::Auth => Severity::High,
            Self::Database | Self::Payment => Severity::Critical,
        }
    }

    /// Retryability used by the category-specific constructors.
    pub(crate) fn profile_retryable(self) -> bool {
        matches!(self, Self::Network | Self::Auth)
    }

    /// Recoverability used by the category-specific constructors.
    pub(crate) fn profile_recoverable(self) -> bool {
        !matches!(self, Self::Database | Self::Payment)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Escalation level, ordered from `Low` to `Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational; the user can carry on.
    Low,
    /// Something failed but the page is still usable.
    Medium,
    /// The action failed and the user must notice.
    High,
    /// A core transaction is blocked or the system is failing.
    Critical,
}

impl Severity {
    /// Every severity, lowest first.
    pub const ALL: [Severity; 4] = [
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Color name for the development console mirror.
    pub fn console_color(self) -> &'static str {
        match self {
            Self::Low => "blue",
            Self::Medium => "yellow",
            Self::High => "orange",
            Self::Critical => "red",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown error category: {s}"))
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| format!("unknown error severity: {s}"))
    }
}
