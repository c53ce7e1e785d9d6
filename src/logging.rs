//! Logging utilities for csr-errors
//!
//! Re-exports tracing macros with log_* naming convention for consistency,
//! plus the severity-keyed console mirror used in development builds.

// Re-export tracing macros with log_* naming
pub use tracing::{
    debug as log_debug,
    error as log_error,
    info as log_info,
    trace as log_trace,
    warn as log_warn,
};

/// Target for the development console mirror.
pub const CONSOLE_TARGET: &str = "csr_errors::console";

/// Emit a tracing event on the console target at the level that matches a
/// [`Severity`](crate::taxonomy::Severity). Remaining tokens are passed through as
/// tracing fields and message.
macro_rules! log_at_severity {
    ($severity:expr, $($rest:tt)+) => {
        match $severity {
            $crate::taxonomy::Severity::Low => {
                ::tracing::debug!(target: $crate::logging::CONSOLE_TARGET, $($rest)+)
            }
            $crate::taxonomy::Severity::Medium => {
                ::tracing::info!(target: $crate::logging::CONSOLE_TARGET, $($rest)+)
            }
            $crate::taxonomy::Severity::High => {
                ::tracing::warn!(target: $crate::logging::CONSOLE_TARGET, $($rest)+)
            }
            $crate::taxonomy::Severity::Critical => {
                ::tracing::error!(target: $crate::logging::CONSOLE_TARGET, $($rest)+)
            }
        }
    };
}

pub(crate) use log_at_severity;
