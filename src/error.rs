//! Error types for the pipeline's own infrastructure.
//!
//! Failures of the error pipeline itself (bad configuration, an unreachable or
//! rejecting log store) are reported as [`PipelineError`]. They never escape
//! [`ErrorLogger::log`](crate::logger::ErrorLogger::log); they surface only from
//! explicit operations such as `flush()`, `get_error_stats()` or configuration
//! loading.
//!
//! # Result Type
//!
//! Use [`PipelineResult<T>`] as a convenient alias for `Result<T, PipelineError>`:
//!
//! ```rust
//! use csr_errors::PipelineResult;
//!
//! fn my_function() -> PipelineResult<usize> {
//!     Ok(0)
//! }
//! ```

use crate::logging::{log_error, log_warn};
use crate::taxonomy::{Category, ErrorContext, ErrorRecord, RaisedError, Severity};
use thiserror::Error;

/// Convenient result type for pipeline infrastructure operations.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

/// Errors raised by the pipeline's own infrastructure.
///
/// | Variant | Retryable | Taxonomy category |
/// |---------|-----------|-------------------|
/// | `Configuration` | No | unknown / high |
/// | `StoreUnavailable` | Yes | database |
/// | `StoreRejected` | 5xx only | database |
/// | `StoreResponseInvalid` | No | database |
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Configuration is invalid or incomplete.
    #[error("Pipeline configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },

    /// The log store could not be reached.
    #[error("Error log store unavailable: {message}")]
    StoreUnavailable {
        /// Description of the failure.
        message: String,
        /// The underlying error, if available.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The log store answered with a non-success status.
    #[error("Error log store rejected request with status {status}: {body}")]
    StoreRejected {
        /// HTTP status returned by the store.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// The log store answered but the body could not be understood.
    #[error("Error log store returned an invalid response: {message}")]
    StoreResponseInvalid {
        /// Details about the parsing failure.
        message: String,
    },
}

impl PipelineError {
    /// Whether repeating the same store call may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::StoreUnavailable { .. } => true,
            Self::StoreRejected { status, .. } => *status >= 500 || *status == 429,
            Self::Configuration { .. } | Self::StoreResponseInvalid { .. } => false,
        }
    }

    /// Message safe to show an operator in the dashboard.
    pub fn user_message(&self) -> String {
        match self {
            Self::Configuration { .. } => {
                "Error reporting is misconfigured. Please contact an administrator".to_string()
            }
            Self::StoreUnavailable { .. } | Self::StoreRejected { .. } => {
                "Error reports could not be saved right now".to_string()
            }
            Self::StoreResponseInvalid { .. } => {
                "Error reports could not be read right now".to_string()
            }
        }
    }

    // =========================================================================
    // Constructor methods with automatic logging
    // =========================================================================

    /// Create a configuration error (logs at ERROR level).
    pub fn configuration(message: impl Into<String>) -> Self {
        let message = message.into();
        log_error!(
            error_type = "configuration_error",
            message = %message,
            "Error pipeline configuration validation failed"
        );
        Self::Configuration { message }
    }

    pub fn store_unavailable(
        message: impl Into<String>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        let message = message.into();
        log_warn!(
            error_type = "store_unavailable",
            message = %message,
            has_source = source.is_some(),
            "Error log store request failed"
        );
        Self::StoreUnavailable { message, source }
    }

    pub fn store_rejected(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        log_warn!(
            error_type = "store_rejected",
            status = status,
            body = %body,
            "Error log store rejected request"
        );
        Self::StoreRejected { status, body }
    }

    pub fn store_response_invalid(message: impl Into<String>) -> Self {
        let message = message.into();
        log_warn!(
            error_type = "store_response_invalid",
            message = %message,
            "Error log store response could not be parsed"
        );
        Self::StoreResponseInvalid { message }
    }
}

impl From<&PipelineError> for ErrorRecord {
    fn from(error: &PipelineError) -> Self {
        let builder = match error {
            PipelineError::Configuration { .. } => {
                ErrorRecord::builder(Category::Unknown, error.to_string())
                    .severity(Severity::High)
                    .code("PIPELINE_CONFIGURATION")
            }
            PipelineError::StoreUnavailable { .. } => {
                ErrorRecord::builder(Category::Database, error.to_string())
                    .code("STORE_UNAVAILABLE")
            }
            PipelineError::StoreRejected { status, .. } => {
                ErrorRecord::builder(Category::Database, error.to_string())
                    .code("STORE_REJECTED")
                    .context(ErrorContext::new().with_metadata("status", status))
            }
            PipelineError::StoreResponseInvalid { .. } => {
                ErrorRecord::builder(Category::Database, error.to_string())
                    .severity(Severity::High)
                    .code("STORE_RESPONSE_INVALID")
            }
        };
        builder.name("PipelineError").build()
    }
}

impl From<PipelineError> for ErrorRecord {
    fn from(error: PipelineError) -> Self {
        Self::from(&error)
    }
}

impl From<PipelineError> for RaisedError {
    fn from(error: PipelineError) -> Self {
        Self::Classified(ErrorRecord::from(&error))
    }
}
