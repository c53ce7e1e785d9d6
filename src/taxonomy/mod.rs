//! Error taxonomy: categories, severities and the canonical [`ErrorRecord`].
//!
//! Construction is pure: nothing here logs to the store or notifies anyone.
//! That is the job of [`ErrorLogger`](crate::logger::ErrorLogger) and
//! [`ErrorHandler`](crate::handler::ErrorHandler).
//!
//! ```rust
//! use csr_errors::taxonomy::{Category, ErrorRecord, Severity};
//!
//! let err = ErrorRecord::network("connect ECONNREFUSED 10.0.0.4:443");
//! assert_eq!(err.category(), Category::Network);
//! assert_eq!(err.severity(), Severity::Medium);
//! assert!(err.is_retryable());
//! assert!(!err.user_message().contains("ECONNREFUSED"));
//! ```

pub mod category;
pub mod context;
pub mod raised;
pub mod record;
pub mod sanitize;

pub use category::{Category, Severity};
pub use context::ErrorContext;
pub use raised::RaisedError;
pub use record::{ErrorOptions, ErrorRecord, ErrorRecordBuilder};
pub use sanitize::{contains_internal_details, sanitize_user_message};
