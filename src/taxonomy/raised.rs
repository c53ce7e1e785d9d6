//! What a failing operation hands to the pipeline.

use super::category::{Category, Severity};
use super::record::ErrorRecord;
use thiserror::Error;

/// A failure as raised by an operation: either already classified at the
/// throw site, or a raw error the handler still has to classify.
#[derive(Debug, Error)]
pub enum RaisedError {
    #[error(transparent)]
    Classified(#[from] ErrorRecord),

    #[error(transparent)]
    Unclassified(#[from] anyhow::Error),
}

impl RaisedError {
    /// Wrap any standard error as unclassified.
    pub fn raw<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Unclassified(anyhow::Error::new(error))
    }

    pub fn record(&self) -> Option<&ErrorRecord> {
        match self {
            Self::Classified(record) => Some(record),
            Self::Unclassified(_) => None,
        }
    }

    /// Whether a retry helper may re-invoke the operation. Unclassified
    /// errors carry no retry verdict and are retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Classified(record) => record.is_retryable(),
            Self::Unclassified(_) => true,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Classified(record) => record.is_recoverable(),
            Self::Unclassified(_) => true,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::Classified(record) => record.severity(),
            Self::Unclassified(_) => Severity::Medium,
        }
    }

    pub fn category(&self) -> Category {
        match self {
            Self::Classified(record) => record.category(),
            Self::Unclassified(_) => Category::Unknown,
        }
    }

    /// Text safe to render without running classification.
    pub fn user_message(&self) -> &str {
        match self {
            Self::Classified(record) => record.user_message(),
            Self::Unclassified(_) => Category::Unknown.default_user_message(),
        }
    }
}
