//! Persistence sink for logged errors.
//!
//! The logger treats the store as an append-only table: it inserts batches
//! and reads rows back by creation time. There is no update or delete path.
//!
//! - [`InMemoryErrorStore`] keeps rows in process, for tests and for
//!   deployments without a remote table.
//! - [`RestErrorStore`] writes to a Supabase/PostgREST `error_logs` table.

pub mod memory;
pub mod rest;

pub use memory::InMemoryErrorStore;
pub use rest::RestErrorStore;

use crate::error::PipelineResult;
use crate::taxonomy::{Category, ErrorContext, ErrorRecord, Severity};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A row waiting to be persisted. `id` and `created_at` are assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewErrorLog {
    pub name: String,
    pub message: String,
    pub user_message: String,
    pub category: Category,
    pub severity: Severity,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub context: Option<ErrorContext>,
    pub recoverable: bool,
    pub retryable: bool,
    #[serde(default)]
    pub stack: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    pub user_agent: String,
}

impl NewErrorLog {
    /// Project a record into a row. `extra` is merged under the record's own
    /// context (the record's fields win).
    pub fn from_record(
        record: &ErrorRecord,
        extra: Option<&ErrorContext>,
        user_agent: impl Into<String>,
    ) -> Self {
        let context = match (record.context(), extra) {
            (Some(own), Some(extra)) => Some(own.clone().merged_with(extra)),
            (Some(own), None) => Some(own.clone()),
            (None, Some(extra)) => Some(extra.clone()),
            (None, None) => None,
        }
        .filter(|ctx| !ctx.is_empty());

        Self {
            name: record.name().to_string(),
            message: record.message().to_string(),
            user_message: record.user_message().to_string(),
            category: record.category(),
            severity: record.severity(),
            code: record.code().map(str::to_string),
            url: context.as_ref().and_then(|ctx| ctx.url.clone()),
            context,
            recoverable: record.is_recoverable(),
            retryable: record.is_retryable(),
            stack: record.stack().map(str::to_string),
            user_agent: user_agent.into(),
        }
    }
}

/// A persisted row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorLog {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub entry: NewErrorLog,
}

/// Append-only table of error rows.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ErrorStore: Send + Sync {
    /// Append a batch. Either the whole batch is accepted or an error is returned.
    async fn insert(&self, rows: &[NewErrorLog]) -> PipelineResult<()>;

    /// Rows created at or after `since`, newest first.
    async fn select_since(&self, since: DateTime<Utc>) -> PipelineResult<Vec<ErrorLog>>;
}
