use super::{ErrorLog, ErrorStore, NewErrorLog};
use crate::error::{PipelineError, PipelineResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

/// In-process error table.
///
/// Assigns ids and timestamps on insert like the remote table would. Inserts
/// can be made to fail on demand to exercise the logger's re-queue path.
#[derive(Debug, Default)]
pub struct InMemoryErrorStore {
    rows: Mutex<Vec<ErrorLog>>,
    failures_remaining: AtomicUsize,
    insert_calls: AtomicUsize,
}

impl InMemoryErrorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` inserts fail with [`PipelineError::StoreUnavailable`].
    pub fn fail_next_inserts(&self, count: usize) {
        self.failures_remaining.store(count, Ordering::SeqCst);
    }

    /// Number of insert calls seen, successful or not.
    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }

    /// Snapshot of all rows in insertion order.
    pub fn rows(&self) -> Vec<ErrorLog> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Insert a row with a chosen creation time, bypassing failure injection.
    pub fn insert_at(&self, entry: NewErrorLog, created_at: DateTime<Utc>) -> Uuid {
        let id = Uuid::new_v4();
        self.lock().push(ErrorLog {
            id,
            created_at,
            entry,
        });
        id
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ErrorLog>> {
        self.rows.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ErrorStore for InMemoryErrorStore {
    async fn insert(&self, rows: &[NewErrorLog]) -> PipelineResult<()> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);

        let should_fail = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(PipelineError::store_unavailable(
                "In-memory store insert failure injected",
                None,
            ));
        }

        let now = Utc::now();
        let mut table = self.lock();
        table.extend(rows.iter().cloned().map(|entry| ErrorLog {
            id: Uuid::new_v4(),
            created_at: now,
            entry,
        }));
        Ok(())
    }

    async fn select_since(&self, since: DateTime<Utc>) -> PipelineResult<Vec<ErrorLog>> {
        let mut rows: Vec<ErrorLog> = self
            .lock()
            .iter()
            .filter(|row| row.created_at >= since)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }
}
