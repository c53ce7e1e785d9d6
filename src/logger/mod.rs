//! Non-blocking, batched error logging.
//!
//! [`ErrorLogger::log`] projects a record into a row, appends it to a bounded
//! in-memory queue and returns. A background task drains the queue into the
//! [`ErrorStore`] in FIFO batches. A batch that fails to persist is put back at
//! the front and retried on the next cycle, so delivery is at-least-once.
//!
//! In development every logged row is also mirrored to the console target
//! ([`CONSOLE_TARGET`](crate::logging::CONSOLE_TARGET)) at a level that
//! matches its severity.

mod queue;
pub mod stats;

pub use stats::ErrorStats;

use crate::config::{Environment, LoggerConfig};
use crate::error::PipelineResult;
use crate::logging::{log_at_severity, log_debug, log_error, log_trace, log_warn};
use crate::store::{ErrorStore, NewErrorLog};
use crate::taxonomy::{Category, ErrorContext, ErrorRecord, RaisedError, Severity};
use chrono::Utc;
use queue::PendingQueue;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

struct Shared {
    queue: Mutex<PendingQueue>,
    store: Arc<dyn ErrorStore>,
    config: LoggerConfig,
    environment: Environment,
    wake: Notify,
    /// Asks the background task to exit at its next idle point
    stop: Notify,
    /// Rows persisted over the logger's lifetime
    written: AtomicUsize,
    /// Serializes flushes so batches reach the store in queue order
    flush_lock: tokio::sync::Mutex<()>,
}

impl Shared {
    fn queue(&self) -> std::sync::MutexGuard<'_, PendingQueue> {
        self.queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn flush_pending(&self) -> PipelineResult<usize> {
        let _guard = self.flush_lock.lock().await;
        let mut written = 0;

        loop {
            let batch = self.queue().take_batch(self.config.batch_size);
            if batch.is_empty() {
                return Ok(written);
            }

            let batch_len = batch.len();
            match self.store.insert(&batch).await {
                Ok(()) => {
                    written += batch_len;
                    self.written.fetch_add(batch_len, Ordering::Relaxed);
                }
                Err(e) => {
                    let dropped = self.queue().restore_front(batch);
                    log_warn!(
                        batch_size = batch_len,
                        dropped = dropped,
                        error = %e,
                        "Error log flush failed, batch re-queued"
                    );
                    return Err(e);
                }
            }
        }
    }
}

/// Process-wide error logger.
pub struct ErrorLogger {
    shared: Arc<Shared>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ErrorLogger {
    /// Create a logger without a background task. Rows are only written by
    /// explicit [`flush`](Self::flush) calls.
    pub fn new(store: Arc<dyn ErrorStore>, config: LoggerConfig, environment: Environment) -> Self {
        Self {
            shared: Arc::new(Shared {
                queue: Mutex::new(PendingQueue::new(config.queue_capacity)),
                store,
                config,
                environment,
                wake: Notify::new(),
                stop: Notify::new(),
                written: AtomicUsize::new(0),
                flush_lock: tokio::sync::Mutex::new(()),
            }),
            task: Mutex::new(None),
        }
    }

    /// Create a logger and start its background flush task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(store: Arc<dyn ErrorStore>, config: LoggerConfig, environment: Environment) -> Self {
        let logger = Self::new(store, config, environment);
        let handle = tokio::spawn(run_flush_loop(Arc::clone(&logger.shared)));
        *logger.task_slot() = Some(handle);
        logger
    }

    /// Queue a classified record. Never blocks and never fails; `context` is
    /// merged under the record's own context.
    pub fn log(&self, record: &ErrorRecord, context: Option<&ErrorContext>) {
        let entry = NewErrorLog::from_record(record, context, self.shared.config.user_agent.clone());

        if self.shared.environment.is_development() {
            mirror_to_console(&entry);
        }

        let (pending, dropped) = {
            let mut queue = self.shared.queue();
            let dropped = queue.push(entry);
            (queue.len(), dropped)
        };

        if dropped > 0 {
            log_warn!(
                dropped = dropped,
                capacity = self.shared.config.queue_capacity,
                "Error log queue full, oldest entries dropped"
            );
        }

        log_trace!(pending = pending, "Error row queued");

        if pending >= self.shared.config.batch_size {
            self.shared.wake.notify_one();
        }
    }

    /// Queue any raised error. Unclassified errors are recorded as
    /// `unknown`/`medium` without further inspection.
    pub fn log_raised(&self, error: &RaisedError, context: Option<&ErrorContext>) {
        match error {
            RaisedError::Classified(record) => self.log(record, context),
            RaisedError::Unclassified(raw) => {
                let record = ErrorRecord::builder(Category::Unknown, raw.to_string())
                    .severity(Severity::Medium)
                    .stack(format!("{raw:?}"))
                    .build();
                self.log(&record, context);
            }
        }
    }

    /// Write everything currently queued. Stops at the first failed batch,
    /// which stays queued.
    ///
    /// # Errors
    ///
    /// Returns the store error of the failed batch.
    pub async fn flush(&self) -> PipelineResult<usize> {
        self.shared.flush_pending().await
    }

    /// Stop the background task and perform a final flush.
    ///
    /// A batch the task is already writing is allowed to finish first.
    /// Returns every row persisted from the moment shutdown began, including
    /// that batch.
    ///
    /// # Errors
    ///
    /// Returns the store error of the final flush.
    pub async fn shutdown(&self) -> PipelineResult<usize> {
        let before = self.shared.written.load(Ordering::Relaxed);

        let handle = self.task_slot().take();
        if let Some(handle) = handle {
            self.shared.stop.notify_one();
            if let Err(e) = handle.await {
                log_warn!(error = %e, "Error log flush task ended abnormally");
            }
        }

        self.flush().await?;
        Ok(self.shared.written.load(Ordering::Relaxed) - before)
    }

    /// Totals by severity and category for the last `window_hours` hours.
    ///
    /// # Errors
    ///
    /// Returns the store error if rows cannot be read.
    pub async fn get_error_stats(&self, window_hours: u32) -> PipelineResult<ErrorStats> {
        let since = Utc::now() - chrono::Duration::hours(i64::from(window_hours));
        let rows = self.shared.store.select_since(since).await?;

        log_debug!(
            window_hours = window_hours,
            rows = rows.len(),
            "Computed error statistics"
        );

        Ok(ErrorStats::from_rows(&rows, window_hours))
    }

    /// Rows waiting to be written.
    pub fn pending(&self) -> usize {
        self.shared.queue().len()
    }

    /// Rows dropped because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.shared.queue().dropped()
    }

    pub fn environment(&self) -> Environment {
        self.shared.environment
    }

    fn task_slot(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.task.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for ErrorLogger {
    fn drop(&mut self) {
        // The task finishes any batch in flight, then exits on its own
        if self.task_slot().take().is_some() {
            self.shared.stop.notify_one();
        }
    }
}

impl std::fmt::Debug for ErrorLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorLogger")
            .field("environment", &self.shared.environment)
            .field("pending", &self.pending())
            .field("dropped", &self.dropped())
            .finish()
    }
}

async fn run_flush_loop(shared: Arc<Shared>) {
    let mut ticker = tokio::time::interval(shared.config.flush_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shared.wake.notified() => {}
            _ = shared.stop.notified() => break,
        }

        match shared.flush_pending().await {
            Ok(0) => {}
            Ok(written) => log_debug!(rows = written, "Background error log flush"),
            Err(e) => {
                log_error!(
                    error = %e,
                    pending = shared.queue().len(),
                    "Background error log flush failed, waiting for next interval"
                );
                ticker.reset();
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = shared.stop.notified() => break,
                }
            }
        }
    }

    log_debug!(pending = shared.queue().len(), "Error log flush task stopped");
}

fn mirror_to_console(entry: &NewErrorLog) {
    let component = entry
        .context
        .as_ref()
        .and_then(|ctx| ctx.component.as_deref())
        .unwrap_or("-");
    let action = entry
        .context
        .as_ref()
        .and_then(|ctx| ctx.action.as_deref())
        .unwrap_or("-");

    log_at_severity!(
        entry.severity,
        error_name = %entry.name,
        severity = %entry.severity,
        category = %entry.category,
        color = entry.severity.console_color(),
        code = entry.code.as_deref().unwrap_or("-"),
        user_message = %entry.user_message,
        component = component,
        action = action,
        stack = entry.stack.as_deref().unwrap_or(""),
        "{}",
        entry.message
    );
}
