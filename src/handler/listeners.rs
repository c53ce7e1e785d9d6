//! Routing of otherwise-unhandled failures into the handler.
//!
//! Panics anywhere in the process go through [`install_panic_listener`],
//! which replaces the default panic report. Background tasks started with
//! [`spawn_guarded`] have both their `Err` results and their panics handled,
//! so a failure nobody awaits still reaches the log and the user.

use super::ErrorHandler;
use crate::logging::log_error;
use crate::taxonomy::{Category, ErrorContext, ErrorRecord, RaisedError, Severity};
use futures_util::FutureExt;
use std::any::Any;
use std::cell::Cell;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Weak};
use tokio::task::JoinHandle;

thread_local! {
    /// Depth of guarded task polls on this thread. Panics raised inside one
    /// are caught and handled by [`spawn_guarded`].
    static GUARDED_POLLS: Cell<u32> = const { Cell::new(0) };
}

/// Marks the current thread as polling a guarded task until dropped.
struct GuardedPoll;

impl GuardedPoll {
    fn enter() -> Self {
        GUARDED_POLLS.with(|depth| depth.set(depth.get() + 1));
        Self
    }

    fn active() -> bool {
        GUARDED_POLLS.with(|depth| depth.get() > 0)
    }
}

impl Drop for GuardedPoll {
    fn drop(&mut self) {
        GUARDED_POLLS.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// Restores the previous panic hook when dropped.
#[must_use = "dropping the guard uninstalls the panic listener"]
pub struct PanicListenerGuard {
    restore: Option<Box<dyn FnOnce() + Send>>,
}

impl PanicListenerGuard {
    /// Keep the listener installed for the rest of the process.
    pub fn forget(mut self) {
        self.restore = None;
    }
}

impl Drop for PanicListenerGuard {
    fn drop(&mut self) {
        if let Some(restore) = self.restore.take() {
            restore();
        }
    }
}

impl std::fmt::Debug for PanicListenerGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PanicListenerGuard")
            .field("installed", &self.restore.is_some())
            .finish()
    }
}

/// Replace the process panic hook with one that hands each panic to
/// `handler` as an `unknown`/`high` error.
///
/// The hook holds only a weak reference; once the handler is gone panics are
/// reported through `tracing` alone. Panics inside [`spawn_guarded`] tasks
/// are left to the task's own handling.
pub fn install_panic_listener(handler: &Arc<ErrorHandler>) -> PanicListenerGuard {
    let weak: Weak<ErrorHandler> = Arc::downgrade(handler);
    let previous = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |info| {
        if GuardedPoll::active() {
            return;
        }

        let payload = panic_message(info.payload());
        let location = info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()));

        let record = panic_record(&payload, location.as_deref());
        match weak.upgrade() {
            Some(handler) => {
                handler.handle(&RaisedError::Classified(record), true);
            }
            None => log_error!(
                panic = %payload,
                location = location.as_deref().unwrap_or("-"),
                "Unhandled panic after error handler shut down"
            ),
        }
    }));

    PanicListenerGuard {
        restore: Some(Box::new(move || std::panic::set_hook(previous))),
    }
}

/// Spawn `future`, handling its error or panic. Resolves to `Some(value)` on
/// success and `None` after a handled failure.
pub fn spawn_guarded<F, T, E>(handler: Arc<ErrorHandler>, task: &str, future: F) -> JoinHandle<Option<T>>
where
    F: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Into<RaisedError> + Send + 'static,
{
    let context = ErrorContext::new().with_action(task.to_string());

    tokio::spawn(async move {
        let mut future = Box::pin(future);
        let guarded = futures_util::future::poll_fn(move |cx| {
            let _poll = GuardedPoll::enter();
            future.as_mut().poll(cx)
        });

        match AssertUnwindSafe(guarded).catch_unwind().await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(error)) => {
                handler.handle_in(&error.into(), &context, true);
                None
            }
            Err(payload) => {
                let record = panic_record(&panic_message(payload.as_ref()), None);
                handler.handle_in(&RaisedError::Classified(record), &context, true);
                None
            }
        }
    })
}

fn panic_record(payload: &str, location: Option<&str>) -> ErrorRecord {
    let mut context = ErrorContext::new();
    if let Some(location) = location {
        context = context.with_metadata("location", location);
    }

    let mut builder = ErrorRecord::builder(Category::Unknown, format!("panic: {payload}"))
        .name("Panic")
        .severity(Severity::High)
        .code("PANIC")
        .recoverable(true)
        .retryable(false)
        .context(context);
    if let Some(location) = location {
        builder = builder.stack(location.to_string());
    }
    builder.build()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
