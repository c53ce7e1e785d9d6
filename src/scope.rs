//! Component-bound access to the handler.
//!
//! An [`ErrorScope`] is what a UI component holds: it tags every failure with
//! the component and action, keeps the latest record for rendering, and
//! applies the propagation policy (low/medium absorbed, high/critical handed
//! back to the caller).

use crate::handler::retry::run_with_retry;
use crate::handler::{ErrorHandler, RetryPolicy};
use crate::taxonomy::{ErrorContext, ErrorRecord, RaisedError, Severity};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

pub struct ErrorScope {
    handler: Arc<ErrorHandler>,
    component: String,
    current: Mutex<Option<ErrorRecord>>,
}

impl ErrorScope {
    pub fn new(handler: Arc<ErrorHandler>, component: impl Into<String>) -> Self {
        Self {
            handler,
            component: component.into(),
            current: Mutex::new(None),
        }
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    fn context(&self, action: &str) -> ErrorContext {
        ErrorContext::new()
            .with_component(self.component.clone())
            .with_action(action.to_string())
            .with_timestamp(chrono::Utc::now())
    }

    fn set_current(&self, record: Option<ErrorRecord>) {
        *self.current.lock().unwrap_or_else(|p| p.into_inner()) = record;
    }

    /// Handle a failure raised by `action` in this component and keep it as
    /// the current error.
    pub fn capture(&self, action: &str, error: impl Into<RaisedError>) -> ErrorRecord {
        let record = self
            .handler
            .handle_in(&error.into(), &self.context(action), true);
        self.set_current(Some(record.clone()));
        record
    }

    /// Await `operation`; on failure handle it and return `None`.
    pub async fn run<T, E, Fut>(&self, action: &str, operation: Fut) -> Option<T>
    where
        Fut: Future<Output = Result<T, E>>,
        E: Into<RaisedError>,
    {
        match operation.await {
            Ok(value) => Some(value),
            Err(error) => {
                self.capture(action, error);
                None
            }
        }
    }

    /// Await `operation`. Low and medium failures are handled and absorbed
    /// (`Ok(None)`); high and critical ones are handled and also returned so
    /// the caller can abort its own flow.
    pub async fn try_run<T, E, Fut>(&self, action: &str, operation: Fut) -> Result<Option<T>, ErrorRecord>
    where
        Fut: Future<Output = Result<T, E>>,
        E: Into<RaisedError>,
    {
        match operation.await {
            Ok(value) => Ok(Some(value)),
            Err(error) => {
                let record = self.capture(action, error);
                if record.severity() >= Severity::High {
                    Err(record)
                } else {
                    Ok(None)
                }
            }
        }
    }

    /// Record form validation failures. Returns `None` when there are none.
    ///
    /// Validation is shown inline next to the fields, so no toast is raised.
    pub fn validate_form(
        &self,
        form: &str,
        field_errors: &BTreeMap<String, String>,
    ) -> Option<ErrorRecord> {
        if field_errors.is_empty() {
            return None;
        }
        let record = self.handler.classify_form_error(form, field_errors);
        let handled = self.handler.handle_in(
            &RaisedError::Classified(record),
            &self.context(&format!("submit:{form}")),
            false,
        );
        self.set_current(Some(handled.clone()));
        Some(handled)
    }

    /// Retry `operation` under the handler's policy. The final failure,
    /// whether non-retryable or exhausted, is handled once with this scope's
    /// context and kept as the current error.
    pub async fn with_retry<F, Fut, T, E>(&self, action: &str, operation: F) -> Result<T, ErrorRecord>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<RaisedError>,
    {
        let policy: RetryPolicy = self.handler.retry_policy().clone();
        let context = self.context(action);
        match run_with_retry(&policy, operation).await {
            Ok(value) => Ok(value),
            Err(failure) => {
                let record = self.handler.handle_in(&failure.error, &context, true);
                self.set_current(Some(record.clone()));
                Err(record)
            }
        }
    }

    pub fn current_error(&self) -> Option<ErrorRecord> {
        self.current.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn has_error(&self) -> bool {
        self.current
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .is_some()
    }

    /// Dismiss the current error.
    pub fn clear(&self) {
        self.set_current(None);
    }
}

impl std::fmt::Debug for ErrorScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorScope")
            .field("component", &self.component)
            .field("has_error", &self.has_error())
            .finish()
    }
}
