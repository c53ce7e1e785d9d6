//! Central error dispatch: classify, log, notify, retry.
//!
//! One [`ErrorHandler`] is built at start-up (see
//! [`ErrorPipeline`](crate::pipeline::ErrorPipeline)) and shared by reference.
//! Its only mutable state is the signed-in user used to enrich log context;
//! everything else is configuration and collaborators.

pub mod classify;
pub mod listeners;
pub mod retry;

pub use classify::{ApiFailure, FileFailure, FileMeta};
pub use listeners::{install_panic_listener, spawn_guarded, PanicListenerGuard};
pub use retry::{RetryFailure, RetryPolicy, StopReason};

use crate::config::{NavigationConfig, NotificationConfig, PipelineConfig};
use crate::logger::ErrorLogger;
use crate::logging::log_debug;
use crate::notify::{Navigator, Notifier};
use crate::taxonomy::{Category, ErrorContext, ErrorRecord, RaisedError, Severity};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, RwLock};

/// Auth error codes that mean the session is gone and the user must sign in.
pub const SESSION_EXPIRY_CODES: [&str; 2] = ["UNAUTHORIZED", "SESSION_EXPIRED"];

/// Process-wide error handler.
pub struct ErrorHandler {
    logger: Arc<ErrorLogger>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    notifications: NotificationConfig,
    navigation: NavigationConfig,
    retry: RetryPolicy,
    user: RwLock<Option<ErrorContext>>,
}

impl ErrorHandler {
    pub fn new(
        logger: Arc<ErrorLogger>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            logger,
            notifier,
            navigator,
            notifications: config.notifications.clone(),
            navigation: config.navigation.clone(),
            retry: config.retry.clone(),
            user: RwLock::new(None),
        }
    }

    pub fn logger(&self) -> &Arc<ErrorLogger> {
        &self.logger
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn navigation(&self) -> &NavigationConfig {
        &self.navigation
    }

    // =========================================================================
    // Signed-in user
    // =========================================================================

    /// Attach this user to the context of every subsequently logged error.
    pub fn set_user(&self, user_id: impl Into<String>, role: Option<String>) {
        let context = ErrorContext::new().with_user(user_id, role);
        *self.user.write().unwrap_or_else(|p| p.into_inner()) = Some(context);
    }

    pub fn clear_user(&self) {
        *self.user.write().unwrap_or_else(|p| p.into_inner()) = None;
    }

    fn user_context(&self) -> Option<ErrorContext> {
        self.user.read().unwrap_or_else(|p| p.into_inner()).clone()
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    /// Classify without side effects.
    pub fn classify(&self, error: &RaisedError) -> ErrorRecord {
        classify::classify_raised(error)
    }

    /// Log `error`, notify the user if asked, and start the login redirect
    /// for expired sessions. Returns the classified record.
    ///
    /// Critical errors are always notified, even when `show_notification`
    /// is false.
    pub fn handle(&self, error: &RaisedError, show_notification: bool) -> ErrorRecord {
        self.dispatch(self.classify(error), show_notification)
    }

    /// Shorthand for `handle(&error.into(), true)`.
    pub fn report(&self, error: impl Into<RaisedError>) -> ErrorRecord {
        self.handle(&error.into(), true)
    }

    /// Handle with extra context merged under the record's own.
    pub fn handle_in(
        &self,
        error: &RaisedError,
        context: &ErrorContext,
        show_notification: bool,
    ) -> ErrorRecord {
        let record = self.classify(error).with_context(context.clone());
        self.dispatch(record, show_notification)
    }

    fn dispatch(&self, record: ErrorRecord, show_notification: bool) -> ErrorRecord {
        let user = self.user_context();
        self.logger.log(&record, user.as_ref());

        let notify = show_notification || record.severity() == Severity::Critical;
        if notify {
            self.notify(&record);
        }

        if is_session_expiry(&record) {
            self.schedule_login_redirect();
        }

        log_debug!(
            category = %record.category(),
            severity = %record.severity(),
            code = record.code().unwrap_or("-"),
            notified = notify,
            "Error handled"
        );

        record
    }

    fn notify(&self, record: &ErrorRecord) {
        let message = record.user_message();
        match record.severity() {
            Severity::Low => self.notifier.info(message),
            Severity::Medium => self.notifier.warning(message),
            Severity::High => self.notifier.error(message, self.notifications.alert_duration),
            Severity::Critical => {
                self.notifier
                    .error(message, self.notifications.critical_alert_duration)
            }
        }
    }

    fn schedule_login_redirect(&self) {
        let navigator = Arc::clone(&self.navigator);
        let url = self.navigation.login_url.clone();
        let delay = self.navigation.session_redirect_delay;

        log_debug!(
            login_url = %url,
            delay_ms = delay.as_millis(),
            "Session expired, scheduling login redirect"
        );

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    tokio::time::sleep(delay).await;
                    navigator.navigate(&url);
                });
            }
            Err(_) => navigator.navigate(&url),
        }
    }

    // =========================================================================
    // Classification helpers
    // =========================================================================

    /// Classify a failed REST call; endpoint, method and status are kept in
    /// the record's context.
    pub fn classify_api_error(
        &self,
        failure: &ApiFailure,
        endpoint: &str,
        method: &str,
    ) -> ErrorRecord {
        let record = classify::classify_api_error(failure, endpoint, method);
        log_debug!(
            endpoint = %endpoint,
            method = %method,
            category = %record.category(),
            code = record.code().unwrap_or("-"),
            "Classified API error"
        );
        record
    }

    pub fn classify_form_error(
        &self,
        form: &str,
        field_errors: &BTreeMap<String, String>,
    ) -> ErrorRecord {
        classify::classify_form_error(form, field_errors)
    }

    pub fn classify_file_error(&self, file: &FileMeta, failure: &FileFailure) -> ErrorRecord {
        classify::classify_file_error(file, failure)
    }

    pub fn classify_database_error(&self, code: Option<&str>, message: &str) -> ErrorRecord {
        classify::classify_database_error(code, message)
    }

    pub fn classify_payment_error(&self, message: &str, provider_code: Option<&str>) -> ErrorRecord {
        classify::classify_payment_error(message, provider_code)
    }

    // =========================================================================
    // Retry
    // =========================================================================

    /// Run `operation` with the configured retry policy.
    ///
    /// Non-retryable classified errors are returned immediately without being
    /// handled; the caller decides what to do with them. When retries run
    /// out, the last error is handled once and returned unchanged.
    pub async fn handle_with_retry<F, Fut, T, E>(&self, operation: F) -> Result<T, RaisedError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<RaisedError>,
    {
        let policy = self.retry.clone();
        self.handle_with_retry_using(&policy, None, operation).await
    }

    /// Like [`handle_with_retry`](Self::handle_with_retry) with an explicit
    /// policy and optional context for the final handled record.
    pub async fn handle_with_retry_using<F, Fut, T, E>(
        &self,
        policy: &RetryPolicy,
        context: Option<&ErrorContext>,
        operation: F,
    ) -> Result<T, RaisedError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<RaisedError>,
    {
        match retry::run_with_retry(policy, operation).await {
            Ok(value) => Ok(value),
            Err(failure) => {
                if failure.reason == StopReason::Exhausted {
                    match context {
                        Some(ctx) => self.handle_in(&failure.error, ctx, true),
                        None => self.handle(&failure.error, true),
                    };
                }
                Err(failure.error)
            }
        }
    }
}

impl std::fmt::Debug for ErrorHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorHandler")
            .field("logger", &self.logger)
            .field("retry", &self.retry)
            .field("navigation", &self.navigation)
            .finish_non_exhaustive()
    }
}

fn is_session_expiry(record: &ErrorRecord) -> bool {
    record.category() == Category::Auth
        && record
            .code()
            .is_some_and(|code| SESSION_EXPIRY_CODES.contains(&code))
}
