//! The canonical classified error.

use super::category::{Category, Severity};
use super::context::ErrorContext;
use super::sanitize::sanitize_user_message;
use crate::logging::log_debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Overrides accepted by [`ErrorRecord::with_options`].
///
/// Anything left as `None` falls back to the base defaults: the category's
/// error name and message, recoverable, not retryable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorOptions {
    pub name: Option<String>,
    pub user_message: Option<String>,
    pub code: Option<String>,
    pub context: Option<ErrorContext>,
    pub recoverable: Option<bool>,
    pub retryable: Option<bool>,
    pub stack: Option<String>,
}

/// A classified error.
///
/// Created once when a raw failure is classified and never mutated afterwards;
/// methods that "change" a record return a new one. `message` is for logs,
/// `user_message` is the only text that may be rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("{name}: {message}")]
pub struct ErrorRecord {
    name: String,
    message: String,
    user_message: String,
    category: Category,
    severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    context: Option<ErrorContext>,
    recoverable: bool,
    retryable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    stack: Option<String>,
}

impl ErrorRecord {
    /// Base constructor: severity `medium`, recoverable, not retryable.
    pub fn new(message: impl Into<String>, category: Category) -> Self {
        Self::with_options(message, category, None, ErrorOptions::default())
    }

    /// Base constructor with explicit severity and overrides.
    ///
    /// The category invariants always hold on the result: payment, permission,
    /// not-found and database records are never retryable, and only payment
    /// and database records may be critical (others are capped at high).
    pub fn with_options(
        message: impl Into<String>,
        category: Category,
        severity: Option<Severity>,
        options: ErrorOptions,
    ) -> Self {
        let message = message.into();

        let mut severity = severity.unwrap_or(Severity::Medium);
        if severity == Severity::Critical && !category.permits_critical() {
            log_debug!(
                category = %category,
                "Critical severity is reserved for payment and database errors, using high"
            );
            severity = Severity::High;
        }

        let user_message = options
            .user_message
            .as_deref()
            .and_then(sanitize_user_message)
            .unwrap_or_else(|| category.default_user_message().to_string());

        let retryable = options.retryable.unwrap_or(false) && category.permits_retry();

        Self {
            name: options
                .name
                .unwrap_or_else(|| category.error_name().to_string()),
            message,
            user_message,
            category,
            severity,
            code: options.code,
            context: options.context,
            recoverable: options.recoverable.unwrap_or(true),
            retryable,
            stack: options.stack,
        }
    }

    /// Start a record that uses the category's own defaults for severity,
    /// retryability and recoverability (e.g. network errors are retryable,
    /// payment errors are critical and non-recoverable).
    pub fn builder(category: Category, message: impl Into<String>) -> ErrorRecordBuilder {
        ErrorRecordBuilder {
            message: message.into(),
            category,
            severity: category.profile_severity(),
            options: ErrorOptions {
                recoverable: Some(category.profile_recoverable()),
                retryable: Some(category.profile_retryable()),
                ..ErrorOptions::default()
            },
        }
    }

    // =========================================================================
    // Category constructors
    // =========================================================================

    pub fn auth(message: impl Into<String>) -> Self {
        Self::builder(Category::Auth, message).build()
    }

    pub fn api(message: impl Into<String>) -> Self {
        Self::builder(Category::Api, message).build()
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::builder(Category::Validation, message).build()
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::builder(Category::Network, message).build()
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::builder(Category::Database, message).build()
    }

    pub fn permission(message: impl Into<String>) -> Self {
        Self::builder(Category::Permission, message).build()
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::builder(Category::NotFound, message).build()
    }

    pub fn form(message: impl Into<String>) -> Self {
        Self::builder(Category::Form, message).build()
    }

    pub fn file(message: impl Into<String>) -> Self {
        Self::builder(Category::File, message).build()
    }

    pub fn payment(message: impl Into<String>) -> Self {
        Self::builder(Category::Payment, message).build()
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::builder(Category::Unknown, message).build()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Technical message, for logs and developers only.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Sanitized message, safe to render.
    pub fn user_message(&self) -> &str {
        &self.user_message
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    pub fn context(&self) -> Option<&ErrorContext> {
        self.context.as_ref()
    }

    pub fn is_recoverable(&self) -> bool {
        self.recoverable
    }

    pub fn is_retryable(&self) -> bool {
        self.retryable
    }

    pub fn stack(&self) -> Option<&str> {
        self.stack.as_deref()
    }

    /// A copy of this record whose context is `context` merged over the
    /// existing one. Fields already on the record win.
    pub fn with_context(&self, context: ErrorContext) -> Self {
        let merged = match &self.context {
            Some(existing) => existing.clone().merged_with(&context),
            None => context,
        };
        Self {
            context: Some(merged),
            ..self.clone()
        }
    }
}

/// Builder returned by [`ErrorRecord::builder`].
#[derive(Debug, Clone)]
pub struct ErrorRecordBuilder {
    message: String,
    category: Category,
    severity: Severity,
    options: ErrorOptions,
}

impl ErrorRecordBuilder {
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.options.name = Some(name.into());
        self
    }

    pub fn user_message(mut self, user_message: impl Into<String>) -> Self {
        self.options.user_message = Some(user_message.into());
        self
    }

    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.options.code = Some(code.into());
        self
    }

    pub fn context(mut self, context: ErrorContext) -> Self {
        self.options.context = Some(context);
        self
    }

    pub fn recoverable(mut self, recoverable: bool) -> Self {
        self.options.recoverable = Some(recoverable);
        self
    }

    pub fn retryable(mut self, retryable: bool) -> Self {
        self.options.retryable = Some(retryable);
        self
    }

    pub fn stack(mut self, stack: impl Into<String>) -> Self {
        self.options.stack = Some(stack.into());
        self
    }

    pub fn build(self) -> ErrorRecord {
        ErrorRecord::with_options(self.message, self.category, Some(self.severity), self.options)
    }
}
