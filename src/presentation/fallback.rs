use crate::config::{Environment, NavigationConfig};
use crate::taxonomy::{Category, ErrorRecord, RaisedError, Severity};
use futures_util::FutureExt;
use serde::Serialize;
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// What the boundary has captured.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryState {
    Healthy,
    Faulted(CapturedFault),
}

/// A failure captured by a [`FallbackBoundary`].
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedFault {
    pub user_message: String,
    pub message: String,
    pub name: String,
    pub category: Category,
    pub severity: Severity,
    pub code: Option<String>,
    pub recoverable: bool,
    pub stack: Option<String>,
    pub component_stack: Option<String>,
}

impl CapturedFault {
    fn from_raised(error: &RaisedError, component_stack: Option<String>) -> Self {
        match error {
            RaisedError::Classified(record) => Self::from_record(record, component_stack),
            RaisedError::Unclassified(raw) => Self {
                user_message: error.user_message().to_string(),
                message: raw.to_string(),
                name: Category::Unknown.error_name().to_string(),
                category: Category::Unknown,
                severity: Severity::Medium,
                code: None,
                recoverable: true,
                stack: Some(format!("{raw:?}")),
                component_stack,
            },
        }
    }

    fn from_record(record: &ErrorRecord, component_stack: Option<String>) -> Self {
        Self {
            user_message: record.user_message().to_string(),
            message: record.message().to_string(),
            name: record.name().to_string(),
            category: record.category(),
            severity: record.severity(),
            code: record.code().map(str::to_string),
            recoverable: record.is_recoverable(),
            stack: record.stack().map(str::to_string),
            component_stack,
        }
    }

    fn from_panic(payload: String) -> Self {
        Self {
            user_message: Category::Unknown.default_user_message().to_string(),
            message: format!("panic: {payload}"),
            name: "Panic".to_string(),
            category: Category::Unknown,
            severity: Severity::High,
            code: Some("PANIC".to_string()),
            recoverable: true,
            stack: None,
            component_stack: None,
        }
    }
}

/// A button on the fallback screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FallbackAction {
    Retry { label: String },
    Navigate { label: String, url: String },
}

/// Developer-only panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TechnicalDetails {
    pub name: String,
    pub message: String,
    pub category: Category,
    pub severity: Severity,
    pub code: Option<String>,
    pub stack: Option<String>,
    pub component_stack: Option<String>,
}

/// Everything the fallback screen renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FallbackView {
    pub title: String,
    pub message: String,
    pub actions: Vec<FallbackAction>,
    /// `true` when a details toggle should be offered at all.
    pub details_available: bool,
    pub details: Option<TechnicalDetails>,
}

impl FallbackView {
    pub fn has_retry(&self) -> bool {
        self.actions
            .iter()
            .any(|a| matches!(a, FallbackAction::Retry { .. }))
    }

    pub fn action_labels(&self) -> Vec<&str> {
        self.actions
            .iter()
            .map(|a| match a {
                FallbackAction::Retry { label } | FallbackAction::Navigate { label, .. } => {
                    label.as_str()
                }
            })
            .collect()
    }
}

/// Full-screen fallback for a subtree that failed to render.
///
/// `Healthy -> Faulted` on the first captured failure, `Faulted -> Healthy`
/// on [`reset`](Self::reset), a successful [`retry`](Self::retry) or a
/// change of the tracked reset keys. A failure while already faulted
/// replaces the captured one. It neither logs nor classifies; route the
/// failure through the handler first if it should be recorded.
#[derive(Debug, Clone)]
pub struct FallbackBoundary {
    state: BoundaryState,
    environment: Environment,
    home_url: String,
    show_details: bool,
    reset_keys: Vec<String>,
}

impl FallbackBoundary {
    pub fn new(environment: Environment, navigation: &NavigationConfig) -> Self {
        Self {
            state: BoundaryState::Healthy,
            environment,
            home_url: navigation.home_url.clone(),
            show_details: false,
            reset_keys: Vec::new(),
        }
    }

    pub fn state(&self) -> &BoundaryState {
        &self.state
    }

    pub fn is_faulted(&self) -> bool {
        matches!(self.state, BoundaryState::Faulted(_))
    }

    pub fn fault(&self) -> Option<&CapturedFault> {
        match &self.state {
            BoundaryState::Faulted(fault) => Some(fault),
            BoundaryState::Healthy => None,
        }
    }

    pub fn capture(&mut self, error: &RaisedError, component_stack: Option<String>) {
        self.state = BoundaryState::Faulted(CapturedFault::from_raised(error, component_stack));
        self.show_details = false;
    }

    pub fn capture_record(&mut self, record: &ErrorRecord) {
        self.state = BoundaryState::Faulted(CapturedFault::from_record(record, None));
        self.show_details = false;
    }

    /// Run `render`; an `Err` or a panic faults the boundary.
    pub fn guard<T, F>(&mut self, component: &str, render: F) -> Option<T>
    where
        F: FnOnce() -> Result<T, RaisedError>,
    {
        match catch_unwind(AssertUnwindSafe(render)) {
            Ok(Ok(value)) => Some(value),
            Ok(Err(error)) => {
                self.capture(&error, Some(component.to_string()));
                None
            }
            Err(payload) => {
                let mut fault = CapturedFault::from_panic(panic_text(payload.as_ref()));
                fault.component_stack = Some(component.to_string());
                self.state = BoundaryState::Faulted(fault);
                self.show_details = false;
                None
            }
        }
    }

    pub fn reset(&mut self) {
        self.state = BoundaryState::Healthy;
        self.show_details = false;
    }

    /// Reset when any tracked key differs from the last observed set.
    /// Returns whether a reset happened.
    pub fn observe_reset_keys<I, K>(&mut self, keys: I) -> bool
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        let changed = keys != self.reset_keys;
        self.reset_keys = keys;
        if changed && self.is_faulted() {
            self.reset();
            return true;
        }
        false
    }

    /// User pressed "Try Again": reset and re-render. Ignored unless the
    /// captured fault is recoverable.
    pub async fn retry<T, F, Fut>(&mut self, render: F) -> Option<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, RaisedError>>,
    {
        if !self.fault().is_some_and(|f| f.recoverable) {
            return None;
        }
        self.reset();
        match AssertUnwindSafe(render()).catch_unwind().await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(error)) => {
                self.capture(&error, None);
                None
            }
            Err(payload) => {
                self.state =
                    BoundaryState::Faulted(CapturedFault::from_panic(panic_text(payload.as_ref())));
                None
            }
        }
    }

    /// Show or hide the technical panel. Production has no panel.
    pub fn toggle_details(&mut self) -> bool {
        if self.environment.is_development() && self.is_faulted() {
            self.show_details = !self.show_details;
        }
        self.show_details
    }

    /// The screen to render, or `None` while healthy.
    pub fn view(&self) -> Option<FallbackView> {
        let fault = self.fault()?;

        let mut actions = Vec::with_capacity(2);
        if fault.recoverable {
            actions.push(FallbackAction::Retry {
                label: "Try Again".to_string(),
            });
        }
        actions.push(FallbackAction::Navigate {
            label: "Go Home".to_string(),
            url: self.home_url.clone(),
        });

        let details_available = self.environment.is_development();
        let details = (details_available && self.show_details).then(|| TechnicalDetails {
            name: fault.name.clone(),
            message: fault.message.clone(),
            category: fault.category,
            severity: fault.severity,
            code: fault.code.clone(),
            stack: fault.stack.clone(),
            component_stack: fault.component_stack.clone(),
        });

        Some(FallbackView {
            title: "Something went wrong".to_string(),
            message: fault.user_message.clone(),
            actions,
            details_available,
            details,
        })
    }
}

fn panic_text(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string())
}
