use crate::taxonomy::RaisedError;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use std::future::Future;
use tokio::sync::watch;

type RecoverFn = Box<dyn Fn() -> BoxFuture<'static, Result<(), RaisedError>> + Send + Sync>;

/// Observable state of a [`RetryPanel`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryPanelState {
    /// Completed attempts, successful or not.
    pub attempts: u32,
    pub in_flight: bool,
    /// User message of the last failed attempt.
    pub last_error: Option<String>,
    pub recovered: bool,
}

/// Result of pressing the retry button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryPanelOutcome {
    Recovered,
    Failed { attempts: u32, user_message: String },
    /// An attempt was already running; nothing was started.
    Busy,
}

/// Retry button around a caller-supplied recovery function.
///
/// The trigger is disabled while an attempt runs and re-enabled with an
/// updated attempt count when it fails. Failures are shown, not logged.
pub struct RetryPanel {
    recover: RecoverFn,
    state: watch::Sender<RetryPanelState>,
}

impl RetryPanel {
    pub fn new<F, Fut>(recover: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), RaisedError>> + Send + 'static,
    {
        let (state, _) = watch::channel(RetryPanelState::default());
        Self {
            recover: Box::new(move || recover().boxed()),
            state,
        }
    }

    /// Receive every state change, for re-rendering.
    pub fn subscribe(&self) -> watch::Receiver<RetryPanelState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> RetryPanelState {
        self.state.borrow().clone()
    }

    pub fn is_disabled(&self) -> bool {
        self.state.borrow().in_flight
    }

    pub fn button_label(&self) -> String {
        let state = self.state.borrow();
        if state.in_flight {
            "Retrying...".to_string()
        } else if state.attempts == 0 || state.recovered {
            "Try again".to_string()
        } else {
            format!("Try again (attempt {})", state.attempts + 1)
        }
    }

    pub async fn retry(&self) -> RetryPanelOutcome {
        let started = self.state.send_if_modified(|state| {
            if state.in_flight {
                return false;
            }
            state.in_flight = true;
            true
        });
        if !started {
            return RetryPanelOutcome::Busy;
        }

        let mut in_flight = InFlight {
            state: &self.state,
            armed: true,
        };
        let result = (self.recover)().await;
        in_flight.armed = false;

        let mut outcome = RetryPanelOutcome::Recovered;
        self.state.send_modify(|state| {
            state.in_flight = false;
            state.attempts += 1;
            match &result {
                Ok(()) => {
                    state.recovered = true;
                    state.last_error = None;
                }
                Err(error) => {
                    state.recovered = false;
                    state.last_error = Some(error.user_message().to_string());
                    outcome = RetryPanelOutcome::Failed {
                        attempts: state.attempts,
                        user_message: error.user_message().to_string(),
                    };
                }
            }
        });
        outcome
    }
}

/// Re-enables the trigger if the attempt is abandoned before it completes.
struct InFlight<'a> {
    state: &'a watch::Sender<RetryPanelState>,
    armed: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.state.send_modify(|state| state.in_flight = false);
        }
    }
}

impl std::fmt::Debug for RetryPanel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPanel")
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}
