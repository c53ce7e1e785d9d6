// Unit Tests for Presentation Adapters
//
// UNIT UNDER TEST: AlertBanner, FallbackBoundary, RetryPanel
//
// BUSINESS RESPONSIBILITY:
//   - Renders only user-safe text, styled purely by severity
//   - Offers retry on a failed screen only when recovery is possible
//   - Always offers a way back to a known-good page
//   - Shows technical details to developers only
//   - Disables the retry trigger while an attempt is running
//
// TEST COVERAGE:
//   - Banner icon/tone table and dismissal
//   - Fallback state machine transitions and view contents
//   - Development-only technical panel
//   - Retry panel attempt counting, labels and busy state
//   - Retry trigger re-enabled after an abandoned attempt

use crate::config::{Environment, NavigationConfig};
use crate::presentation::{
    AlertBanner, BannerIcon, BannerTone, BoundaryState, FallbackAction, FallbackBoundary,
    RetryPanel, RetryPanelOutcome,
};
use crate::taxonomy::{Category, ErrorRecord, RaisedError, Severity};
use serial_test::serial;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn boundary(environment: Environment) -> FallbackBoundary {
    FallbackBoundary::new(environment, &NavigationConfig::default())
}

#[cfg(test)]
mod alert_banner_tests {
    use super::*;

    #[test]
    fn test_icon_and_tone_follow_severity_only() {
        // Arrange
        let cases = [
            (Severity::Low, BannerIcon::Info, BannerTone::Blue),
            (Severity::Medium, BannerIcon::AlertTriangle, BannerTone::Yellow),
            (Severity::High, BannerIcon::AlertCircle, BannerTone::Orange),
            (Severity::Critical, BannerIcon::XOctagon, BannerTone::Red),
        ];

        for (severity, icon, tone) in cases {
            // Act
            let banner = AlertBanner::new("msg", severity);

            // Assert
            assert_eq!(banner.icon, icon);
            assert_eq!(banner.tone, tone);
        }
    }

    #[test]
    fn test_banner_shows_user_message_not_technical_message() {
        // Arrange
        let record = ErrorRecord::builder(Category::Database, "relation \"cases\" does not exist")
            .build();

        // Act
        let banner = AlertBanner::from_record(&record);

        // Assert
        assert_eq!(banner.message, Category::Database.default_user_message());
        assert_eq!(banner.tone, BannerTone::Red);
        assert!(!banner
            .render_text()
            .expect("visible")
            .contains("relation"));
    }

    #[test]
    fn test_unclassified_error_renders_generic_message() {
        // Arrange
        let raised = RaisedError::from(anyhow::anyhow!("TypeError: x is undefined"));

        // Act
        let banner = AlertBanner::from_raised(&raised);

        // Assert
        assert_eq!(banner.message, Category::Unknown.default_user_message());
        assert_eq!(banner.severity, Severity::Medium);
    }

    #[test]
    fn test_dismiss_hides_banner() {
        // Arrange
        let mut banner = AlertBanner::new("Saved with warnings", Severity::Low);
        let mut pinned = AlertBanner::new("Read only", Severity::Medium).non_dismissible();

        // Act
        banner.dismiss();
        pinned.dismiss();

        // Assert
        assert!(!banner.is_visible());
        assert_eq!(banner.render_text(), None);
        assert!(pinned.is_visible());
        assert_eq!(pinned.render_text().as_deref(), Some("[alert-triangle] Read only"));
    }
}

#[cfg(test)]
mod fallback_boundary_tests {
    use super::*;

    #[test]
    fn test_database_error_offers_home_but_no_retry() {
        // Test verifies a non-recoverable failure never shows "Try Again"

        // Arrange
        let mut boundary = boundary(Environment::Production);
        let record = ErrorRecord::database("connection pool exhausted");

        // Act
        boundary.capture(&record.into(), None);
        let view = boundary.view().expect("faulted boundary renders a view");

        // Assert
        assert!(!view.has_retry());
        assert_eq!(view.action_labels(), ["Go Home"]);
        assert!(view.actions.contains(&FallbackAction::Navigate {
            label: "Go Home".to_string(),
            url: "/".to_string(),
        }));
        assert_eq!(view.message, Category::Database.default_user_message());
    }

    #[test]
    fn test_recoverable_error_offers_retry_and_home() {
        // Arrange
        let mut boundary = boundary(Environment::Production);

        // Act
        boundary.capture(&ErrorRecord::api("bad gateway").into(), None);
        let view = boundary.view().expect("view");

        // Assert
        assert_eq!(view.action_labels(), ["Try Again", "Go Home"]);
    }

    #[test]
    fn test_state_transitions() {
        // Test verifies Healthy -> Faulted -> (replace) -> Healthy

        // Arrange
        let mut boundary = boundary(Environment::Production);
        assert_eq!(boundary.state(), &BoundaryState::Healthy);
        assert!(boundary.view().is_none());

        // Act
        boundary.capture(&ErrorRecord::api("first").into(), None);
        boundary.capture(&ErrorRecord::network("second").into(), None);
        let replaced = boundary.fault().map(|f| f.message.clone());
        boundary.reset();

        // Assert
        assert_eq!(replaced.as_deref(), Some("second"));
        assert!(!boundary.is_faulted());
    }

    #[test]
    fn test_reset_keys_change_resets_fault() {
        // Arrange
        let mut boundary = boundary(Environment::Production);
        boundary.observe_reset_keys(["/cases/1"]);
        boundary.capture(&ErrorRecord::api("x").into(), None);

        // Act
        let unchanged = boundary.observe_reset_keys(["/cases/1"]);
        let changed = boundary.observe_reset_keys(["/cases/2"]);

        // Assert
        assert!(!unchanged);
        assert!(changed);
        assert!(!boundary.is_faulted());
    }

    #[test]
    fn test_technical_details_only_in_development() {
        // Arrange
        let mut production = boundary(Environment::Production);
        let mut development = boundary(Environment::Development);
        let record = ErrorRecord::builder(Category::Api, "GET /rest/v1/cases 502")
            .code("SERVER_ERROR")
            .stack("at fetchCases (api.ts:12)")
            .build();
        production.capture_record(&record);
        development.capture_record(&record);

        // Act
        let production_toggled = production.toggle_details();
        let development_toggled = development.toggle_details();

        // Assert
        assert!(!production_toggled);
        let production_view = production.view().expect("view");
        assert!(!production_view.details_available);
        assert!(production_view.details.is_none());

        assert!(development_toggled);
        let details = development
            .view()
            .and_then(|v| v.details)
            .expect("details shown in development");
        assert_eq!(details.message, "GET /rest/v1/cases 502");
        assert_eq!(details.code.as_deref(), Some("SERVER_ERROR"));
        assert!(details.stack.is_some());
    }

    #[test]
    fn test_guard_captures_render_errors() {
        // Arrange
        let mut boundary = boundary(Environment::Development);

        // Act
        let rendered = boundary.guard("CaseTimeline", || {
            Err::<(), _>(RaisedError::from(ErrorRecord::not_found("case 9")))
        });

        // Assert
        assert!(rendered.is_none());
        let fault = boundary.fault().expect("fault captured");
        assert_eq!(fault.category, Category::NotFound);
        assert_eq!(fault.component_stack.as_deref(), Some("CaseTimeline"));
    }

    #[test]
    #[serial]
    fn test_guard_captures_render_panics() {
        // Arrange
        let mut boundary = boundary(Environment::Production);

        // Act
        let rendered: Option<()> = boundary.guard("CertificatePreview", || {
            panic!("canvas unavailable")
        });

        // Assert
        assert!(rendered.is_none());
        let view = boundary.view().expect("view");
        assert_eq!(view.message, Category::Unknown.default_user_message());
        assert!(view.has_retry());
    }

    #[tokio::test]
    async fn test_retry_recovers_recoverable_fault() {
        // Arrange
        let mut boundary = boundary(Environment::Production);
        boundary.capture(&ErrorRecord::network("offline").into(), None);

        // Act
        let rendered = boundary.retry(|| async { Ok::<_, RaisedError>("page") }).await;

        // Assert
        assert_eq!(rendered, Some("page"));
        assert_eq!(boundary.state(), &BoundaryState::Healthy);
    }

    #[tokio::test]
    async fn test_retry_is_ignored_for_unrecoverable_fault() {
        // Arrange
        let mut boundary = boundary(Environment::Production);
        boundary.capture(&ErrorRecord::payment("declined").into(), None);

        // Act
        let rendered = boundary.retry(|| async { Ok::<_, RaisedError>(()) }).await;

        // Assert
        assert!(rendered.is_none());
        assert!(boundary.is_faulted());
    }
}

#[cfg(test)]
mod retry_panel_tests {
    use super::*;

    fn flaky_panel(failures: u32) -> (RetryPanel, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let panel = RetryPanel::new(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                if n <= failures {
                    Err(RaisedError::from(ErrorRecord::network("still offline")))
                } else {
                    Ok(())
                }
            }
        });
        (panel, calls)
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_attempt_reenables_trigger() {
        // Arrange
        let panel = RetryPanel::new(|| async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok::<(), RaisedError>(())
        });

        // Act
        let timed_out = tokio::time::timeout(Duration::from_millis(20), panel.retry()).await;

        // Assert
        assert!(timed_out.is_err());
        assert!(!panel.is_disabled());
        assert_eq!(panel.button_label(), "Try again");
        assert_eq!(panel.state().attempts, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_attempt_reenables_with_attempt_indicator() {
        // Arrange
        let (panel, _) = flaky_panel(1);
        assert_eq!(panel.button_label(), "Try again");

        // Act
        let outcome = panel.retry().await;

        // Assert
        assert!(matches!(outcome, RetryPanelOutcome::Failed { attempts: 1, .. }));
        assert!(!panel.is_disabled());
        assert_eq!(panel.button_label(), "Try again (attempt 2)");
        assert!(panel
            .state()
            .last_error
            .is_some_and(|m| m.starts_with("Network connection issue")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_after_failure() {
        // Arrange
        let (panel, calls) = flaky_panel(1);

        // Act
        panel.retry().await;
        let outcome = panel.retry().await;

        // Assert
        assert_eq!(outcome, RetryPanelOutcome::Recovered);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(panel.state().recovered);
        assert_eq!(panel.state().last_error, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_is_disabled_while_in_flight() {
        // Arrange
        let (panel, calls) = flaky_panel(0);
        let mut updates = panel.subscribe();

        // Act
        let (first, observed, concurrent) = tokio::join!(
            panel.retry(),
            async {
                updates.changed().await.expect("state change");
                let in_flight = updates.borrow().in_flight;
                (panel.is_disabled(), panel.button_label(), in_flight)
            },
            async {
                tokio::task::yield_now().await;
                panel.retry().await
            },
        );

        // Assert
        assert_eq!(first, RetryPanelOutcome::Recovered);
        assert_eq!(observed, (true, "Retrying...".to_string(), true));
        assert_eq!(concurrent, RetryPanelOutcome::Busy);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
