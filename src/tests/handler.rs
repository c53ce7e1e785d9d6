// Unit Tests for the Error Handler
//
// UNIT UNDER TEST: ErrorHandler
//
// BUSINESS RESPONSIBILITY:
//   - Single entry point that classifies, logs and notifies for any failure
//   - Chooses the toast channel from severity alone
//   - Always alerts on critical failures, even when asked to stay quiet
//   - Sends the user to sign in again when the session has expired
//   - Retries transient failures and handles the final failure exactly once
//
// TEST COVERAGE:
//   - Permission failure on an admin PATCH end to end
//   - Severity to notifier channel mapping with mocked collaborators
//   - Session-expiry redirect timing
//   - Signed-in user enrichment
//   - handle_with_retry invocation counts, timing and logging

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::handler::{ApiFailure, ErrorHandler, RetryPolicy};
use crate::logger::ErrorLogger;
use crate::notify::{MockNavigator, MockNotifier, Notification, UiEvent};
use crate::store::InMemoryErrorStore;
use crate::taxonomy::{Category, ErrorContext, ErrorRecord, RaisedError, Severity};
use crate::tests::helpers::{create_test_config, create_test_record, HandlerFixture};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn handler_with_mocks(notifier: MockNotifier, navigator: MockNavigator) -> ErrorHandler {
    let config = PipelineConfig::default();
    let logger = Arc::new(ErrorLogger::new(
        Arc::new(InMemoryErrorStore::new()),
        config.logger.clone(),
        config.environment,
    ));
    ErrorHandler::new(logger, Arc::new(notifier), Arc::new(navigator), &config)
}

#[cfg(test)]
mod handle_tests {
    use super::*;

    #[tokio::test]
    async fn test_forbidden_admin_patch_end_to_end() {
        // Test verifies a 403 on an admin mutation becomes one permission row
        // and one warning toast with the permission copy

        // Arrange
        let mut fixture = HandlerFixture::new();
        let record = fixture.handler.classify_api_error(
            &ApiFailure::status(403),
            "/admin/vetting/x",
            "PATCH",
        );

        // Act
        let handled = fixture.handler.handle(&record.into(), true);
        let rows = fixture.flushed_rows().await;
        let events = fixture.drain_events();

        // Assert
        assert_eq!(handled.category(), Category::Permission);
        assert_eq!(handled.severity(), Severity::Medium);
        assert!(!handled.is_retryable());

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].entry.category, Category::Permission);
        let context = rows[0].entry.context.as_ref().expect("row context");
        assert_eq!(
            context.metadata_value("endpoint"),
            Some(&serde_json::json!("/admin/vetting/x"))
        );

        assert_eq!(
            events,
            vec![UiEvent::Toast(Notification::Warning {
                message: "You do not have permission to perform this action.".to_string(),
            })]
        );
    }

    #[test]
    fn test_low_severity_uses_info_channel() {
        // Arrange
        let mut notifier = MockNotifier::new();
        notifier.expect_info().times(1).return_const(());
        notifier.expect_warning().never();
        notifier.expect_error().never();
        let handler = handler_with_mocks(notifier, MockNavigator::new());

        // Act
        let record = handler.handle(
            &create_test_record(Category::NotFound, Severity::Low, "missing").into(),
            true,
        );

        // Assert
        assert_eq!(record.severity(), Severity::Low);
    }

    #[test]
    fn test_high_severity_uses_blocking_alert_with_duration() {
        // Arrange
        let mut notifier = MockNotifier::new();
        notifier
            .expect_error()
            .withf(|_, duration| *duration == Duration::from_secs(6))
            .times(1)
            .return_const(());
        let handler = handler_with_mocks(notifier, MockNavigator::new());

        // Act & Assert
        handler.handle(
            &create_test_record(Category::Api, Severity::High, "failed").into(),
            true,
        );
    }

    #[test]
    fn test_critical_is_notified_even_when_quiet() {
        // Test verifies critical failures cannot be silenced

        // Arrange
        let mut notifier = MockNotifier::new();
        notifier
            .expect_error()
            .withf(|message, duration| {
                message.contains("payment") && *duration == Duration::from_secs(10)
            })
            .times(1)
            .return_const(());
        let handler = handler_with_mocks(notifier, MockNavigator::new());

        // Act
        let record = handler.handle(&ErrorRecord::payment("card declined").into(), false);

        // Assert
        assert_eq!(record.severity(), Severity::Critical);
    }

    #[test]
    fn test_quiet_handling_of_medium_error_does_not_notify() {
        // Arrange
        let mut notifier = MockNotifier::new();
        notifier.expect_info().never();
        notifier.expect_warning().never();
        notifier.expect_error().never();
        let handler = handler_with_mocks(notifier, MockNavigator::new());

        // Act & Assert
        handler.handle(&ErrorRecord::api("quiet").into(), false);
        assert_eq!(handler.logger().pending(), 1, "quiet errors are still logged");
    }

    #[tokio::test]
    async fn test_unclassified_error_is_classified_before_logging() {
        // Arrange
        let mut fixture = HandlerFixture::new();

        // Act
        let record = fixture
            .handler
            .handle(&RaisedError::from(anyhow::anyhow!("undefined is not a function")), true);
        let rows = fixture.flushed_rows().await;

        // Assert
        assert_eq!(record.category(), Category::Unknown);
        assert_eq!(rows[0].entry.message, "undefined is not a function");
        assert_eq!(
            fixture.drain_events(),
            vec![UiEvent::Toast(Notification::Warning {
                message: Category::Unknown.default_user_message().to_string(),
            })]
        );
    }

    #[tokio::test]
    async fn test_report_accepts_pipeline_errors() {
        // Arrange
        let fixture = HandlerFixture::new();

        // Act
        let record = fixture
            .handler
            .report(PipelineError::configuration("missing key"));

        // Assert
        assert_eq!(record.category(), Category::Unknown);
        assert_eq!(record.severity(), Severity::High);
        assert_eq!(record.code(), Some("PIPELINE_CONFIGURATION"));
    }
}

#[cfg(test)]
mod session_and_user_tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_expired_session_redirects_to_login_after_delay() {
        // Arrange
        let mut fixture = HandlerFixture::new();
        let record = fixture
            .handler
            .classify_api_error(&ApiFailure::status(401), "/rest/v1/cases", "GET");

        // Act
        fixture.handler.handle(&record.into(), true);
        tokio::time::sleep(Duration::from_millis(1_000)).await;
        let before_delay = fixture.drain_events();
        tokio::time::sleep(Duration::from_millis(600)).await;
        let after_delay = fixture.drain_events();

        // Assert
        assert_eq!(before_delay.len(), 1, "only the alert before the delay");
        assert!(matches!(
            before_delay[0],
            UiEvent::Toast(Notification::Error { .. })
        ));
        assert_eq!(after_delay, vec![UiEvent::Navigate("/login".to_string())]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_auth_codes_do_not_redirect() {
        // Arrange
        let mut fixture = HandlerFixture::new();
        let record = ErrorRecord::builder(Category::Auth, "mfa required")
            .code("MFA_REQUIRED")
            .build();

        // Act
        fixture.handler.handle(&record.into(), true);
        tokio::time::sleep(Duration::from_secs(5)).await;

        // Assert
        assert!(fixture
            .drain_events()
            .iter()
            .all(|e| !matches!(e, UiEvent::Navigate(_))));
    }

    #[tokio::test]
    async fn test_signed_in_user_is_attached_to_logged_rows() {
        // Arrange
        let fixture = HandlerFixture::new();
        fixture
            .handler
            .set_user("user-42", Some("ngo_admin".to_string()));

        // Act
        fixture.handler.handle(&ErrorRecord::api("x").into(), false);
        fixture.handler.clear_user();
        fixture.handler.handle(&ErrorRecord::api("y").into(), false);
        let rows = fixture.flushed_rows().await;

        // Assert
        let first = rows[0].entry.context.as_ref().expect("user context");
        assert_eq!(first.user_id.as_deref(), Some("user-42"));
        assert_eq!(first.user_role.as_deref(), Some("ngo_admin"));
        assert!(rows[1].entry.context.is_none());
    }

    #[tokio::test]
    async fn test_handle_in_adds_component_context() {
        // Arrange
        let fixture = HandlerFixture::new();
        let context = ErrorContext::new()
            .with_component("CertificateGenerator")
            .with_action("download");

        // Act
        let record = fixture
            .handler
            .handle_in(&ErrorRecord::file("render failed").into(), &context, false);

        // Assert
        let ctx = record.context().expect("context");
        assert_eq!(ctx.component.as_deref(), Some("CertificateGenerator"));
        assert_eq!(ctx.action.as_deref(), Some("download"));
    }
}

#[cfg(test)]
mod handle_with_retry_tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_failure_is_returned_unhandled() {
        // Test verifies a permission failure is rethrown at once, leaving
        // logging and the toast to the caller

        // Arrange
        let mut fixture = HandlerFixture::new();
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        // Act
        let result = fixture
            .handler
            .handle_with_retry(|| {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(ErrorRecord::permission("403")) }
            })
            .await;
        let rows = fixture.flushed_rows().await;

        // Assert
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let error = result.expect_err("should fail");
        assert_eq!(error.category(), Category::Permission);
        assert!(rows.is_empty(), "non-retryable failure must not be logged");
        assert!(fixture.drain_events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_caller_handling_rethrown_error_produces_one_row() {
        // Arrange
        let mut fixture = HandlerFixture::new();

        // Act
        let error = fixture
            .handler
            .handle_with_retry(|| async { Err::<(), _>(ErrorRecord::not_found("missing")) })
            .await
            .expect_err("should fail");
        fixture.handler.handle(&error, true);
        let rows = fixture.flushed_rows().await;

        // Assert
        assert_eq!(rows.len(), 1);
        assert_eq!(fixture.drain_events().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flaky_operation_recovers_without_logging() {
        // Test verifies fail, fail, succeed with base delay 100ms

        // Arrange
        let fixture = HandlerFixture::new();
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let started = tokio::time::Instant::now();

        // Act
        let result = fixture
            .handler
            .handle_with_retry(|| {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n < 3 {
                        Err(ErrorRecord::network("timeout"))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;

        // Assert
        assert_eq!(result.ok(), Some(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(started.elapsed() >= Duration::from_millis(300));
        assert_eq!(fixture.handler.logger().pending(), 0, "success logs nothing");
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_handle_the_last_error_once() {
        // Arrange
        let mut fixture = HandlerFixture::new();
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        // Act
        let result = fixture
            .handler
            .handle_with_retry_using(&RetryPolicy::new(2, Duration::from_millis(10)), None, || {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                async move { Err::<(), _>(ErrorRecord::network(format!("attempt {n}"))) }
            })
            .await;
        let rows = fixture.flushed_rows().await;

        // Assert
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let error = result.expect_err("should fail");
        assert_eq!(error.record().map(ErrorRecord::message), Some("attempt 3"));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].entry.message, "attempt 3");
        assert_eq!(fixture.drain_events().len(), 1);
    }

    #[test]
    fn test_default_retry_policy_comes_from_config() {
        // Arrange
        let fixture = HandlerFixture::with_config(create_test_config());

        // Act & Assert
        assert_eq!(
            fixture.handler.retry_policy(),
            &RetryPolicy::new(3, Duration::from_millis(100))
        );
    }
}
