//! Test helper utilities for csr-errors integration tests
//!
//! Shared fixtures for building records, rows and PostgREST responses.
//!
//! IMPORTANT: These helpers are test-only and should NEVER be used in production code.

// Allow dead code in test utilities - functions are used across different test files
#![allow(dead_code)]

use chrono::{DateTime, Utc};
use csr_errors::config::{Environment, LoggerConfig, PipelineConfig, RestStoreConfig};
use csr_errors::store::{ErrorLog, NewErrorLog};
use csr_errors::taxonomy::{Category, ErrorRecord, Severity};
use csr_errors::RetryPolicy;
use std::time::Duration;
use wiremock::ResponseTemplate;

pub const TEST_API_KEY: &str = "test-service-key";

/// Store configuration pointing at a mock server
pub fn create_store_config(base_url: &str) -> RestStoreConfig {
    RestStoreConfig::new(base_url, TEST_API_KEY)
}

/// Pipeline configuration with fast retries and an in-memory store
pub fn create_pipeline_config() -> PipelineConfig {
    PipelineConfig {
        environment: Environment::Production,
        logger: LoggerConfig {
            batch_size: 5,
            flush_interval: Duration::from_millis(200),
            ..LoggerConfig::default()
        },
        retry: RetryPolicy::new(3, Duration::from_millis(10)),
        ..PipelineConfig::default()
    }
}

pub fn create_row(category: Category, severity: Severity, message: &str) -> NewErrorLog {
    let record = ErrorRecord::builder(category, message)
        .severity(severity)
        .build();
    NewErrorLog::from_record(&record, None, "csr-errors-integration")
}

pub fn create_stored_row(
    category: Category,
    severity: Severity,
    message: &str,
    created_at: DateTime<Utc>,
) -> ErrorLog {
    ErrorLog {
        id: uuid::Uuid::new_v4(),
        created_at,
        entry: create_row(category, severity, message),
    }
}

/// PostgREST success body for a select
pub fn rows_response(rows: &[ErrorLog]) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(rows)
}

/// PostgREST error body
pub fn postgrest_error(status: u16, code: &str, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(serde_json::json!({
        "code": code,
        "message": message,
        "details": null,
        "hint": null,
    }))
}
