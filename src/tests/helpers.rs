//! Test helper utilities for csr-errors unit tests
//!
//! Shared fixtures for building handlers, loggers and records without a
//! background flush task, so tests decide exactly when rows are written.
//!
//! IMPORTANT: These helpers are test-only and should NEVER be used in production code.

#![allow(dead_code)]

use crate::config::{Environment, LoggerConfig, PipelineConfig};
use crate::handler::{ErrorHandler, RetryPolicy};
use crate::logger::ErrorLogger;
use crate::notify::{ChannelSink, UiEvent};
use crate::store::{InMemoryErrorStore, NewErrorLog};
use crate::taxonomy::{Category, ErrorRecord, Severity};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

/// Configuration with a short retry delay and small batches.
pub fn create_test_config() -> PipelineConfig {
    PipelineConfig {
        environment: Environment::Development,
        logger: LoggerConfig {
            batch_size: 5,
            queue_capacity: 50,
            ..LoggerConfig::default()
        },
        retry: RetryPolicy::new(3, Duration::from_millis(100)),
        ..PipelineConfig::default()
    }
}

/// Handler wired to an in-memory store and a channel UI sink.
pub struct HandlerFixture {
    pub handler: Arc<ErrorHandler>,
    pub store: Arc<InMemoryErrorStore>,
    pub events: UnboundedReceiver<UiEvent>,
}

impl HandlerFixture {
    pub fn new() -> Self {
        Self::with_config(create_test_config())
    }

    pub fn with_config(config: PipelineConfig) -> Self {
        let store = Arc::new(InMemoryErrorStore::new());
        let logger = Arc::new(ErrorLogger::new(
            store.clone(),
            config.logger.clone(),
            config.environment,
        ));
        let (sink, events) = ChannelSink::new();
        let sink = Arc::new(sink);
        let handler = Arc::new(ErrorHandler::new(logger, sink.clone(), sink, &config));
        Self {
            handler,
            store,
            events,
        }
    }

    /// Every UI event emitted so far.
    pub fn drain_events(&mut self) -> Vec<UiEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }

    /// Flush the logger and return every stored row.
    pub async fn flushed_rows(&self) -> Vec<crate::store::ErrorLog> {
        self.handler
            .logger()
            .flush()
            .await
            .expect("in-memory flush should succeed");
        self.store.rows()
    }
}

/// Logger without a background task.
pub fn create_test_logger(
    store: Arc<InMemoryErrorStore>,
    batch_size: usize,
    queue_capacity: usize,
) -> ErrorLogger {
    ErrorLogger::new(
        store,
        LoggerConfig {
            batch_size,
            queue_capacity,
            ..LoggerConfig::default()
        },
        Environment::Production,
    )
}

pub fn create_test_record(category: Category, severity: Severity, message: &str) -> ErrorRecord {
    ErrorRecord::builder(category, message).severity(severity).build()
}

pub fn create_test_row(category: Category, severity: Severity, message: &str) -> NewErrorLog {
    NewErrorLog::from_record(
        &create_test_record(category, severity, message),
        None,
        "csr-errors-tests",
    )
}
