//! # csr-errors
//!
//! Error classification, logging and user-facing reporting for the CSR
//! platform's client surfaces.
//!
//! ## Key Features
//!
//! - **Taxonomy**: every failure becomes an [`ErrorRecord`] with a category,
//!   a severity and a sanitized user message
//! - **Batched logging**: records are queued and flushed to an append-only
//!   store in the background
//! - **Handler**: one place that classifies, logs, notifies and retries
//! - **Presentation**: banner, fallback-screen and retry-panel view models
//!
//! ## Example
//!
//! ```rust,no_run
//! use csr_errors::{ErrorPipeline, ErrorRecord, PipelineConfig};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let pipeline = ErrorPipeline::builder(PipelineConfig::default()).build()?;
//!
//! let scope = pipeline.scope("VettingQueue");
//! let approved = scope
//!     .run("approve", async {
//!         Err::<(), _>(ErrorRecord::permission("403 on PATCH /admin/vetting/42"))
//!     })
//!     .await;
//! assert!(approved.is_none());
//!
//! pipeline.shutdown().await?;
//! # Ok(())
//! # }
//! ```

#![allow(clippy::missing_errors_doc)]

// Logging utilities (re-exports tracing with log_* naming) - internal only
pub(crate) mod logging;

pub mod config;
pub mod error;
pub mod handler;
pub mod logger;
pub mod notify;
pub mod pipeline;
pub mod presentation;
pub mod scope;
pub mod store;
pub mod taxonomy;

#[cfg(test)]
pub mod tests;

pub use config::{
    Environment, LoggerConfig, NavigationConfig, NotificationConfig, PipelineConfig,
    RestStoreConfig,
};
pub use error::{PipelineError, PipelineResult};
pub use handler::{
    install_panic_listener, spawn_guarded, ApiFailure, ErrorHandler, FileFailure, FileMeta,
    PanicListenerGuard, RetryPolicy,
};
pub use logger::{ErrorLogger, ErrorStats};
pub use notify::{ChannelSink, Navigator, Notification, Notifier, TracingNotifier, UiEvent};
pub use pipeline::{ErrorPipeline, ErrorPipelineBuilder};
pub use presentation::{AlertBanner, FallbackBoundary, FallbackView, RetryPanel};
pub use scope::ErrorScope;
pub use store::{ErrorLog, ErrorStore, InMemoryErrorStore, NewErrorLog, RestErrorStore};
pub use taxonomy::{
    Category, ErrorContext, ErrorOptions, ErrorRecord, ErrorRecordBuilder, RaisedError, Severity,
};
