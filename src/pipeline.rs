//! The single error service: one logger and one handler, built once from
//! configuration and handed to every consumer.

use crate::config::PipelineConfig;
use crate::error::PipelineResult;
use crate::handler::{install_panic_listener, ErrorHandler, PanicListenerGuard};
use crate::logger::ErrorLogger;
use crate::logging::{log_debug, log_info};
use crate::notify::{Navigator, Notifier, TracingNotifier};
use crate::presentation::FallbackBoundary;
use crate::scope::ErrorScope;
use crate::store::{ErrorStore, InMemoryErrorStore, RestErrorStore};
use std::sync::Arc;

/// Builder for [`ErrorPipeline`].
pub struct ErrorPipelineBuilder {
    config: PipelineConfig,
    store: Option<Arc<dyn ErrorStore>>,
    notifier: Option<Arc<dyn Notifier>>,
    navigator: Option<Arc<dyn Navigator>>,
    panic_listener: bool,
}

impl ErrorPipelineBuilder {
    /// Use `store` instead of the one implied by the configuration.
    pub fn store(mut self, store: Arc<dyn ErrorStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Route panics through the handler for the pipeline's lifetime.
    pub fn with_panic_listener(mut self) -> Self {
        self.panic_listener = true;
        self
    }

    /// Validate the configuration and start the logger's flush task.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Configuration`](crate::error::PipelineError::Configuration)
    /// if the configuration is invalid or the remote store cannot be set up.
    pub fn build(self) -> PipelineResult<ErrorPipeline> {
        self.config.validate()?;

        let store: Arc<dyn ErrorStore> = match (self.store, &self.config.store) {
            (Some(store), _) => store,
            (None, Some(rest)) => Arc::new(RestErrorStore::new(rest)?),
            (None, None) => Arc::new(InMemoryErrorStore::new()),
        };

        let logger = Arc::new(ErrorLogger::spawn(
            store,
            self.config.logger.clone(),
            self.config.environment,
        ));

        let notifier = self
            .notifier
            .unwrap_or_else(|| Arc::new(TracingNotifier));
        let navigator = self
            .navigator
            .unwrap_or_else(|| Arc::new(TracingNotifier));

        let handler = Arc::new(ErrorHandler::new(
            logger,
            notifier,
            navigator,
            &self.config,
        ));

        let panic_guard = self
            .panic_listener
            .then(|| install_panic_listener(&handler));

        log_info!(
            environment = ?self.config.environment,
            remote_store = self.config.store.is_some(),
            panic_listener = panic_guard.is_some(),
            "Error pipeline started"
        );

        Ok(ErrorPipeline {
            config: self.config,
            handler,
            panic_guard,
        })
    }
}

/// Process-wide error service.
pub struct ErrorPipeline {
    config: PipelineConfig,
    handler: Arc<ErrorHandler>,
    panic_guard: Option<PanicListenerGuard>,
}

impl ErrorPipeline {
    pub fn builder(config: PipelineConfig) -> ErrorPipelineBuilder {
        ErrorPipelineBuilder {
            config,
            store: None,
            notifier: None,
            navigator: None,
            panic_listener: false,
        }
    }

    /// Build from environment variables with a headless notifier.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Configuration`](crate::error::PipelineError::Configuration)
    /// if the environment is malformed.
    pub fn from_env() -> PipelineResult<Self> {
        let config = PipelineConfig::from_env()?;
        Self::builder(config).build()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn handler(&self) -> &Arc<ErrorHandler> {
        &self.handler
    }

    pub fn logger(&self) -> &Arc<ErrorLogger> {
        self.handler.logger()
    }

    pub fn scope(&self, component: impl Into<String>) -> ErrorScope {
        ErrorScope::new(Arc::clone(&self.handler), component)
    }

    pub fn boundary(&self) -> FallbackBoundary {
        FallbackBoundary::new(self.config.environment, &self.config.navigation)
    }

    /// Uninstall the panic listener, stop the flush task and write what is
    /// still queued. Returns the number of rows written.
    ///
    /// # Errors
    ///
    /// Returns the store error if the final flush fails.
    pub async fn shutdown(mut self) -> PipelineResult<usize> {
        drop(self.panic_guard.take());
        let written = self.logger().shutdown().await?;
        log_debug!(rows = written, "Error pipeline shut down");
        Ok(written)
    }
}

impl std::fmt::Debug for ErrorPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorPipeline")
            .field("environment", &self.config.environment)
            .field("handler", &self.handler)
            .field("panic_listener", &self.panic_guard.is_some())
            .finish()
    }
}
